use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::extraction::domain::embedding_extractor::{EmbeddingExtractor, ExtractionError, RawFace};

/// Bounds every extraction call by a deadline.
///
/// The wrapped extractor runs on its own thread; if it does not answer in
/// time the caller gets [`ExtractionError::TimedOut`] and the worker is left
/// to finish in the background with its result discarded.
pub struct TimeBoundedExtractor {
    inner: Arc<dyn EmbeddingExtractor>,
    timeout: Duration,
}

impl TimeBoundedExtractor {
    pub fn new(inner: Arc<dyn EmbeddingExtractor>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl EmbeddingExtractor for TimeBoundedExtractor {
    fn extract_embeddings(&self, image: &[u8]) -> Result<Vec<RawFace>, ExtractionError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let inner = Arc::clone(&self.inner);
        let image = image.to_vec();

        thread::Builder::new()
            .name("embedding-extract".into())
            .spawn(move || {
                // Receiver may already be gone after a timeout.
                let _ = tx.send(inner.extract_embeddings(&image));
            })
            .map_err(|e| ExtractionError::Failed(format!("cannot spawn extraction thread: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(ExtractionError::TimedOut(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ExtractionError::Failed(
                "extraction thread exited without a result".into(),
            )),
        }
    }
}
