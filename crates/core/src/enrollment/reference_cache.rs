use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};

use log::{debug, warn};
use thiserror::Error;

use crate::extraction::domain::embedding_extractor::{EmbeddingExtractor, ExtractionError, RawFace};
use crate::extraction::domain::reference_image_source::{ReferenceImageSource, SourceError};
use crate::extraction::infrastructure::time_bounded_extractor::TimeBoundedExtractor;
use crate::shared::config::AttendanceConfig;
use crate::shared::embedding::Embedding;
use crate::shared::roll_id::RollId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("reference extraction failed for {roll_id}: {source}")]
    Extraction {
        roll_id: RollId,
        #[source]
        source: ExtractionError,
    },
    #[error("reference build for {0} was interrupted")]
    Interrupted(RollId),
}

/// Lifecycle of a cached roll ID. `Building` is the transient state while
/// one caller extracts embeddings and any others wait on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryStatus {
    Unbuilt,
    Building,
    Built,
    Stale,
}

enum Phase {
    Unbuilt,
    Building,
    Built(Arc<[Embedding]>),
    Stale,
}

struct SlotState {
    phase: Phase,
    /// Bumped every time a build finishes, successfully or not.
    generation: u64,
    last_failure: Option<BuildError>,
    invalidated_while_building: bool,
}

struct Slot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                phase: Phase::Unbuilt,
                generation: 0,
                last_failure: None,
                invalidated_while_building: false,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, result: &Result<Arc<[Embedding]>, BuildError>) {
        let mut state = self.lock();
        state.generation += 1;
        let stale = std::mem::take(&mut state.invalidated_while_building);
        state.phase = match result {
            Ok(_) if stale => Phase::Stale,
            Ok(embeddings) => Phase::Built(Arc::clone(embeddings)),
            Err(_) if stale => Phase::Stale,
            Err(_) => Phase::Unbuilt,
        };
        state.last_failure = result.as_ref().err().cloned();
        drop(state);
        self.ready.notify_all();
    }
}

/// Resets a slot if its builder unwinds, so waiters are released instead of
/// blocking on a build that will never finish.
struct BuildGuard<'a> {
    slot: &'a Slot,
    roll_id: &'a RollId,
    done: bool,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.slot
                .finish(&Err(BuildError::Interrupted(self.roll_id.clone())));
        }
    }
}

/// Long-lived store of normalized reference embeddings keyed by roll ID.
///
/// Builds are single-flight per roll ID: concurrent [`get_or_build`] calls
/// for the same key share one extraction, while different keys build in
/// parallel. Reads of built entries only take the entry's own lock for as
/// long as it takes to clone an `Arc`.
///
/// [`get_or_build`]: ReferenceEmbeddingCache::get_or_build
pub struct ReferenceEmbeddingCache {
    extractor: Arc<dyn EmbeddingExtractor>,
    embedding_dim: usize,
    slots: RwLock<HashMap<RollId, Arc<Slot>>>,
}

impl ReferenceEmbeddingCache {
    pub fn new(extractor: Arc<dyn EmbeddingExtractor>, embedding_dim: usize) -> Self {
        Self {
            extractor,
            embedding_dim,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Builds a cache honouring the configured dimensionality and, if set,
    /// bounding each reference extraction by `extraction_timeout_ms`.
    pub fn from_config(
        extractor: Arc<dyn EmbeddingExtractor>,
        config: &AttendanceConfig,
    ) -> Self {
        let extractor: Arc<dyn EmbeddingExtractor> = match config.extraction_timeout() {
            Some(timeout) => Arc::new(TimeBoundedExtractor::new(extractor, timeout)),
            None => extractor,
        };
        Self::new(extractor, config.embedding_dim)
    }

    /// Returns the reference embeddings for `roll_id`, extracting them from
    /// `source` if the entry is unbuilt or stale.
    ///
    /// A failed build leaves the entry unbuilt so the next call retries.
    /// Callers that were waiting on that build receive the same error.
    pub fn get_or_build(
        &self,
        roll_id: &RollId,
        source: &dyn ReferenceImageSource,
    ) -> Result<Arc<[Embedding]>, BuildError> {
        let slot = self.slot(roll_id);
        let mut state = slot.lock();

        loop {
            let in_flight = match &state.phase {
                Phase::Built(embeddings) => {
                    debug!("Reference cache hit for {roll_id}");
                    return Ok(Arc::clone(embeddings));
                }
                Phase::Building => true,
                Phase::Unbuilt | Phase::Stale => false,
            };

            if in_flight {
                let generation = state.generation;
                while state.generation == generation {
                    state = slot
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                if let Some(err) = &state.last_failure {
                    return Err(err.clone());
                }
                continue;
            }

            state.phase = Phase::Building;
            state.invalidated_while_building = false;
            drop(state);

            let mut guard = BuildGuard {
                slot: slot.as_ref(),
                roll_id,
                done: false,
            };
            let result = self.build(roll_id, source);
            guard.done = true;
            slot.finish(&result);

            if let Err(e) = &result {
                warn!("Reference build failed: {e}");
            }
            return result;
        }
    }

    /// Registers `roll_id` as unbuilt if it is not already known.
    pub fn register(&self, roll_id: &RollId) {
        self.slot(roll_id);
    }

    /// Marks the entry stale so the next [`get_or_build`] re-extracts.
    ///
    /// Returns `false` for unknown roll IDs. Invalidating during a build
    /// leaves the entry stale once that build completes.
    ///
    /// [`get_or_build`]: ReferenceEmbeddingCache::get_or_build
    pub fn invalidate(&self, roll_id: &RollId) -> bool {
        let Some(slot) = self.existing_slot(roll_id) else {
            return false;
        };
        let mut state = slot.lock();
        match state.phase {
            Phase::Built(_) => state.phase = Phase::Stale,
            Phase::Building => state.invalidated_while_building = true,
            Phase::Unbuilt | Phase::Stale => {}
        }
        debug!("Invalidated reference embeddings for {roll_id}");
        true
    }

    /// Drops the entry entirely. An in-flight build still completes for its
    /// callers but its result is not retained.
    pub fn remove(&self, roll_id: &RollId) -> bool {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(roll_id)
            .is_some()
    }

    pub fn status(&self, roll_id: &RollId) -> Option<EntryStatus> {
        let slot = self.existing_slot(roll_id)?;
        let state = slot.lock();
        Some(match state.phase {
            Phase::Unbuilt => EntryStatus::Unbuilt,
            Phase::Building => EntryStatus::Building,
            Phase::Built(_) => EntryStatus::Built,
            Phase::Stale => EntryStatus::Stale,
        })
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn existing_slot(&self, roll_id: &RollId) -> Option<Arc<Slot>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(roll_id)
            .cloned()
    }

    fn slot(&self, roll_id: &RollId) -> Arc<Slot> {
        if let Some(slot) = self.existing_slot(roll_id) {
            return slot;
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            slots
                .entry(roll_id.clone())
                .or_insert_with(|| Arc::new(Slot::new())),
        )
    }

    fn build(
        &self,
        roll_id: &RollId,
        source: &dyn ReferenceImageSource,
    ) -> Result<Arc<[Embedding]>, BuildError> {
        let images = source.fetch_reference_images(roll_id)?;
        if images.is_empty() {
            warn!("No reference images found for {roll_id}");
        }

        let mut embeddings = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            let faces = match self.extractor.extract_embeddings(image) {
                Ok(faces) => faces,
                Err(ExtractionError::NoFaceDetected) => Vec::new(),
                Err(e) => {
                    return Err(BuildError::Extraction {
                        roll_id: roll_id.clone(),
                        source: e,
                    })
                }
            };
            let Some(face) = largest_face(faces) else {
                warn!("No face detected in reference image {i} for {roll_id}");
                continue;
            };
            match Embedding::normalize_with_dim(&face.embedding, self.embedding_dim) {
                Ok(embedding) => embeddings.push(embedding),
                Err(e) => warn!("Skipping reference image {i} for {roll_id}: {e}"),
            }
        }

        debug!(
            "Built {} reference embeddings for {roll_id} from {} images",
            embeddings.len(),
            images.len()
        );
        Ok(Arc::from(embeddings))
    }
}

/// The face with the largest box wins; the first one on ties.
fn largest_face(faces: Vec<RawFace>) -> Option<RawFace> {
    faces
        .into_iter()
        .reduce(|best, face| if face.area() > best.area() { face } else { best })
}
