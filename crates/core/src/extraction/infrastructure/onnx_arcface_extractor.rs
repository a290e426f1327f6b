/// ArcFace recognition adapter backed by ONNX Runtime.
///
/// Each input image is treated as one pre-cropped face: it is decoded,
/// resized to the model's 112x112 input and embedded. Face detection is the
/// caller's concern. Embeddings are returned raw; normalization happens in
/// the core.
use std::path::Path;
use std::sync::Mutex;

use crate::extraction::domain::embedding_extractor::{EmbeddingExtractor, ExtractionError, RawFace};
use crate::shared::detected_face::BoundingBox;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxArcFaceExtractor {
    session: Mutex<ort::session::Session>,
}

impl OnnxArcFaceExtractor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .with_execution_providers(execution_providers())?
            .commit_from_file(model_path)?;
        log::debug!("Loaded ArcFace model from {}", model_path.display());
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    fn embed(&self, bytes: &[u8]) -> Result<RawFace, Box<dyn std::error::Error>> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err("image has no pixels".into());
        }

        let tensor = preprocess(rgb.as_raw(), width, height);
        let input = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input])?;
        let output = outputs[0].try_extract_array::<f32>()?;
        let embedding = output.iter().copied().collect();

        Ok(RawFace {
            embedding,
            confidence: 1.0,
            bbox: Some(BoundingBox::from([0.0, 0.0, width as f32, height as f32])),
        })
    }
}

impl EmbeddingExtractor for OnnxArcFaceExtractor {
    fn extract_embeddings(&self, image: &[u8]) -> Result<Vec<RawFace>, ExtractionError> {
        self.embed(image)
            .map(|face| vec![face])
            .map_err(|e| ExtractionError::Failed(e.to_string()))
    }
}

fn execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    return vec![ort::execution_providers::CoreMLExecutionProvider::default().build()];
    #[cfg(target_os = "windows")]
    return vec![ort::execution_providers::DirectMLExecutionProvider::default().build()];
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    Vec::new()
}

/// Nearest-neighbour resize to 112x112, scale to [-1, 1], NCHW layout.
fn preprocess(rgb: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;
    let scale_x = src_w as f64 / INPUT_SIZE as f64;
    let scale_y = src_h as f64 / INPUT_SIZE as f64;

    ndarray::Array4::from_shape_fn((1, 3, INPUT_SIZE, INPUT_SIZE), |(_, c, y, x)| {
        let src_y = (((y as f64 + 0.5) * scale_y) as usize).min(src_h - 1);
        let src_x = (((x as f64 + 0.5) * scale_x) as usize).min(src_w - 1);
        rgb.get((src_y * src_w + src_x) * 3 + c)
            .map_or(0.0, |&v| (v as f32 - NORM_MEAN) / NORM_STD)
    })
}
