/// Default cosine-similarity cutoff for committing a face to a student.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.55;

/// Classroom faces below this detector confidence are not scored. Detector
/// confidence is opaque to the matcher, so filtering is off unless configured.
pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.0;

/// Output size of the ArcFace recognition model.
pub const DEFAULT_EMBEDDING_DIM: usize = 512;

pub const ARCFACE_MODEL_NAME: &str = "w600k_r50.onnx";
pub const ARCFACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Extensions of pre-extracted embedding files.
pub const EMBEDDING_EXTENSIONS: &[&str] = &["json"];
