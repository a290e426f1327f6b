pub mod config;
pub mod constants;
pub mod detected_face;
pub mod embedding;
pub mod roll_id;
