pub mod embedding_extractor;
pub mod reference_image_source;
