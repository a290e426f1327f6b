pub mod directory_reference_source;
pub mod json_embedding_extractor;
pub mod model_resolver;
pub mod onnx_arcface_extractor;
pub mod time_bounded_extractor;
