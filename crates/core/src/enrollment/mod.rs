pub mod enrolled_student;
pub mod reference_cache;
