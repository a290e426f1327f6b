//! Embedding matching and attendance decisions for classroom photos.
//!
//! Faces detected in a classroom image are compared against cached reference
//! embeddings of each enrolled student and resolved into a present/absent
//! roster with similarity scores.

pub mod attendance;
pub mod enrollment;
pub mod extraction;
pub mod matching;
pub mod shared;
