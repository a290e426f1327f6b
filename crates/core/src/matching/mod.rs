pub mod assignment_resolver;
pub mod greedy_resolver;
pub mod score_matrix;
pub mod similarity_matcher;
