pub mod evaluator;
mod verdict;

pub use evaluator::{EvaluationError, EvaluationInput, SolutionEvaluator};
pub use verdict::Evaluation;
