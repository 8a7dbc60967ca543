use std::time::Instant;
use tracing::{debug, info};

use llm_router_oracle::{Instruction, Operation, Oracle, OracleError};

use crate::Evaluation;

/// Inputs required to judge one solution.
#[derive(Clone, Copy)]
pub struct EvaluationInput<'a> {
    /// Canonical task token (explain, translate, summarize)
    pub task: &'a str,
    /// The original request, without any feedback annotation
    pub request: &'a str,
    pub solution: &'a str,
    /// 1-based attempt number, for logging only
    pub attempt: usize,
}

/// Evaluator that asks the oracle whether a solution satisfies the request
pub struct SolutionEvaluator<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> SolutionEvaluator<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Judge a solution with exactly one oracle call
    pub async fn evaluate(&self, input: EvaluationInput<'_>) -> Result<Evaluation, EvaluationError> {
        let instruction = Instruction::new(Operation::Evaluate)
            .with_input("task", input.task)
            .with_input("user_input", input.request)
            .with_input("solution", input.solution);

        debug!(
            attempt = input.attempt,
            task = input.task,
            solution_len = input.solution.len(),
            "Running solution evaluation"
        );

        let start = Instant::now();
        let fields = self.oracle.predict(&instruction).await?;
        let evaluation = Evaluation::from_fields(&fields)?;

        info!(
            attempt = input.attempt,
            accepted = evaluation.is_relevant,
            duration_secs = start.elapsed().as_secs_f64(),
            "Evaluation completed"
        );

        Ok(evaluation)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Evaluator oracle error: {0}")]
    OracleError(#[from] OracleError),
}
