use tracing::debug;

use llm_router_oracle::{Instruction, Operation, Oracle, OracleError};

use crate::Task;

/// Result of classifying one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub task: Task,
    /// The oracle's label after trimming and lowercasing
    pub label: String,
}

/// Maps free text onto a [`Task`] with a single oracle call
pub struct TaskClassifier<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> TaskClassifier<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Classify and keep the normalized oracle label alongside the task
    pub async fn classify(&self, request: &str) -> Result<Classification, OracleError> {
        let instruction = Instruction::new(Operation::Classify).with_input("user_input", request);
        let fields = self.oracle.predict(&instruction).await?;

        let label = fields.require("task")?.trim().to_lowercase();
        let task = Task::from_label(&label);
        debug!(label = %label, task = %task, "Classified request");

        Ok(Classification { task, label })
    }
}
