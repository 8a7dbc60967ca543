use tracing::debug;

use llm_router_oracle::{Instruction, Oracle, OracleError};

use crate::Task;

/// Returned instead of a generated solution when the task is unsupported
pub const REFUSAL_MESSAGE: &str = "Sorry, your request doesn't fit our supported tasks (Explain, Translate, Summarize). Please rephrase your request.";

/// Append evaluator feedback from the previous rejected attempt to the request.
///
/// Empty feedback leaves the request untouched.
pub fn annotate_with_feedback(request: &str, feedback: Option<&str>) -> String {
    match feedback {
        Some(feedback) if !feedback.is_empty() => {
            format!("{}\n[Evaluator feedback: {}]", request, feedback)
        }
        _ => request.to_string(),
    }
}

/// Produces a task-specific solution through the oracle
pub struct SolutionGenerator<'a> {
    oracle: &'a dyn Oracle,
}

impl<'a> SolutionGenerator<'a> {
    pub fn new(oracle: &'a dyn Oracle) -> Self {
        Self { oracle }
    }

    /// Generate a solution, optionally conditioned on prior feedback.
    ///
    /// An unsupported task returns [`REFUSAL_MESSAGE`] without calling the
    /// oracle.
    pub async fn generate(
        &self,
        task: Task,
        request: &str,
        feedback: Option<&str>,
    ) -> Result<String, OracleError> {
        let Some(operation) = task.operation() else {
            debug!(task = %task, "Unsupported task, returning refusal");
            return Ok(REFUSAL_MESSAGE.to_string());
        };

        let input = annotate_with_feedback(request, feedback);
        debug!(
            operation = %operation,
            input_len = input.len(),
            with_feedback = feedback.is_some(),
            "Generating solution"
        );

        let instruction = Instruction::new(operation).with_input("user_input", input);
        let mut fields = self.oracle.predict(&instruction).await?;
        fields.take(operation.signature().primary_output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_router_oracle::{Operation, ScriptedOracle};

    #[test]
    fn test_annotate_with_feedback() {
        assert_eq!(annotate_with_feedback("Explain Rust", None), "Explain Rust");
        assert_eq!(annotate_with_feedback("Explain Rust", Some("")), "Explain Rust");
        assert_eq!(
            annotate_with_feedback("Explain Rust", Some("mention ownership")),
            "Explain Rust\n[Evaluator feedback: mention ownership]"
        );
    }

    #[tokio::test]
    async fn test_dispatches_to_task_operation() {
        let oracle = ScriptedOracle::new()
            .respond(Operation::Explain, &[("explanation", "Ownership is...")])
            .respond(Operation::Translate, &[("translation", "Hallo Welt")])
            .respond(Operation::Summarize, &[("summary", "Short.")]);
        let generator = SolutionGenerator::new(&oracle);

        assert_eq!(
            generator.generate(Task::Explain, "Explain ownership", None).await.unwrap(),
            "Ownership is..."
        );
        assert_eq!(
            generator.generate(Task::Translate, "Translate: Hello world", None).await.unwrap(),
            "Hallo Welt"
        );
        assert_eq!(
            generator.generate(Task::Summarize, "Summarize: ...", None).await.unwrap(),
            "Short."
        );
        assert_eq!(oracle.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_feedback_is_sent_in_user_input() {
        let oracle =
            ScriptedOracle::new().respond(Operation::Summarize, &[("summary", "Shorter.")]);
        SolutionGenerator::new(&oracle)
            .generate(Task::Summarize, "Summarize: text", Some("too long"))
            .await
            .unwrap();

        assert_eq!(
            oracle.calls()[0].input("user_input"),
            Some("Summarize: text\n[Evaluator feedback: too long]")
        );
    }

    #[tokio::test]
    async fn test_unsupported_task_refuses_without_oracle_call() {
        let oracle = ScriptedOracle::new();
        let solution = SolutionGenerator::new(&oracle)
            .generate(Task::Unsupported, "What's the weather like today?", None)
            .await
            .unwrap();

        assert_eq!(solution, REFUSAL_MESSAGE);
        assert!(oracle.calls().is_empty());
    }
}
