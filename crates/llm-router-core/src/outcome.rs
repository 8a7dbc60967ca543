use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::generator::REFUSAL_MESSAGE;
use crate::{AttemptRecord, Task};

/// Attempt log for a request refused as unsupported
pub const REFUSED_LOG: &str = "Completed in 1 attempt";

/// Trailing attempt-log marker when no attempt was accepted
pub const MAX_ATTEMPTS_MARKER: &str = "⚠️ Max attempts reached";

/// Returned by `process` for blank input
pub const EMPTY_REQUEST_PROMPT: &str = "Please enter a request.";

/// How a run terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Unsupported task; refusal returned without generation or evaluation
    Refused,
    /// An attempt was accepted by the evaluator
    Accepted,
    /// Every attempt was rejected; the last solution is still returned
    Exhausted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Refused => "refused",
            RunStatus::Accepted => "accepted",
            RunStatus::Exhausted => "exhausted",
        }
    }
}

/// The final outcome of one routing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub status: RunStatus,
    pub task: Task,
    /// Final solution text: the refusal, the accepted solution, or the last
    /// rejected one
    pub solution: String,
    pub attempts: Vec<AttemptRecord>,
    pub total_duration_secs: f64,
}

impl RunResult {
    pub fn refused(run_id: String, task: Task, duration: Duration) -> Self {
        Self {
            run_id,
            status: RunStatus::Refused,
            task,
            solution: REFUSAL_MESSAGE.to_string(),
            attempts: Vec::new(),
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn accepted(
        run_id: String,
        task: Task,
        solution: String,
        attempts: Vec<AttemptRecord>,
        duration: Duration,
    ) -> Self {
        Self {
            run_id,
            status: RunStatus::Accepted,
            task,
            solution,
            attempts,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    /// Exhausted run; the solution is taken from the final attempt
    pub fn exhausted(
        run_id: String,
        task: Task,
        attempts: Vec<AttemptRecord>,
        duration: Duration,
    ) -> Self {
        let solution = attempts
            .last()
            .map(|record| record.solution.clone())
            .unwrap_or_default();
        Self {
            run_id,
            status: RunStatus::Exhausted,
            task,
            solution,
            attempts,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    /// Number of generate/evaluate pairs executed
    pub fn iterations(&self) -> usize {
        self.attempts.len()
    }

    pub fn task_label(&self) -> String {
        self.task.label()
    }

    /// Newline-joined, user-facing attempt log
    pub fn attempt_log(&self) -> String {
        match self.status {
            RunStatus::Refused => REFUSED_LOG.to_string(),
            RunStatus::Accepted => self.attempt_lines().join("\n"),
            RunStatus::Exhausted => {
                let mut lines = self.attempt_lines();
                lines.push(MAX_ATTEMPTS_MARKER.to_string());
                lines.join("\n")
            }
        }
    }

    fn attempt_lines(&self) -> Vec<String> {
        self.attempts.iter().map(AttemptRecord::log_line).collect()
    }

    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Refused | RunStatus::Accepted => 0,
            RunStatus::Exhausted => 1,
        }
    }
}

/// The three user-facing fields of a processed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    pub final_text: String,
    pub task_label: String,
    pub attempt_log: String,
}

impl ProcessOutput {
    /// Response for blank input; no task, no attempts
    pub fn prompt_for_input() -> Self {
        Self {
            final_text: EMPTY_REQUEST_PROMPT.to_string(),
            task_label: String::new(),
            attempt_log: String::new(),
        }
    }
}

impl From<&RunResult> for ProcessOutput {
    fn from(result: &RunResult) -> Self {
        Self {
            final_text: result.solution.clone(),
            task_label: result.task_label(),
            attempt_log: result.attempt_log(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use llm_router_critic::Evaluation;

    fn record(attempt: usize, solution: &str, evaluation: Evaluation) -> AttemptRecord {
        AttemptRecord {
            attempt,
            feedback_in: None,
            solution: solution.to_string(),
            evaluation,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_refused_output() {
        let result = RunResult::refused("r".into(), Task::Unsupported, Duration::ZERO);
        let output = ProcessOutput::from(&result);
        assert_eq!(output.final_text, REFUSAL_MESSAGE);
        assert_eq!(output.task_label, "Task: None");
        assert_eq!(output.attempt_log, "Completed in 1 attempt");
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn test_accepted_log_includes_prior_rejections() {
        let attempts = vec![
            record(1, "long", Evaluation::rejected("too long")),
            record(2, "short", Evaluation::accepted("good")),
        ];
        let result = RunResult::accepted(
            "r".into(),
            Task::Summarize,
            "short".into(),
            attempts,
            Duration::from_millis(10),
        );
        assert_eq!(
            result.attempt_log(),
            "❌ Attempt 1: Rejected - too long\n✅ Attempt 2: Accepted"
        );
        assert_eq!(result.status, RunStatus::Accepted);
    }

    #[test]
    fn test_exhausted_keeps_last_solution_and_marker() {
        let attempts = vec![
            record(1, "first", Evaluation::rejected("a")),
            record(2, "second", Evaluation::rejected("b")),
            record(3, "third", Evaluation::rejected("c")),
        ];
        let result = RunResult::exhausted("r".into(), Task::Explain, attempts, Duration::ZERO);
        assert_eq!(result.solution, "third");
        assert!(result.attempt_log().ends_with("\n⚠️ Max attempts reached"));
        assert_eq!(result.attempt_log().lines().count(), 4);
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn test_prompt_for_input() {
        let output = ProcessOutput::prompt_for_input();
        assert_eq!(output.final_text, "Please enter a request.");
        assert!(output.task_label.is_empty());
        assert!(output.attempt_log.is_empty());
    }

    #[test]
    fn test_result_serializes_status() {
        let result = RunResult::refused("r".into(), Task::Unsupported, Duration::ZERO);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "refused");
        assert_eq!(json["task"], "none");
    }
}
