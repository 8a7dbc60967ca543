use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use llm_router_critic::Evaluation;

use crate::generator::annotate_with_feedback;
use crate::Task;

/// Per-run state owned by the router while the attempt loop runs
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    /// Original request, never modified by feedback
    pub request: String,
    /// Classified once, fixed for the whole run
    pub task: Task,
    /// Completed attempts, in order
    pub history: Vec<AttemptRecord>,
    pub max_attempts: usize,
    /// Feedback from the most recent rejected attempt
    pub last_feedback: Option<String>,
    started_at: Instant,
}

/// Record of a single generate/evaluate attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt number
    pub attempt: usize,
    /// Feedback carried into this attempt's generation input
    pub feedback_in: Option<String>,
    pub solution: String,
    pub evaluation: Evaluation,
    pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn is_accepted(&self) -> bool {
        self.evaluation.is_accepted()
    }

    /// Line for the user-facing attempt log
    pub fn log_line(&self) -> String {
        if self.is_accepted() {
            format!("✅ Attempt {}: Accepted", self.attempt)
        } else {
            format!(
                "❌ Attempt {}: Rejected - {}",
                self.attempt, self.evaluation.feedback
            )
        }
    }
}

impl RunContext {
    pub fn new(run_id: String, request: String, task: Task, max_attempts: usize) -> Self {
        Self {
            run_id,
            request,
            task,
            history: Vec::new(),
            max_attempts,
            last_feedback: None,
            started_at: Instant::now(),
        }
    }

    /// Number the next attempt will get
    pub fn next_attempt(&self) -> usize {
        self.history.len() + 1
    }

    pub fn should_continue(&self) -> bool {
        self.history.len() < self.max_attempts
    }

    pub fn push_record(&mut self, record: AttemptRecord) {
        self.history.push(record);
    }

    /// Replace the carried feedback; only the latest rejection is kept
    pub fn set_feedback(&mut self, feedback: String) {
        self.last_feedback = Some(feedback);
    }

    /// The text the generator receives for the next attempt
    pub fn current_input(&self) -> String {
        annotate_with_feedback(&self.request, self.last_feedback.as_deref())
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }
}
