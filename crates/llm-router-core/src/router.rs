use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use llm_router_critic::{EvaluationInput, SolutionEvaluator};
use llm_router_logging::{AttemptLine, LogEvent, Logger, RunWriter};
use llm_router_oracle::Oracle;

use crate::classifier::TaskClassifier;
use crate::context::{AttemptRecord, RunContext};
use crate::error::RouterError;
use crate::generator::SolutionGenerator;
use crate::outcome::{ProcessOutput, RunResult};

/// Default bound on generate/evaluate attempts per run
pub const MAX_ATTEMPTS: usize = 3;

/// Orchestrates classify, then the generate/evaluate retry loop.
///
/// Holds no per-run state, so one router can serve concurrent runs.
pub struct Router<'a> {
    oracle: &'a dyn Oracle,
    logger: Arc<Logger>,
    max_attempts: usize,
}

impl<'a> Router<'a> {
    pub fn new(oracle: &'a dyn Oracle, logger: Arc<Logger>) -> Self {
        Self {
            oracle,
            logger,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Result<Self, RouterError> {
        if max_attempts == 0 {
            return Err(RouterError::ConfigError(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        self.max_attempts = max_attempts;
        Ok(self)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Route one request and return its final text, task label and attempt log.
    ///
    /// Blank input gets a prompt-for-input response without touching the
    /// oracle. Oracle failures are returned as errors, never as partial output.
    pub async fn process(&self, request: &str) -> Result<ProcessOutput, RouterError> {
        match self.run(request).await {
            Ok(result) => Ok(ProcessOutput::from(&result)),
            Err(RouterError::EmptyRequest) => Ok(ProcessOutput::prompt_for_input()),
            Err(e) => Err(e),
        }
    }

    /// Run the full pipeline for one request
    pub async fn run(&self, request: &str) -> Result<RunResult, RouterError> {
        self.run_recorded(Uuid::new_v4().to_string(), request, None).await
    }

    /// Like [`Router::run`], with a caller-chosen run id so the run record
    /// correlates with the log events. Each attempt is appended to `record`
    /// as soon as it is judged, so a run that later fails keeps its history.
    pub async fn run_recorded(
        &self,
        run_id: String,
        request: &str,
        record: Option<&RunWriter>,
    ) -> Result<RunResult, RouterError> {
        if request.trim().is_empty() {
            return Err(RouterError::EmptyRequest);
        }

        self.logger.log(&LogEvent::RunStarted {
            run_id: run_id.clone(),
            request: request.to_string(),
            model: self.oracle.model().to_string(),
            max_attempts: self.max_attempts,
        });

        let classification = TaskClassifier::new(self.oracle)
            .classify(request)
            .await
            .map_err(|e| self.abort(0, e.into()))?;

        self.logger.log(&LogEvent::TaskClassified {
            task: classification.task.to_string(),
            raw_label: classification.label.clone(),
        });

        let mut context = RunContext::new(
            run_id,
            request.to_string(),
            classification.task,
            self.max_attempts,
        );

        if !context.task.is_supported() {
            self.logger.log(&LogEvent::RequestRefused {
                task: context.task.to_string(),
            });
            let duration = context.total_duration();
            let result = RunResult::refused(context.run_id, context.task, duration);
            self.log_completed(&result);
            return Ok(result);
        }

        let generator = SolutionGenerator::new(self.oracle);
        let evaluator = SolutionEvaluator::new(self.oracle);

        while context.should_continue() {
            match self
                .run_attempt(&mut context, &generator, &evaluator, record)
                .await
            {
                Ok(Some(result)) => return Ok(result),
                Ok(None) => {}
                Err(e) => return Err(self.abort(context.next_attempt(), e)),
            }
        }

        self.logger.log(&LogEvent::MaxAttemptsReached {
            attempts: context.history.len(),
        });
        let duration = context.total_duration();
        let result = RunResult::exhausted(context.run_id, context.task, context.history, duration);
        self.log_completed(&result);
        Ok(result)
    }

    /// Run a single generate/evaluate attempt.
    /// Returns Some(result) if the attempt was accepted, None to retry.
    async fn run_attempt(
        &self,
        context: &mut RunContext,
        generator: &SolutionGenerator<'_>,
        evaluator: &SolutionEvaluator<'_>,
        record: Option<&RunWriter>,
    ) -> Result<Option<RunResult>, RouterError> {
        let attempt = context.next_attempt();
        let feedback_in = context.last_feedback.clone();

        self.logger.log(&LogEvent::GenerationStarted {
            attempt,
            input_preview: context.current_input().chars().take(100).collect(),
            with_feedback: feedback_in.is_some(),
        });

        debug!(attempt, task = %context.task, "Running generator");
        let start = Instant::now();
        let solution = generator
            .generate(context.task, &context.request, feedback_in.as_deref())
            .await?;

        self.logger.log(&LogEvent::GenerationCompleted {
            attempt,
            solution_chars: solution.chars().count(),
            duration_secs: start.elapsed().as_secs_f64(),
        });

        self.logger.log(&LogEvent::EvaluationStarted { attempt });
        let start = Instant::now();
        let evaluation = evaluator
            .evaluate(EvaluationInput {
                task: context.task.as_str(),
                request: &context.request,
                solution: &solution,
                attempt,
            })
            .await?;

        self.logger.log(&LogEvent::EvaluationCompleted {
            attempt,
            accepted: evaluation.is_accepted(),
            feedback: evaluation.feedback.clone(),
            duration_secs: start.elapsed().as_secs_f64(),
        });

        debug!(attempt, verdict = %evaluation.short_description(), "Evaluation verdict");

        let accepted = evaluation.is_accepted();
        let feedback = evaluation.feedback.clone();
        let attempt_record = AttemptRecord {
            attempt,
            feedback_in,
            solution: solution.clone(),
            evaluation,
            timestamp: Utc::now(),
        };
        if let Some(writer) = record {
            writer.write_attempt(AttemptLine {
                attempt,
                task: context.task.as_str(),
                feedback_in: attempt_record.feedback_in.as_deref(),
                solution: &attempt_record.solution,
                accepted,
                feedback: &attempt_record.evaluation.feedback,
                timestamp: attempt_record.timestamp,
            });
        }
        context.push_record(attempt_record);

        if accepted {
            let result = RunResult::accepted(
                context.run_id.clone(),
                context.task,
                solution,
                context.history.clone(),
                context.total_duration(),
            );
            self.log_completed(&result);
            return Ok(Some(result));
        }

        info!(attempt, "Solution rejected, retrying with feedback");
        context.set_feedback(feedback);
        Ok(None)
    }

    fn log_completed(&self, result: &RunResult) {
        self.logger.log(&LogEvent::RunCompleted {
            status: result.status.as_str().to_string(),
            attempts: result.iterations(),
            duration_secs: result.total_duration_secs,
        });
    }

    fn abort(&self, attempt: usize, error: RouterError) -> RouterError {
        warn!(attempt, error = %error, "Run aborted");
        self.logger.log(&LogEvent::ErrorEncountered {
            attempt,
            error: error.to_string(),
        });
        error
    }
}
