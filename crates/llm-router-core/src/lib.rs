mod classifier;
mod context;
mod error;
mod generator;
mod outcome;
mod router;
mod task;

pub use classifier::{Classification, TaskClassifier};
pub use context::{AttemptRecord, RunContext};
pub use error::RouterError;
pub use generator::{annotate_with_feedback, SolutionGenerator, REFUSAL_MESSAGE};
pub use outcome::{
    ProcessOutput, RunResult, RunStatus, EMPTY_REQUEST_PROMPT, MAX_ATTEMPTS_MARKER, REFUSED_LOG,
};
pub use router::{Router, MAX_ATTEMPTS};
pub use task::Task;
