//! # llm-router-logging
//!
//! Logging for the llm-router classify/generate/evaluate loop.
//!
//! ## Key Types
//!
//! - [`Logger`] - Structured event logging to stderr and an optional file
//! - [`LogEvent`] - Log event types
//! - [`LogFormat`] - Output formats (Pretty, JSON, Compact)
//! - [`RunWriter`] - Per-run JSONL record of attempts and outcome

mod events;
mod run_record;

pub use events::{LogEvent, LogFormat, Logger};
pub use run_record::{read_run, AttemptLine, RunLine, RunWriter};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}
