use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Structured log events for one routing run. Attempt numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    RunStarted {
        run_id: String,
        request: String,
        model: String,
        max_attempts: usize,
    },
    TaskClassified {
        task: String,
        raw_label: String,
    },
    /// Request fell outside the supported tasks; no generation happens
    RequestRefused {
        task: String,
    },
    GenerationStarted {
        attempt: usize,
        input_preview: String,
        with_feedback: bool,
    },
    GenerationCompleted {
        attempt: usize,
        solution_chars: usize,
        duration_secs: f64,
    },
    EvaluationStarted {
        attempt: usize,
    },
    EvaluationCompleted {
        attempt: usize,
        accepted: bool,
        feedback: String,
        duration_secs: f64,
    },
    RunCompleted {
        status: String,
        attempts: usize,
        duration_secs: f64,
    },
    MaxAttemptsReached {
        attempts: usize,
    },
    ErrorEncountered {
        attempt: usize,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

/// Logger for routing events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::RunStarted {
                request, model, ..
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}{}",
                    "│".bright_blue(),
                    "llm-router".bold().bright_white(),
                    " ".repeat(57) + &"│".bright_blue().to_string()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Request:".dimmed(),
                    Self::truncate_with_padding(request, 59, 67).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Model:".dimmed(),
                    Self::truncate_with_padding(model, 61, 69).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::TaskClassified { task, raw_label } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} {} {}",
                    "▶".bright_cyan(),
                    "ROUTER".bright_cyan().bold(),
                    task.bold(),
                    format!("(oracle said \"{}\")", raw_label).dimmed()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::RequestRefused { .. } => {
                let _ = writeln!(
                    stderr,
                    "    {} {}",
                    "⊘".bright_yellow(),
                    "Unsupported task, skipping generation".bright_yellow()
                );
            }
            LogEvent::GenerationStarted {
                attempt,
                with_feedback,
                ..
            } => {
                let attempt_text = format!("─ Attempt {} ", attempt);
                let padding = "─".repeat(67usize.saturating_sub(attempt_text.chars().count()));
                let _ = writeln!(
                    stderr,
                    "{}{}{}",
                    "┌".bright_blue(),
                    attempt_text.bright_blue().bold(),
                    padding.bright_blue()
                );
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "  {} {}{}",
                    "▶".bright_cyan(),
                    "GENERATOR".bright_cyan().bold(),
                    if *with_feedback {
                        " (with evaluator feedback)".dimmed().to_string()
                    } else {
                        String::new()
                    }
                );
            }
            LogEvent::GenerationCompleted {
                solution_chars,
                duration_secs,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} {} chars ({:.1}s)",
                    "✓".bright_green(),
                    solution_chars,
                    duration_secs
                );
                let _ = writeln!(stderr);
            }
            LogEvent::EvaluationStarted { .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_magenta(),
                    "EVALUATOR".bright_magenta().bold()
                );
            }
            LogEvent::EvaluationCompleted {
                accepted, feedback, ..
            } => {
                let verdict = if *accepted {
                    "✓ Accepted".bright_green().to_string()
                } else {
                    format!("→ Rejected: {}", feedback).bright_yellow().to_string()
                };
                let _ = writeln!(stderr, "    {}", verdict);
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "└─────────────────────────────────────────────────────────────────────┘"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::RunCompleted { .. } => {
                // Final result is printed by the caller
            }
            LogEvent::MaxAttemptsReached { attempts } => {
                let _ = writeln!(
                    stderr,
                    "{} Maximum attempts reached ({})",
                    "⚠".bright_yellow(),
                    attempts
                );
            }
            LogEvent::ErrorEncountered { attempt, error } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Error in attempt {}: {}",
                    "✗".bright_red(),
                    attempt,
                    error.bright_red()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "{}", Self::compact_line(event));
    }

    fn compact_line(event: &LogEvent) -> String {
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        match event {
            LogEvent::RunStarted { run_id, .. } => format!("[{}] run:start {}", timestamp, run_id),
            LogEvent::TaskClassified { task, .. } => format!("[{}] route:{}", timestamp, task),
            LogEvent::RequestRefused { task } => format!("[{}] route:refused:{}", timestamp, task),
            LogEvent::GenerationStarted { attempt, .. } => {
                format!("[{}] generate:start:{}", timestamp, attempt)
            }
            LogEvent::GenerationCompleted {
                attempt,
                solution_chars,
                duration_secs,
            } => format!(
                "[{}] generate:done:{} {}c {:.1}s",
                timestamp, attempt, solution_chars, duration_secs
            ),
            LogEvent::EvaluationStarted { attempt } => {
                format!("[{}] evaluate:start:{}", timestamp, attempt)
            }
            LogEvent::EvaluationCompleted {
                attempt, accepted, ..
            } => format!(
                "[{}] evaluate:done:{} {}",
                timestamp,
                attempt,
                if *accepted { "yes" } else { "no" }
            ),
            LogEvent::RunCompleted {
                status,
                attempts,
                duration_secs,
            } => format!(
                "[{}] run:{}:{} {:.1}s",
                timestamp, status, attempts, duration_secs
            ),
            LogEvent::MaxAttemptsReached { attempts } => {
                format!("[{}] run:limit:{}", timestamp, attempts)
            }
            LogEvent::ErrorEncountered { attempt, error } => {
                format!("[{}] error:{}:{}", timestamp, attempt, error)
            }
        }
    }

    /// Truncate a string and pad to exact width
    fn truncate_with_padding(s: &str, max_len: usize, total_width: usize) -> String {
        let first_line = s.lines().next().unwrap_or_default();
        let truncated = if first_line.chars().count() > max_len {
            let head: String = first_line.chars().take(max_len - 3).collect();
            format!("{}...", head)
        } else {
            first_line.to_string()
        };

        let padding_needed = total_width.saturating_sub(truncated.chars().count() + 1);
        format!("{}{}│", truncated, " ".repeat(padding_needed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = LogEvent::EvaluationCompleted {
            attempt: 2,
            accepted: false,
            feedback: "too long".into(),
            duration_secs: 0.5,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "evaluation_completed");
        assert_eq!(json["attempt"], 2);
        assert_eq!(json["feedback"], "too long");
    }

    #[test]
    fn test_with_timestamp_adds_field() {
        let event = LogEvent::MaxAttemptsReached { attempts: 3 };
        let value = event.with_timestamp();
        assert!(value["timestamp"].is_string());
        assert_eq!(value["event"], "max_attempts_reached");
    }

    #[test]
    fn test_compact_line() {
        let line = Logger::compact_line(&LogEvent::EvaluationCompleted {
            attempt: 1,
            accepted: true,
            feedback: String::new(),
            duration_secs: 0.1,
        });
        assert!(line.ends_with("evaluate:done:1 yes"));
    }

    #[test]
    fn test_truncate_with_padding_is_char_safe() {
        let padded = Logger::truncate_with_padding("Übersetze: Guten Morgen", 10, 20);
        assert!(padded.starts_with("Überset..."));
        assert_eq!(padded.chars().count(), 20);
    }

    #[test]
    fn test_file_logger_appends_json_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("router.jsonl");
        let logger = Logger::with_file(LogFormat::Compact, &path).unwrap();

        logger.log(&LogEvent::EvaluationStarted { attempt: 1 });
        logger.log(&LogEvent::MaxAttemptsReached { attempts: 3 });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "evaluation_started");
    }
}
