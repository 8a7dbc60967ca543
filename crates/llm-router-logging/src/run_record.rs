use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Represents each line type in a run JSONL file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunLine {
    RunStart {
        run_id: String,
        timestamp: DateTime<Utc>,
        request: String,
        model: String,
        max_attempts: usize,
    },
    Attempt {
        attempt: usize,
        task: String,
        feedback_in: Option<String>,
        solution: String,
        accepted: bool,
        feedback: String,
        timestamp: DateTime<Utc>,
    },
    RunEnd {
        outcome: String,
        task: Option<String>,
        attempts: usize,
        solution: Option<String>,
        error: Option<String>,
        duration_secs: f64,
        timestamp: DateTime<Utc>,
    },
}

/// Fields of one attempt, passed individually so this crate stays free of
/// the router's types.
#[derive(Debug, Clone, Copy)]
pub struct AttemptLine<'a> {
    pub attempt: usize,
    pub task: &'a str,
    pub feedback_in: Option<&'a str>,
    pub solution: &'a str,
    pub accepted: bool,
    pub feedback: &'a str,
    pub timestamp: DateTime<Utc>,
}

/// Writes run data as JSONL to a file in ~/.local/share/llm-router/runs/.
pub struct RunWriter {
    file: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl RunWriter {
    /// Create a writer under the default runs directory.
    pub fn new(request: &str) -> io::Result<Self> {
        Self::new_in(&Self::runs_dir()?, request)
    }

    /// Create a writer in `dir`. The file name is built from the current UTC
    /// timestamp and a short hash of the request.
    pub fn new_in(dir: &Path, request: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;

        let path = dir.join(Self::file_name(Utc::now(), request));
        let file = File::create(&path)?;

        Ok(Self {
            file: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    fn file_name(now: DateTime<Utc>, request: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(request.as_bytes());
        let hash = hex::encode(hasher.finalize());

        format!(
            "{}_{}.jsonl",
            now.format("%Y-%m-%dT%H-%M-%S%.3fZ"),
            &hash[..6]
        )
    }

    /// Returns the path to the run file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_start(&self, run_id: &str, request: &str, model: &str, max_attempts: usize) {
        self.write_line(&RunLine::RunStart {
            run_id: run_id.to_string(),
            timestamp: Utc::now(),
            request: request.to_string(),
            model: model.to_string(),
            max_attempts,
        });
    }

    pub fn write_attempt(&self, line: AttemptLine<'_>) {
        self.write_line(&RunLine::Attempt {
            attempt: line.attempt,
            task: line.task.to_string(),
            feedback_in: line.feedback_in.map(String::from),
            solution: line.solution.to_string(),
            accepted: line.accepted,
            feedback: line.feedback.to_string(),
            timestamp: line.timestamp,
        });
    }

    pub fn write_end(
        &self,
        outcome: &str,
        task: Option<&str>,
        attempts: usize,
        solution: Option<&str>,
        error: Option<&str>,
        duration_secs: f64,
    ) {
        self.write_line(&RunLine::RunEnd {
            outcome: outcome.to_string(),
            task: task.map(String::from),
            attempts,
            solution: solution.map(String::from),
            error: error.map(String::from),
            duration_secs,
            timestamp: Utc::now(),
        });
    }

    fn write_line(&self, line: &RunLine) {
        if let Ok(json) = serde_json::to_string(line) {
            if let Ok(mut writer) = self.file.lock() {
                let _ = writeln!(writer, "{}", json);
                let _ = writer.flush();
            }
        }
    }

    fn runs_dir() -> io::Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine data directory",
            )
        })?;
        Ok(data_dir.join("llm-router").join("runs"))
    }
}

/// Read a run file back into its lines
pub fn read_run(path: &Path) -> io::Result<Vec<RunLine>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        })
        .collect()
}
