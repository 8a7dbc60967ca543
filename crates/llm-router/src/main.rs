mod config;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;

use config::{Overrides, ProjectConfig};
use llm_router_core::{ProcessOutput, Router, RouterError, RunResult};
use llm_router_logging::{init_tracing, LogFormat, Logger, RunWriter};
use llm_router_oracle::{create_oracle, OracleConfig};

/// Exit code when a run fails on an oracle or configuration error
const EXIT_FAILURE: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "llm-router",
    about = "Route a request to explain, translate or summarize, with evaluator-driven retries",
    version,
    author
)]
struct Cli {
    /// Request to route (prompts on stdin if not provided)
    request: Option<String>,

    /// Keep prompting for requests until EOF or `exit`
    #[arg(short, long)]
    interactive: bool,

    /// Directory holding llm-router.toml (default: current directory)
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// Maximum generate/evaluate attempts per request (default: 3)
    #[arg(short = 'n', long)]
    max_attempts: Option<usize>,

    /// Oracle model as provider/model, e.g. openai/gpt-4o-mini
    #[arg(short, long)]
    model: Option<String>,

    /// Override the provider's API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Also append JSON log events to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Output final result as JSON
    #[arg(long)]
    json_output: bool,

    /// Do not write a run record
    #[arg(long)]
    no_record: bool,

    /// Dry run: show the resolved settings without calling the oracle
    #[arg(long)]
    dry_run: bool,

    /// Enable debug tracing
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

/// Per-invocation settings shared by every request handled
struct Session<'a> {
    router: Router<'a>,
    model_id: String,
    record: bool,
    json_output: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".bright_red().bold(), e);
            EXIT_FAILURE
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let working_dir = match cli.working_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let project = ProjectConfig::load(&working_dir)?.unwrap_or_default();
    let overrides = Overrides {
        model: cli.model.as_deref(),
        base_url: cli.base_url.as_deref(),
        max_attempts: cli.max_attempts,
    };
    let max_attempts = project.max_attempts(&overrides)?;
    let oracle_config = project.oracle_config(&overrides, |var| std::env::var(var).ok())?;

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(if cli.verbose { "debug" } else { "warn" }, log_format);

    if cli.dry_run {
        print_dry_run(&oracle_config, max_attempts, &working_dir);
        return Ok(0);
    }

    let logger = match cli.log_file {
        Some(ref path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };

    let model_id = oracle_config.model_id();
    let oracle = create_oracle(oracle_config).context("Failed to create oracle")?;
    let router = Router::new(oracle.as_ref(), Arc::new(logger)).with_max_attempts(max_attempts)?;

    let session = Session {
        router,
        model_id,
        record: !cli.no_record,
        json_output: cli.json_output,
    };

    if cli.interactive {
        return run_interactive(&session).await;
    }

    let request = match cli.request {
        Some(request) => request,
        None => read_request()?.unwrap_or_default(),
    };
    handle_request(&session, &request).await
}

/// Prompt for requests until EOF or `exit`. Failed runs are reported and the
/// loop continues.
async fn run_interactive(session: &Session<'_>) -> Result<i32> {
    while let Some(request) = read_request()? {
        if matches!(request.trim(), "exit" | "quit") {
            break;
        }
        if let Err(e) = handle_request(session, &request).await {
            eprintln!("{} {:#}", "error:".bright_red().bold(), e);
        }
        eprintln!();
    }
    Ok(0)
}

/// Read one line from stdin; None on EOF
fn read_request() -> Result<Option<String>> {
    eprint!("Enter your request: ");
    io::stderr().flush().context("Failed to flush stderr")?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read request from stdin")?;

    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

async fn handle_request(session: &Session<'_>, request: &str) -> Result<i32> {
    if request.trim().is_empty() {
        print_output(session, &ProcessOutput::prompt_for_input(), None);
        return Ok(0);
    }

    let run_id = uuid::Uuid::new_v4().to_string();
    let writer = if session.record {
        open_run_writer(request)
    } else {
        None
    };
    if let Some(ref writer) = writer {
        writer.write_start(
            &run_id,
            request,
            &session.model_id,
            session.router.max_attempts(),
        );
    }

    let start = Instant::now();
    match session
        .router
        .run_recorded(run_id, request, writer.as_ref())
        .await
    {
        Ok(result) => {
            if let Some(ref writer) = writer {
                record_end(writer, &result);
            }
            print_output(session, &ProcessOutput::from(&result), Some(&result));
            Ok(result.exit_code())
        }
        Err(RouterError::EmptyRequest) => {
            print_output(session, &ProcessOutput::prompt_for_input(), None);
            Ok(0)
        }
        Err(e) => {
            if let Some(ref writer) = writer {
                let error = e.to_string();
                writer.write_end(
                    "failed",
                    None,
                    0,
                    None,
                    Some(&error),
                    start.elapsed().as_secs_f64(),
                );
            }
            Err(e).context("Run failed")
        }
    }
}

/// A missing run record is not worth failing the request over
fn open_run_writer(request: &str) -> Option<RunWriter> {
    match RunWriter::new(request) {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!(
                "{} could not create run record: {}",
                "warning:".bright_yellow(),
                e
            );
            None
        }
    }
}

/// Attempt lines are written by the router as they happen
fn record_end(writer: &RunWriter, result: &RunResult) {
    writer.write_end(
        result.status.as_str(),
        Some(result.task.as_str()),
        result.iterations(),
        Some(&result.solution),
        None,
        result.total_duration_secs,
    );
}

fn print_output(session: &Session<'_>, output: &ProcessOutput, result: Option<&RunResult>) {
    if session.json_output {
        let json = serde_json::json!({
            "run_id": result.map(|r| r.run_id.as_str()),
            "status": result.map(|r| r.status.as_str()),
            "final_text": output.final_text,
            "task_label": output.task_label,
            "attempt_log": output.attempt_log,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        return;
    }

    if !output.task_label.is_empty() {
        eprintln!();
        eprintln!("{}", output.task_label.bright_cyan().bold());
    }
    for line in output.attempt_log.lines() {
        let line = if line.starts_with('✅') {
            line.bright_green()
        } else if line.starts_with('❌') {
            line.bright_red()
        } else if line.starts_with('⚠') {
            line.bright_yellow()
        } else {
            line.dimmed()
        };
        eprintln!("{}", line);
    }
    if !output.attempt_log.is_empty() {
        eprintln!();
    }
    println!("{}", output.final_text);
}

fn print_dry_run(oracle: &OracleConfig, max_attempts: usize, working_dir: &std::path::Path) {
    println!("=== Dry Run ===");
    println!("Working dir: {}", working_dir.display());
    println!("Model: {}", oracle.model_id());
    println!("Endpoint: {}", oracle.endpoint());
    println!(
        "API key: {}",
        if oracle.api_key.is_some() {
            "set"
        } else {
            "missing"
        }
    );
    println!("Max attempts: {}", max_attempts);
}
