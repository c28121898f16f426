//! Binary entry point for `task-params`.
//!
//! Checks that every task method of the inference client declares the
//! parameters of its task, and with `--update` adds the missing ones.
//!
//! ## Usage
//!
//! ```bash
//! # Report out-of-date methods (exit code 1 if any)
//! task-params
//!
//! # Rewrite the client in place
//! task-params --update
//!
//! # Machine-readable report
//! task-params --json --repo-root ../huggingface_hub
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use hubkit::error::{HubError, OutputErrorCode};
use hubkit::{RuffFormatter, SyncConfig, SyncMode, SyncReport, Synchronizer};

/// Sync task method signatures with their parameter declarations.
#[derive(Parser, Debug)]
#[command(name = "task-params", version)]
struct Cli {
    /// Rewrite the client file instead of only checking it.
    #[arg(long)]
    update: bool,

    /// Repository root the other paths are relative to.
    #[arg(long, default_value = ".")]
    repo_root: PathBuf,

    /// Client source file (default: src/huggingface_hub/inference/_client.py).
    #[arg(long)]
    client_file: Option<PathBuf>,

    /// Directory of task declaration files
    /// (default: src/huggingface_hub/inference/_generated/types).
    #[arg(long)]
    types_dir: Option<PathBuf>,

    /// Client class whose methods are checked.
    #[arg(long, default_value = "InferenceClient")]
    client_class: String,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Print the report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl Cli {
    fn config(&self) -> SyncConfig {
        let mut config = SyncConfig::for_repo(&self.repo_root);
        if let Some(client_file) = &self.client_file {
            config.client_file = client_file.clone();
        }
        if let Some(types_dir) = &self.types_dir {
            config.types_dir = types_dir.clone();
        }
        config.client_class = self.client_class.clone();
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level, cli.json);

    match execute(&cli) {
        Ok(code) => code,
        Err(err) => {
            let code = OutputErrorCode::from(&err);
            if cli.json {
                let body = serde_json::json!({
                    "status": "error",
                    "error": { "code": code.code(), "message": err.to_string() },
                });
                println!("{body}");
                let _ = io::stdout().flush();
            } else {
                eprintln!("❌ {err}");
            }
            ExitCode::from(code.code())
        }
    }
}

/// Initialize tracing subscriber. `RUST_LOG` wins over `--log-level`.
fn init_tracing(level: LogLevel, json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn execute(cli: &Cli) -> Result<ExitCode, HubError> {
    let config = cli.config();
    let mode = if cli.update {
        SyncMode::Update
    } else {
        SyncMode::Check
    };

    let formatter = RuffFormatter::new();
    let report = Synchronizer::new(config, &formatter).run(mode)?;

    if cli.json {
        let body = serde_json::to_string_pretty(&report)
            .map_err(|e| HubError::internal(format!("serializing report: {e}")))?;
        println!("{body}");
    } else {
        print_human(&report, cli);
    }

    Ok(if report.is_in_sync() || mode == SyncMode::Update {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_human(report: &SyncReport, cli: &Cli) {
    let skipped: Vec<String> = report.skipped.iter().map(|t| format!("'{t}'")).collect();
    println!("🙈 Skipping the following tasks: [{}]", skipped.join(", "));

    let client = report.client_file.display();
    if report.mode == SyncMode::Check && !report.is_in_sync() {
        for line in report.failures() {
            println!("{line}");
        }
        println!(
            "❌ Mismatch between parameters defined in tasks methods signature in `{client}` \
             and parameters defined in `{}`.\n   \
             Please run `make style` or `task-params --update`",
            cli.config().types_dir.display()
        );
    } else if report.updated {
        println!(
            "✅ {} source code has been updated in `{client}`.\n   \
             Please make sure the changes are accurate and commit them.",
            cli.client_class
        );
    } else {
        println!("✅ All good!");
    }
}
