//! The `wind` command.
//!
//! ```bash
//! wind main.wind
//! RUST_LOG=debug wind --max-workers 8 main.wind
//! ```

use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wind::{ExhaustionPolicy, RuntimeConfig};

/// Run a wind script as the main process of a new runtime.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Maximum number of worker threads
    #[arg(long, default_value_t = wind::DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Number of state slots
    #[arg(long, default_value_t = wind::DEFAULT_MAX_STATES)]
    max_states: usize,

    /// Exit the whole program when every state slot is taken
    #[arg(long)]
    abort_on_state_exhaustion: bool,

    /// Script to run in the main process
    script: PathBuf,
}

impl Args {
    fn config(&self) -> RuntimeConfig {
        let policy = if self.abort_on_state_exhaustion {
            ExhaustionPolicy::Abort
        } else {
            ExhaustionPolicy::Error
        };
        RuntimeConfig::default()
            .with_max_workers(self.max_workers)
            .with_max_states(self.max_states)
            .with_state_exhaustion(policy)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match wind::run_script(args.config(), &args.script) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(script = %args.script.display(), error = %err, "wind failed");
            eprintln!("wind: {err}");
            ExitCode::FAILURE
        }
    }
}
