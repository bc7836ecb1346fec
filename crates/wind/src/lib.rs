//! # wind
//!
//! A multi-threaded actor runtime hosting isolated script interpreters on
//! dedicated OS threads.
//!
//! This crate re-exports the public API of [`wind_runtime`] and
//! [`wind_script`] and provides [`run_script`], which is what the `wind`
//! binary does: create a runtime, load a script into the main process and
//! run it on the calling thread.
//!
//! ```ignore
//! let runtime = wind::run_script(wind::RuntimeConfig::default(), "main.wind")?;
//! for (pid, status) in runtime.join_all() {
//!     println!("{pid}: {status:?}");
//! }
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

use std::path::Path;
use thiserror::Error;

pub use wind_core::{Payload, ProcessId, Role, StateId, Term};
pub use wind_runtime::{
    Capability, CapabilitySet, ConfigError, Context, DEFAULT_MAX_STATES, DEFAULT_MAX_WORKERS,
    Engine, ExhaustionPolicy, ExitStatus, LoadError, RegistryError, Runtime, RuntimeConfig,
    RuntimeError, RuntimeHandle, Script, ScriptError, ScriptSource, SendError, SpawnError,
    StateError, StateInfo,
};
pub use wind_script::{Program, ScriptEngine};

/// Why [`run_script`] failed.
#[derive(Debug, Error)]
pub enum RunError {
    /// The runtime configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The main script could not be loaded. No thread was started.
    #[error("error loading main script: {0}")]
    Load(#[from] LoadError),

    /// The main script raised an uncaught error.
    #[error("main script failed: {0}")]
    Script(#[from] ScriptError),
}

/// Creates a runtime and runs the script at `path` as the main process.
///
/// Threads the script spawned are not joined unless the script does so
/// itself; the returned runtime can be used to join them.
pub fn run_script(config: RuntimeConfig, path: impl AsRef<Path>) -> Result<Runtime, RunError> {
    let engine = ScriptEngine::new();
    let source = ScriptSource::path(path.as_ref());
    let mut main = engine.load(&source)?;
    let runtime = Runtime::new(config, engine)?;

    tracing::debug!(script = %source, "running main script");
    let mut ctx = runtime.main_context();
    main.bind(ctx.capabilities());
    main.run(&mut ctx)?;
    Ok(runtime)
}
