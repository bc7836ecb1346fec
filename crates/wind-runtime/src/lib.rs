//! # wind-runtime
//!
//! A multi-threaded actor runtime that hosts isolated interpreter instances
//! on dedicated OS threads.
//!
//! # Overview
//!
//! - **Processes**: one OS thread, one interpreter, one mailbox each. Ids
//!   are dense and never reused; 0 is main, 1 is root, 2.. are workers.
//! - **Mailboxes**: unbounded FIFO queues of move-only [`Payload`]s. A push
//!   that makes a mailbox non-empty signals the owner's [`WakeupChannel`].
//! - **States**: a fixed table of logical actors, each bound to a worker
//!   thread in round-robin order.
//! - **Capabilities**: each role gets a fixed set of primitives. Main
//!   orchestrates, root allocates states, workers run them.
//!
//! # Quick Start
//!
//! ```ignore
//! use wind_runtime::{CapabilitySet, Context, Runtime, RuntimeConfig, ScriptError};
//!
//! let runtime = Runtime::new(RuntimeConfig::default(), engine)?;
//! let root = runtime.spawn_script(
//!     |ctx: &mut Context| -> Result<(), ScriptError> {
//!         let state = ctx.new_state()?;
//!         tracing::info!(id = %state.id, worker = %state.thread_id, "created state");
//!         Ok(())
//!     },
//!     CapabilitySet::ROOT,
//! )?;
//! runtime.join_all();
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

#[cfg(not(unix))]
compile_error!("wind-runtime requires a unix platform");

pub mod capability;
pub mod config;
pub mod context;
pub mod error;
pub mod mailbox;
pub mod process_handle;
pub mod reactor;
pub mod registry;
pub mod runtime;
pub mod script;
pub mod states;
pub mod wakeup;

pub use capability::{Capability, CapabilitySet};
pub use config::{DEFAULT_MAX_STATES, DEFAULT_MAX_WORKERS, ExhaustionPolicy, RuntimeConfig};
pub use context::Context;
pub use error::{
    ConfigError, LoadError, RegistryError, RuntimeError, ScriptError, SendError, SpawnError,
    StateError,
};
pub use mailbox::Mailbox;
pub use process_handle::{ExitStatus, ProcessHandle};
pub use reactor::{Reactor, Readiness};
pub use registry::{ProcessRegistry, Reservation};
pub use runtime::{Runtime, RuntimeHandle};
pub use script::{Engine, Script, ScriptSource};
pub use states::{StateInfo, StateRegistry};
pub use wakeup::WakeupChannel;
pub use wind_core::{Payload, ProcessId, Role, StateId, Term};
