//! Error types for runtime operations.

use crate::capability::Capability;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use wind_core::{DecodeError, EncodeError, ProcessId};

/// Errors that can occur during runtime operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Failed to send a message.
    #[error("send failed: {0}")]
    Send(#[from] SendError),

    /// Failed to spawn a process.
    #[error("spawn failed: {0}")]
    Spawn(#[from] SpawnError),

    /// A state registry operation was rejected.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// A process registry lookup was rejected.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The calling process was not granted the capability it tried to use.
    #[error("process {pid} lacks the {capability} capability")]
    MissingCapability {
        /// The calling process.
        pid: ProcessId,
        /// The capability that was required.
        capability: Capability,
    },

    /// A payload could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// An operating-system call failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that can occur when sending messages.
#[derive(Debug, Error)]
pub enum SendError {
    /// The payload was empty.
    #[error("send error: data is empty")]
    NullPayload,

    /// The target id was never allocated.
    #[error("send error: process {0} does not exist")]
    UnknownProcess(ProcessId),

    /// The target thread has exited and its mailbox is closed.
    #[error("send error: process {0} has exited")]
    Closed(ProcessId),
}

/// Errors that can occur when spawning processes.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The process table is full.
    #[error("the number of processes exceeds the limit of {capacity}")]
    Capacity {
        /// The table capacity, main included.
        capacity: usize,
    },

    /// The script could not be loaded into a fresh interpreter instance.
    #[error("error starting process: {0}")]
    Load(#[from] LoadError),

    /// The wakeup channel could not be created.
    #[error("unable to create wakeup channel: {0}")]
    Wakeup(#[source] io::Error),

    /// The operating system refused to start the thread.
    #[error("unable to start thread: {0}")]
    Thread(#[source] io::Error),
}

/// Errors from process registry lookups.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The id is outside the allocated range.
    #[error("invalid process id {0}")]
    InvalidId(ProcessId),
}

/// Errors from the state registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// The id is out of range or names a free slot.
    #[error("invalid state {0}")]
    InvalidState(u32),

    /// Every slot is taken.
    #[error("can not allocate state: all {capacity} slots are in use")]
    Exhausted {
        /// The table capacity.
        capacity: usize,
    },

    /// There is no worker process to bind a state to.
    #[error("no worker process to bind a state to")]
    NoWorkers,
}

/// Errors raised while loading a script into an interpreter instance.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The script file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path of the script.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The script text is malformed.
    #[error("{script}:{line}: {message}")]
    Parse {
        /// Script name or path.
        script: String,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

/// An uncaught failure raised by a running script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A runtime primitive called by the script failed.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The script raised an error of its own.
    #[error("{0}")]
    Raised(String),
}

impl ScriptError {
    /// Creates a script-raised error.
    pub fn raised(message: impl Into<String>) -> Self {
        ScriptError::Raised(message.into())
    }
}

impl From<SendError> for ScriptError {
    fn from(err: SendError) -> Self {
        ScriptError::Runtime(err.into())
    }
}

impl From<StateError> for ScriptError {
    fn from(err: StateError) -> Self {
        ScriptError::Runtime(err.into())
    }
}

impl From<SpawnError> for ScriptError {
    fn from(err: SpawnError) -> Self {
        ScriptError::Runtime(err.into())
    }
}

/// Errors in a [`RuntimeConfig`](crate::RuntimeConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_workers` must be at least one.
    #[error("max_workers must be at least 1")]
    NoWorkers,

    /// `max_workers` exceeds what a process id can address.
    #[error("max_workers {0} is too large")]
    TooManyWorkers(usize),

    /// `max_states` must be at least one.
    #[error("max_states must be at least 1")]
    NoStates,

    /// `max_states` exceeds what a state id can address.
    #[error("max_states {0} is too large")]
    TooManyStates(usize),

    /// The process table has no slot left for the main process.
    #[error("process table has no room for the main process")]
    NoRoomForMain,
}
