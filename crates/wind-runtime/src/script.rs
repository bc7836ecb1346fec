//! Script-engine seam.
//!
//! The runtime does not know any scripting language. An [`Engine`] turns a
//! [`ScriptSource`] into a fresh interpreter instance with the script loaded
//! (a boxed [`Script`]); the runtime then moves that instance onto its own
//! thread, installs the process's capabilities with [`Script::bind`] and
//! runs it to completion.

use crate::capability::CapabilitySet;
use crate::context::Context;
use crate::error::{LoadError, ScriptError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a script comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// A script file.
    Path(PathBuf),
    /// Script text held in memory.
    Inline {
        /// Name used in diagnostics.
        name: String,
        /// The script text.
        code: String,
    },
}

impl ScriptSource {
    /// A script file.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ScriptSource::Path(path.into())
    }

    /// An in-memory script.
    pub fn inline(name: impl Into<String>, code: impl Into<String>) -> Self {
        ScriptSource::Inline {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> String {
        match self {
            ScriptSource::Path(path) => path.display().to_string(),
            ScriptSource::Inline { name, .. } => name.clone(),
        }
    }

    /// Reads the script text.
    pub fn read(&self) -> Result<String, LoadError> {
        match self {
            ScriptSource::Path(path) => {
                std::fs::read_to_string(path).map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })
            }
            ScriptSource::Inline { code, .. } => Ok(code.clone()),
        }
    }

    /// Directory of a file script, against which it may resolve relative
    /// paths.
    pub fn base_dir(&self) -> Option<&Path> {
        match self {
            ScriptSource::Path(path) => path.parent(),
            ScriptSource::Inline { .. } => None,
        }
    }
}

impl fmt::Display for ScriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Creates interpreter instances.
pub trait Engine: Send + Sync + 'static {
    /// Creates an isolated interpreter instance and loads `source` into it.
    ///
    /// Called on the spawning thread before any thread is started, so a
    /// load failure never leaks a thread or a process slot.
    fn load(&self, source: &ScriptSource) -> Result<Box<dyn Script>, LoadError>;
}

/// An interpreter instance with a loaded script.
pub trait Script: Send + 'static {
    /// Installs the bindings for `capabilities`. Called once, on the
    /// process's own thread, before [`run`](Script::run).
    fn bind(&mut self, capabilities: CapabilitySet) {
        let _ = capabilities;
    }

    /// Runs the script to completion.
    fn run(&mut self, ctx: &mut Context) -> Result<(), ScriptError>;
}

impl<F> Script for F
where
    F: FnMut(&mut Context) -> Result<(), ScriptError> + Send + 'static,
{
    fn run(&mut self, ctx: &mut Context) -> Result<(), ScriptError> {
        self(ctx)
    }
}
