//! Process identifier type.
//!
//! A [`ProcessId`] names one OS thread and its interpreter instance. Ids are
//! handed out sequentially by the process registry and never reused within a
//! run: `0` is the main process, `1` the root, and everything above is a
//! worker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a process plays in the runtime.
///
/// Roles are never stored; they follow from the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The initial process (id 0) that loads the entry script.
    Main,
    /// The first spawned process (id 1). Owns state allocation and I/O.
    Root,
    /// Any spawned process with id 2 or above.
    Worker,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Main => f.write_str("main"),
            Role::Root => f.write_str("root"),
            Role::Worker => f.write_str("worker"),
        }
    }
}

/// A process identifier.
///
/// # Examples
///
/// ```
/// use wind_core::{ProcessId, Role};
///
/// assert_eq!(ProcessId::MAIN.role(), Role::Main);
/// assert_eq!(ProcessId::ROOT.role(), Role::Root);
/// assert_eq!(ProcessId::new(7).role(), Role::Worker);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(u32);

impl ProcessId {
    /// The main process.
    pub const MAIN: ProcessId = ProcessId(0);

    /// The root process.
    pub const ROOT: ProcessId = ProcessId(1);

    /// The first worker id.
    pub const FIRST_WORKER: ProcessId = ProcessId(2);

    /// Creates a process id from its raw value.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the id as a table index.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Returns the role implied by this id.
    pub const fn role(&self) -> Role {
        match self.0 {
            0 => Role::Main,
            1 => Role::Root,
            _ => Role::Worker,
        }
    }

    /// Returns `true` for the main process.
    #[inline]
    pub const fn is_main(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ProcessId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Debug for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessId<{}>", self.0)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}
