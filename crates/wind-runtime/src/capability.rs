//! Capability sets.
//!
//! Every process is started with an explicit [`CapabilitySet`] naming the
//! runtime primitives its interpreter instance may bind. The presets mirror
//! the three roles, but a set can be passed to
//! [`Runtime::spawn_with`](crate::Runtime::spawn_with) directly.

use std::fmt;

/// A group of runtime primitives that can be granted to a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `self`, `send`, `recv` and `nthread`.
    Messaging,
    /// `info`, `set_root`, `set_threadid` and `free` on states.
    StateInspect,
    /// Creation of new states.
    StateAlloc,
    /// Access to the process's own wakeup descriptor.
    Wakeup,
    /// Term encoding and decoding of payloads.
    Serialization,
    /// A tokio reactor to wait on the wakeup descriptor alongside other I/O.
    Reactor,
    /// `fork` and `join_threads`.
    Orchestration,
}

impl Capability {
    /// Every capability, in bit order.
    pub const ALL: [Capability; 7] = [
        Capability::Messaging,
        Capability::StateInspect,
        Capability::StateAlloc,
        Capability::Wakeup,
        Capability::Serialization,
        Capability::Reactor,
        Capability::Orchestration,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Short name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Capability::Messaging => "messaging",
            Capability::StateInspect => "state",
            Capability::StateAlloc => "state-alloc",
            Capability::Wakeup => "wakeup",
            Capability::Serialization => "serialize",
            Capability::Reactor => "reactor",
            Capability::Orchestration => "orchestration",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of [`Capability`] values.
///
/// ```
/// use wind_runtime::{Capability, CapabilitySet};
///
/// assert!(CapabilitySet::ROOT.contains(Capability::StateAlloc));
/// assert!(!CapabilitySet::WORKER.contains(Capability::StateAlloc));
/// assert!(CapabilitySet::MAIN.contains(Capability::Orchestration));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// Capabilities of the main process.
    pub const MAIN: CapabilitySet = CapabilitySet::empty()
        .with(Capability::Orchestration)
        .with(Capability::Messaging)
        .with(Capability::Serialization);

    /// Capabilities of the root process.
    pub const ROOT: CapabilitySet = CapabilitySet::empty()
        .with(Capability::Messaging)
        .with(Capability::StateInspect)
        .with(Capability::StateAlloc)
        .with(Capability::Wakeup)
        .with(Capability::Serialization)
        .with(Capability::Reactor);

    /// Capabilities of a worker process.
    pub const WORKER: CapabilitySet = CapabilitySet::empty()
        .with(Capability::Messaging)
        .with(Capability::StateInspect)
        .with(Capability::Wakeup)
        .with(Capability::Serialization);

    /// The empty set.
    pub const fn empty() -> Self {
        CapabilitySet(0)
    }

    /// Returns the set with `capability` added.
    pub const fn with(self, capability: Capability) -> Self {
        CapabilitySet(self.0 | capability.bit())
    }

    /// Returns the set with `capability` removed.
    pub const fn without(self, capability: Capability) -> Self {
        CapabilitySet(self.0 & !capability.bit())
    }

    /// Returns `true` if `capability` is in the set.
    pub const fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Iterates over the capabilities in the set.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(CapabilitySet::empty(), CapabilitySet::with)
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
