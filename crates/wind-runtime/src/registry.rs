//! Process registry.
//!
//! The [`ProcessRegistry`] is a fixed-capacity table indexed by process id.
//! Ids are handed out sequentially and never reused within a run. A slot is
//! filled exactly once, when its process is published, and is read-only
//! afterwards; only growth of the table is serialized.

use crate::error::{RegistryError, SpawnError};
use crate::process_handle::ProcessHandle;
use parking_lot::{Mutex, MutexGuard};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use wind_core::ProcessId;

/// A fixed-capacity table of every process in the runtime.
pub struct ProcessRegistry {
    slots: Box<[OnceLock<ProcessHandle>]>,
    /// Number of published processes. Slots below it are always set.
    count: AtomicUsize,
    /// Serializes reservation and publication.
    growth: Mutex<()>,
}

impl ProcessRegistry {
    /// Creates an empty registry with room for `capacity` processes.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            count: AtomicUsize::new(0),
            growth: Mutex::new(()),
        }
    }

    /// Returns the table capacity.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of processes created so far, main included.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Returns the count once no reservation is outstanding, blocking until
    /// an in-flight spawn has published or given up its slot.
    pub fn settled_count(&self) -> usize {
        let _guard = self.growth.lock();
        self.count.load(Ordering::Acquire)
    }

    /// Looks up a process by id.
    pub fn lookup(&self, pid: ProcessId) -> Result<ProcessHandle, RegistryError> {
        self.get(pid).ok_or(RegistryError::InvalidId(pid))
    }

    /// Looks up a process by id, returning `None` for unallocated ids.
    pub fn get(&self, pid: ProcessId) -> Option<ProcessHandle> {
        if pid.index() >= self.count() {
            return None;
        }
        self.slots[pid.index()].get().cloned()
    }

    /// Returns `true` if `pid` has been allocated.
    pub fn contains(&self, pid: ProcessId) -> bool {
        pid.index() < self.count()
    }

    /// Returns the ids of every published process, in ascending order.
    pub fn pids(&self) -> impl Iterator<Item = ProcessId> {
        (0..self.count() as u32).map(ProcessId::new)
    }

    /// Returns the ids of every published worker, in ascending order.
    pub fn workers(&self) -> impl Iterator<Item = ProcessId> {
        (ProcessId::FIRST_WORKER.get()..self.count() as u32).map(ProcessId::new)
    }

    /// Reserves the next id.
    ///
    /// The reservation holds the growth lock until it is published or
    /// dropped; dropping it leaves the table unchanged.
    pub fn reserve(&self) -> Result<Reservation<'_>, SpawnError> {
        let guard = self.growth.lock();
        let index = self.count.load(Ordering::Relaxed);
        if index >= self.slots.len() {
            return Err(SpawnError::Capacity {
                capacity: self.slots.len(),
            });
        }
        Ok(Reservation {
            registry: self,
            index,
            _guard: guard,
        })
    }
}

impl std::fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("count", &self.count())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// A reserved, not yet visible, process slot.
pub struct Reservation<'a> {
    registry: &'a ProcessRegistry,
    index: usize,
    _guard: MutexGuard<'a, ()>,
}

impl Reservation<'_> {
    /// The id the process will be published under.
    pub fn pid(&self) -> ProcessId {
        ProcessId::new(self.index as u32)
    }

    /// Makes the process visible to lookups and `count`.
    pub fn publish(self, handle: ProcessHandle) {
        debug_assert_eq!(handle.pid(), self.pid());
        // Slots at or above `count` are never set, and `count` only grows
        // under the growth lock we hold.
        let _ = self.registry.slots[self.index].set(handle);
        self.registry.count.store(self.index + 1, Ordering::Release);
    }
}
