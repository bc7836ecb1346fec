//! State registry.
//!
//! States are logical actors that are not tied to one thread's lifetime.
//! Each lives in a slot of a fixed table and is bound to one worker process
//! at creation time, round-robin over the workers that exist. A state's
//! fields may be changed from any process, so the table sits behind a lock.

use crate::config::ExhaustionPolicy;
use crate::error::StateError;
use parking_lot::Mutex;
use wind_core::{ProcessId, StateId};

/// A snapshot of one live state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInfo {
    /// The state's id.
    pub id: StateId,
    /// The process the state is bound to.
    pub thread_id: ProcessId,
    /// Whether the state was registered through the root's allocation path.
    pub root_owned: bool,
}

/// One table slot. `id == 0` marks it free.
#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    id: u32,
    thread_id: u32,
    root_owned: bool,
}

#[derive(Debug)]
struct Table {
    slots: Box<[Slot]>,
    /// Where the next free-slot scan starts: the last allocated slot.
    cursor: usize,
    /// The worker the last state was bound to.
    last_worker: u32,
    live: usize,
}

impl Table {
    fn find_free(&mut self) -> Option<usize> {
        let len = self.slots.len();
        let found = (self.cursor..len)
            .chain(0..self.cursor)
            .find(|&i| self.slots[i].id == 0)?;
        self.cursor = found;
        Some(found)
    }

    fn next_worker(&mut self, process_count: usize) -> Option<ProcessId> {
        let first = ProcessId::FIRST_WORKER.get();
        let end = process_count as u32;
        if end <= first {
            return None;
        }
        let next = self.last_worker + 1;
        self.last_worker = if next < first || next >= end { first } else { next };
        Some(ProcessId::new(self.last_worker))
    }

    fn occupy(&mut self, slot: usize, thread_id: ProcessId, root_owned: bool) -> StateId {
        let id = StateId::from_slot(slot);
        self.slots[slot] = Slot {
            id: id.get(),
            thread_id: thread_id.get(),
            root_owned,
        };
        self.live += 1;
        id
    }

    fn live_slot(&mut self, id: u32) -> Result<&mut Slot, StateError> {
        let slot = StateId::new(id)
            .map(|id| id.slot())
            .and_then(|slot| self.slots.get_mut(slot))
            .ok_or(StateError::InvalidState(id))?;
        if slot.id == 0 {
            return Err(StateError::InvalidState(id));
        }
        Ok(slot)
    }
}

/// A fixed-capacity table of states.
#[derive(Debug)]
pub struct StateRegistry {
    table: Mutex<Table>,
    policy: ExhaustionPolicy,
}

impl StateRegistry {
    /// Creates a registry with `capacity` free slots.
    pub fn new(capacity: usize, policy: ExhaustionPolicy) -> Self {
        Self {
            table: Mutex::new(Table {
                slots: vec![Slot::default(); capacity].into_boxed_slice(),
                cursor: 0,
                last_worker: ProcessId::ROOT.get(),
                live: 0,
            }),
            policy,
        }
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.table.lock().slots.len()
    }

    /// Returns the number of live states.
    pub fn len(&self) -> usize {
        self.table.lock().live
    }

    /// Returns `true` if no state is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the first free slot at or after the scan cursor, wrapping once,
    /// and binds it to `thread_id`.
    pub fn allocate(&self, thread_id: ProcessId, root_owned: bool) -> Result<StateId, StateError> {
        let mut table = self.table.lock();
        let Some(slot) = table.find_free() else {
            let capacity = table.slots.len();
            drop(table);
            return Err(self.exhausted(capacity));
        };
        Ok(table.occupy(slot, thread_id, root_owned))
    }

    /// Advances the worker cursor and returns the worker it lands on.
    ///
    /// The cursor cycles over `2..process_count`, so over any run of calls
    /// the workers receive counts that differ by at most one.
    pub fn bind_round_robin(&self, process_count: usize) -> Result<ProcessId, StateError> {
        self.table
            .lock()
            .next_worker(process_count)
            .ok_or(StateError::NoWorkers)
    }

    /// Allocates a root-owned state and binds it to the next worker.
    pub fn create(&self, process_count: usize) -> Result<StateInfo, StateError> {
        let mut table = self.table.lock();
        let Some(slot) = table.find_free() else {
            let capacity = table.slots.len();
            drop(table);
            return Err(self.exhausted(capacity));
        };
        let thread_id = table
            .next_worker(process_count)
            .ok_or(StateError::NoWorkers)?;
        let id = table.occupy(slot, thread_id, true);
        tracing::debug!(state = %id, worker = %thread_id, "allocated state");
        Ok(StateInfo {
            id,
            thread_id,
            root_owned: true,
        })
    }

    /// Returns the fields of a live state.
    pub fn info(&self, id: u32) -> Result<StateInfo, StateError> {
        let mut table = self.table.lock();
        let slot = *table.live_slot(id)?;
        Ok(StateInfo {
            id: StateId::from_slot(slot.id as usize - 1),
            thread_id: ProcessId::new(slot.thread_id),
            root_owned: slot.root_owned,
        })
    }

    /// Sets the root-owned flag of a live state.
    pub fn set_root_owned(&self, id: u32, root_owned: bool) -> Result<(), StateError> {
        self.table.lock().live_slot(id)?.root_owned = root_owned;
        Ok(())
    }

    /// Rebinds a live state to another process.
    pub fn set_thread_id(&self, id: u32, thread_id: ProcessId) -> Result<(), StateError> {
        self.table.lock().live_slot(id)?.thread_id = thread_id.get();
        Ok(())
    }

    /// Returns a live state's slot to the free pool.
    pub fn release(&self, id: u32) -> Result<(), StateError> {
        let mut table = self.table.lock();
        *table.live_slot(id)? = Slot::default();
        table.live -= 1;
        tracing::debug!(state = id, "released state");
        Ok(())
    }

    fn exhausted(&self, capacity: usize) -> StateError {
        match self.policy {
            ExhaustionPolicy::Error => StateError::Exhausted { capacity },
            ExhaustionPolicy::Abort => {
                tracing::error!(capacity, "can not allocate state, terminating");
                std::process::exit(1);
            }
        }
    }
}
