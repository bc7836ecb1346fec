//! Process execution context.
//!
//! A [`Context`] is the surface a running script uses to talk to the
//! runtime: its own id, send/recv, the state registry and, for the main
//! process, fork/join. Every primitive is gated on the capability set the
//! process was started with.

use crate::capability::{Capability, CapabilitySet};
use crate::error::{RegistryError, RuntimeError};
use crate::process_handle::{ExitStatus, ProcessHandle};
use crate::reactor::{Reactor, Readiness};
use crate::runtime::RuntimeHandle;
use crate::script::ScriptSource;
use crate::states::StateInfo;
use crate::wakeup::WakeupChannel;
use std::os::fd::{AsRawFd, RawFd};
use std::time::{Duration, Instant};
use wind_core::{Payload, ProcessId, Role, Term};

/// How often the main process re-checks its mailbox while waiting; it has no
/// wakeup channel.
const MAIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// The execution context of one process.
///
/// # Examples
///
/// ```ignore
/// fn worker(ctx: &mut Context) -> Result<(), ScriptError> {
///     while ctx.wait(Some(Duration::from_secs(1)))? {
///         while let Some(msg) = ctx.recv_term::<String>()? {
///             ctx.send_term(ProcessId::ROOT, &msg.to_uppercase())?;
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct Context {
    process: ProcessHandle,
    runtime: RuntimeHandle,
    reactor: Option<Reactor>,
}

impl Context {
    pub(crate) fn new(process: ProcessHandle, runtime: RuntimeHandle) -> Self {
        Self {
            process,
            runtime,
            reactor: None,
        }
    }

    /// Returns this process's id.
    pub fn pid(&self) -> ProcessId {
        self.process.pid()
    }

    /// Returns this process's role.
    pub fn role(&self) -> Role {
        self.process.pid().role()
    }

    /// Returns the capabilities this process was started with.
    pub fn capabilities(&self) -> CapabilitySet {
        self.process.capabilities()
    }

    /// Returns the runtime this process belongs to.
    pub fn runtime(&self) -> &RuntimeHandle {
        &self.runtime
    }

    pub(crate) fn process(&self) -> &ProcessHandle {
        &self.process
    }

    fn require(&self, capability: Capability) -> Result<(), RuntimeError> {
        if self.capabilities().contains(capability) {
            Ok(())
        } else {
            Err(RuntimeError::MissingCapability {
                pid: self.pid(),
                capability,
            })
        }
    }

    /// Returns this process's id and, for every process but main, its
    /// waitable wakeup descriptor.
    pub fn self_info(&self) -> Result<(ProcessId, Option<RawFd>), RuntimeError> {
        self.require(Capability::Messaging)?;
        let fd = match self.process.wakeup() {
            Some(wakeup) if self.capabilities().contains(Capability::Wakeup) => {
                Some(wakeup.as_raw_fd())
            }
            _ => None,
        };
        Ok((self.pid(), fd))
    }

    /// Sends a payload to `target`, moving it into the target's mailbox.
    pub fn send(&self, target: ProcessId, payload: Payload) -> Result<(), RuntimeError> {
        self.require(Capability::Messaging)?;
        Ok(self.runtime.send(target, payload)?)
    }

    /// Pops the oldest message from this process's mailbox without blocking.
    pub fn recv(&self) -> Result<Option<Payload>, RuntimeError> {
        self.require(Capability::Messaging)?;
        Ok(self.process.mailbox().pop())
    }

    /// Returns the number of processes, main included.
    pub fn nthread(&self) -> Result<usize, RuntimeError> {
        self.require(Capability::Messaging)?;
        Ok(self.runtime.nthread())
    }

    /// Encodes `value` and sends it to `target`.
    pub fn send_term<T: Term>(&self, target: ProcessId, value: &T) -> Result<(), RuntimeError> {
        self.require(Capability::Serialization)?;
        self.send(target, Payload::encode(value)?)
    }

    /// Pops the oldest message and decodes it.
    pub fn recv_term<T: Term>(&self) -> Result<Option<T>, RuntimeError> {
        self.require(Capability::Serialization)?;
        match self.recv()? {
            Some(payload) => Ok(Some(payload.decode()?)),
            None => Ok(None),
        }
    }

    /// Returns this process's wakeup channel.
    pub fn wakeup(&self) -> Result<&WakeupChannel, RuntimeError> {
        self.require(Capability::Wakeup)?;
        self.process
            .wakeup()
            .map(|w| w.as_ref())
            .ok_or(RuntimeError::MissingCapability {
                pid: self.pid(),
                capability: Capability::Wakeup,
            })
    }

    /// Returns this process's reactor, creating it on first use.
    pub fn reactor(&mut self) -> Result<&Reactor, RuntimeError> {
        self.require(Capability::Reactor)?;
        if self.reactor.is_none() {
            self.reactor = Some(Reactor::new()?);
        }
        self.reactor.as_ref().ok_or(RuntimeError::MissingCapability {
            pid: self.pid(),
            capability: Capability::Reactor,
        })
    }

    /// Waits until there may be something to receive, or `timeout` elapses.
    ///
    /// Returns `true` if the mailbox is non-empty or the wakeup channel
    /// fired. Signals coalesce, so callers should drain with
    /// [`recv`](Self::recv) until it returns `None` before waiting again.
    /// Processes without a wakeup channel poll their mailbox instead.
    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<bool, RuntimeError> {
        self.require(Capability::Messaging)?;
        if !self.process.mailbox().is_empty() {
            return Ok(true);
        }

        let has_wakeup = self.process.wakeup().is_some()
            && self.capabilities().contains(Capability::Wakeup);
        if !has_wakeup {
            return Ok(self.poll_mailbox(timeout));
        }

        if self.capabilities().contains(Capability::Reactor) {
            self.reactor()?;
            if let (Some(reactor), Some(wakeup)) = (&self.reactor, self.process.wakeup()) {
                let readiness = reactor.wait_wakeup(wakeup, timeout)?;
                return Ok(readiness == Readiness::Woken || !self.process.mailbox().is_empty());
            }
        }

        let fired = self.wakeup()?.wait_timeout(timeout)?;
        Ok(fired || !self.process.mailbox().is_empty())
    }

    fn poll_mailbox(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if !self.process.mailbox().is_empty() {
                return true;
            }
            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    MAIN_POLL_INTERVAL.min(deadline - now)
                }
                None => MAIN_POLL_INTERVAL,
            };
            std::thread::sleep(pause);
        }
    }

    /// Allocates a new root-owned state, bound round-robin to a worker.
    pub fn new_state(&self) -> Result<StateInfo, RuntimeError> {
        self.require(Capability::StateAlloc)?;
        Ok(self.runtime.states().create(self.runtime.nthread())?)
    }

    /// Returns the fields of a live state.
    pub fn state_info(&self, id: u32) -> Result<StateInfo, RuntimeError> {
        self.require(Capability::StateInspect)?;
        Ok(self.runtime.states().info(id)?)
    }

    /// Sets the root-owned flag of a live state.
    pub fn set_state_root(&self, id: u32, root_owned: bool) -> Result<(), RuntimeError> {
        self.require(Capability::StateInspect)?;
        Ok(self.runtime.states().set_root_owned(id, root_owned)?)
    }

    /// Rebinds a live state to an existing process.
    pub fn set_state_thread(&self, id: u32, thread_id: ProcessId) -> Result<(), RuntimeError> {
        self.require(Capability::StateInspect)?;
        if !self.runtime.processes().contains(thread_id) {
            return Err(RegistryError::InvalidId(thread_id).into());
        }
        Ok(self.runtime.states().set_thread_id(id, thread_id)?)
    }

    /// Releases a live state.
    pub fn free_state(&self, id: u32) -> Result<(), RuntimeError> {
        self.require(Capability::StateInspect)?;
        Ok(self.runtime.states().release(id)?)
    }

    /// Spawns a process running `source`.
    pub fn fork(&self, source: &ScriptSource) -> Result<ProcessId, RuntimeError> {
        self.require(Capability::Orchestration)?;
        Ok(self.runtime.spawn(source)?)
    }

    /// Waits for every spawned thread other than this one to exit.
    pub fn join_threads(&self) -> Result<Vec<(ProcessId, ExitStatus)>, RuntimeError> {
        self.require(Capability::Orchestration)?;
        Ok(self.runtime.join_from(self.pid()))
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("pid", &self.pid())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
