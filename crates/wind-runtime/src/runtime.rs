//! The wind runtime.
//!
//! The [`Runtime`] owns the process and state registries and is the only
//! way to start process threads. It is created on the thread that will act
//! as the main process (id 0); every later process is spawned onto a
//! dedicated OS thread that runs one interpreter instance to completion.

use crate::capability::CapabilitySet;
use crate::config::RuntimeConfig;
use crate::context::Context;
use crate::error::{ConfigError, LoadError, SendError, SpawnError};
use crate::mailbox::Mailbox;
use crate::process_handle::{ExitStatus, ProcessHandle};
use crate::registry::ProcessRegistry;
use crate::script::{Engine, Script, ScriptSource};
use crate::states::StateRegistry;
use crate::wakeup::WakeupChannel;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;
use wind_core::{Payload, ProcessId, Role};

struct Shared {
    config: RuntimeConfig,
    processes: ProcessRegistry,
    states: StateRegistry,
    engine: Arc<dyn Engine>,
    main: ProcessHandle,
}

/// The wind runtime.
///
/// # Example
///
/// ```ignore
/// let runtime = Runtime::new(RuntimeConfig::default(), MyEngine)?;
/// let root = runtime.spawn(&ScriptSource::path("root.wind"))?;
/// runtime.send(root, Payload::from(b"hello".to_vec()))?;
/// runtime.join_all();
/// ```
pub struct Runtime {
    handle: RuntimeHandle,
}

impl Runtime {
    /// Creates a runtime and registers the calling thread as the main
    /// process.
    pub fn new(config: RuntimeConfig, engine: impl Engine) -> Result<Self, ConfigError> {
        Self::with_engine(config, Arc::new(engine))
    }

    /// Creates a runtime sharing an existing engine.
    pub fn with_engine(
        config: RuntimeConfig,
        engine: Arc<dyn Engine>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let main = ProcessHandle::new(
            ProcessId::MAIN,
            CapabilitySet::MAIN,
            Arc::new(Mailbox::new()),
            None,
        );
        let shared = Arc::new(Shared {
            processes: ProcessRegistry::new(config.max_processes()),
            states: StateRegistry::new(config.max_states, config.state_exhaustion),
            config,
            engine,
            main: main.clone(),
        });
        register_main(&shared.processes, main)?;

        tracing::info!(
            max_processes = shared.config.max_processes(),
            max_states = shared.config.max_states,
            "runtime started"
        );
        Ok(Self {
            handle: RuntimeHandle { shared },
        })
    }

    /// Returns a cloneable handle to the runtime.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Returns a context for the main process.
    pub fn main_context(&self) -> Context {
        self.handle.main_context()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime").field("handle", &self.handle).finish()
    }
}

fn register_main(processes: &ProcessRegistry, main: ProcessHandle) -> Result<(), ConfigError> {
    let reservation = processes
        .reserve()
        .map_err(|_| ConfigError::NoRoomForMain)?;
    reservation.publish(main);
    Ok(())
}

impl std::ops::Deref for Runtime {
    type Target = RuntimeHandle;

    fn deref(&self) -> &RuntimeHandle {
        &self.handle
    }
}

/// A cloneable handle to the runtime.
///
/// Every process context carries one, so any thread can send messages or
/// reach the state registry.
#[derive(Clone)]
pub struct RuntimeHandle {
    shared: Arc<Shared>,
}

impl RuntimeHandle {
    /// Returns the runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.shared.config
    }

    /// Returns the process registry.
    pub fn processes(&self) -> &ProcessRegistry {
        &self.shared.processes
    }

    /// Returns the state registry.
    pub fn states(&self) -> &StateRegistry {
        &self.shared.states
    }

    /// Returns the number of processes created so far, main included.
    pub fn nthread(&self) -> usize {
        self.shared.processes.count()
    }

    pub(crate) fn main_context(&self) -> Context {
        Context::new(self.shared.main.clone(), self.clone())
    }

    /// Moves `payload` into `target`'s mailbox, waking it if its mailbox was
    /// empty.
    pub fn send(&self, target: ProcessId, payload: Payload) -> Result<(), SendError> {
        if payload.is_absent() {
            return Err(SendError::NullPayload);
        }
        let process = self
            .shared
            .processes
            .get(target)
            .ok_or(SendError::UnknownProcess(target))?;
        process.deliver(payload)
    }

    /// Loads `source` and starts it on a new thread with the capabilities of
    /// the role its id implies.
    pub fn spawn(&self, source: &ScriptSource) -> Result<ProcessId, SpawnError> {
        self.spawn_inner(|| self.shared.engine.load(source), None)
    }

    /// Loads `source` and starts it on a new thread with `capabilities`.
    pub fn spawn_with(
        &self,
        source: &ScriptSource,
        capabilities: CapabilitySet,
    ) -> Result<ProcessId, SpawnError> {
        self.spawn_inner(|| self.shared.engine.load(source), Some(capabilities))
    }

    /// Starts an already loaded interpreter instance on a new thread.
    pub fn spawn_script(
        &self,
        script: impl Script,
        capabilities: CapabilitySet,
    ) -> Result<ProcessId, SpawnError> {
        self.spawn_inner(|| Ok(Box::new(script) as Box<dyn Script>), Some(capabilities))
    }

    fn spawn_inner(
        &self,
        load: impl FnOnce() -> Result<Box<dyn Script>, LoadError>,
        capabilities: Option<CapabilitySet>,
    ) -> Result<ProcessId, SpawnError> {
        let reservation = self.shared.processes.reserve()?;
        let pid = reservation.pid();
        let capabilities = capabilities.unwrap_or(match pid.role() {
            Role::Main => CapabilitySet::MAIN,
            Role::Root => CapabilitySet::ROOT,
            Role::Worker => CapabilitySet::WORKER,
        });

        let script = load()?;
        let wakeup = WakeupChannel::new().map_err(SpawnError::Wakeup)?;
        let process = ProcessHandle::new(
            pid,
            capabilities,
            Arc::new(Mailbox::new()),
            Some(Arc::new(wakeup)),
        );

        let (start_tx, start_rx) = oneshot::channel();
        let ctx = Context::new(process.clone(), self.clone());
        let name = format!("{}-{}", self.shared.config.thread_name_prefix, pid.get());
        let mut builder = thread::Builder::new().name(name);
        if let Some(size) = self.shared.config.thread_stack_size {
            builder = builder.stack_size(size);
        }
        let thread = builder
            .spawn(move || run_process(script, ctx, start_rx))
            .map_err(SpawnError::Thread)?;

        process.set_thread(thread);
        reservation.publish(process);
        let _ = start_tx.send(());

        tracing::debug!(%pid, ?capabilities, "spawned process");
        Ok(pid)
    }

    /// Waits for every spawned thread to exit, in ascending id order, then
    /// releases the main mailbox.
    ///
    /// A thread that failed is reported but does not stop the join. Threads
    /// spawned while joining are joined too, including one whose spawn was
    /// still in flight when the last known thread exited. Calling it again
    /// is harmless.
    pub fn join_all(&self) -> Vec<(ProcessId, ExitStatus)> {
        self.join_from(ProcessId::MAIN)
    }

    pub(crate) fn join_from(&self, caller: ProcessId) -> Vec<(ProcessId, ExitStatus)> {
        let mut statuses = Vec::new();
        let mut next = ProcessId::ROOT.get();
        loop {
            while (next as usize) < self.nthread() {
                let pid = ProcessId::new(next);
                next += 1;
                if pid == caller {
                    continue;
                }
                if let Some(status) = self.join_one(pid) {
                    statuses.push((pid, status));
                }
            }
            // Waits out a spawn that holds a reservation but has not
            // published yet.
            if self.shared.processes.settled_count() <= next as usize {
                break;
            }
        }

        self.shared.main.mailbox().drain_and_close();
        tracing::info!(joined = statuses.len(), "joined threads");
        statuses
    }

    fn join_one(&self, pid: ProcessId) -> Option<ExitStatus> {
        let thread = self.shared.processes.get(pid)?.take_thread()?;
        let status = thread
            .join()
            .unwrap_or_else(|panic| ExitStatus::Panicked(panic_message(panic.as_ref())));
        if status.is_abnormal() {
            tracing::warn!(%pid, ?status, "joined abnormally terminated thread");
        }
        Some(status)
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("processes", &self.shared.processes)
            .field("live_states", &self.shared.states.len())
            .finish()
    }
}

/// Releases a process's resources when its thread leaves `run_process`,
/// however it leaves.
struct ProcessExit {
    process: ProcessHandle,
    interpreter: Option<Box<dyn Script>>,
}

impl Drop for ProcessExit {
    fn drop(&mut self) {
        if let Some(wakeup) = self.process.wakeup() {
            wakeup.close();
        }
        drop(self.interpreter.take());
        let dropped = self.process.mailbox().drain_and_close();
        if dropped > 0 {
            tracing::warn!(pid = %self.process.pid(), dropped, "discarded undelivered messages");
        }
        tracing::debug!(pid = %self.process.pid(), "process exited");
    }
}

fn run_process(
    script: Box<dyn Script>,
    mut ctx: Context,
    start: oneshot::Receiver<()>,
) -> ExitStatus {
    let pid = ctx.pid();
    let mut exit = ProcessExit {
        process: ctx.process().clone(),
        interpreter: Some(script),
    };
    if start.blocking_recv().is_err() {
        return ExitStatus::Failed("process was never published".to_string());
    }
    let Some(script) = exit.interpreter.as_mut() else {
        return ExitStatus::Normal;
    };

    script.bind(ctx.capabilities());
    match panic::catch_unwind(AssertUnwindSafe(|| script.run(&mut ctx))) {
        Ok(Ok(())) => ExitStatus::Normal,
        Ok(Err(err)) => {
            tracing::error!(%pid, error = %err, "thread[{}] error", pid.get());
            ExitStatus::Failed(err.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(%pid, panic = %message, "thread[{}] panicked", pid.get());
            ExitStatus::Panicked(message)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
