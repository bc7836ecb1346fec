//! Interpreter instances.

use crate::parse::{Command, Target};
use std::path::Path;
use std::time::{Duration, Instant};
use wind_core::ProcessId;
use wind_runtime::{
    Capability, CapabilitySet, Context, Engine, LoadError, Script, ScriptError, ScriptSource,
};

/// Loads wind scripts into fresh [`Program`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptEngine;

impl ScriptEngine {
    /// Creates an engine.
    pub fn new() -> Self {
        Self
    }
}

impl Engine for ScriptEngine {
    fn load(&self, source: &ScriptSource) -> Result<Box<dyn Script>, LoadError> {
        Ok(Box::new(Program::load(source)?))
    }
}

/// A parsed script plus the bindings installed for the process running it.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    commands: Vec<Command>,
    bindings: CapabilitySet,
}

impl Program {
    /// Reads and parses `source`. Relative `spawn` paths in a script file
    /// are resolved against that file's directory.
    pub fn load(source: &ScriptSource) -> Result<Self, LoadError> {
        let name = source.name();
        let text = source.read()?;
        let mut commands = crate::parse::parse(&text).map_err(|err| LoadError::Parse {
            script: name.clone(),
            line: err.line,
            message: err.message,
        })?;
        if let Some(base) = source.base_dir() {
            resolve_spawn_paths(&mut commands, base);
        }
        tracing::trace!(script = %name, commands = commands.len(), "loaded script");
        Ok(Self {
            name,
            commands,
            bindings: CapabilitySet::empty(),
        })
    }

    /// The script's diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parsed commands.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn bound(&self, capability: Capability, command: &str) -> Result<(), ScriptError> {
        if self.bindings.contains(capability) {
            Ok(())
        } else {
            Err(ScriptError::raised(format!(
                "{}: `{command}` is not available in this process",
                self.name
            )))
        }
    }

    fn execute(&self, ctx: &mut Context, command: &Command) -> Result<(), ScriptError> {
        let pid = ctx.pid();
        match command {
            Command::Log(text) => {
                tracing::info!(%pid, script = %self.name, "{text}");
            }
            Command::Spawn(path) => {
                self.bound(Capability::Orchestration, "spawn")?;
                let child = ctx.fork(&ScriptSource::path(path))?;
                tracing::debug!(%pid, %child, path = %path.display(), "spawned");
            }
            Command::Join => {
                self.bound(Capability::Orchestration, "join")?;
                ctx.join_threads()?;
            }
            Command::Send { target, text } => {
                self.bound(Capability::Serialization, "send")?;
                for to in resolve(ctx, *target)? {
                    ctx.send_term(to, text)?;
                }
            }
            Command::Recv { count, timeout } => {
                self.bound(Capability::Serialization, "recv")?;
                for _ in 0..*count {
                    let message = receive(ctx, *timeout)?;
                    tracing::info!(%pid, %message, "received");
                }
            }
            Command::Echo {
                target,
                count,
                timeout,
            } => {
                self.bound(Capability::Serialization, "echo")?;
                for _ in 0..*count {
                    let message = receive(ctx, *timeout)?;
                    for to in resolve(ctx, *target)? {
                        ctx.send_term(to, &message)?;
                    }
                }
            }
            Command::StateNew => {
                self.bound(Capability::StateAlloc, "state new")?;
                let state = ctx.new_state()?;
                tracing::info!(%pid, state = %state.id, worker = %state.thread_id, "created state");
            }
            Command::StateFree(id) => {
                self.bound(Capability::StateInspect, "state free")?;
                ctx.free_state(*id)?;
                tracing::debug!(%pid, state = *id, "freed state");
            }
            Command::AssertNthread(expected) => {
                let actual = ctx.nthread()?;
                if actual != *expected {
                    return Err(ScriptError::raised(format!(
                        "{}: expected {expected} threads, found {actual}",
                        self.name
                    )));
                }
            }
            Command::Sleep(duration) => std::thread::sleep(*duration),
            Command::Fail(text) => {
                return Err(ScriptError::raised(format!("{}: {text}", self.name)));
            }
        }
        Ok(())
    }
}

impl Script for Program {
    fn bind(&mut self, capabilities: CapabilitySet) {
        self.bindings = capabilities;
    }

    fn run(&mut self, ctx: &mut Context) -> Result<(), ScriptError> {
        for command in &self.commands {
            self.execute(ctx, command)?;
        }
        Ok(())
    }
}

fn resolve_spawn_paths(commands: &mut [Command], base: &Path) {
    for command in commands {
        if let Command::Spawn(path) = command {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

fn resolve(ctx: &Context, target: Target) -> Result<Vec<ProcessId>, ScriptError> {
    Ok(match target {
        Target::Pid(pid) => vec![pid],
        Target::Current => vec![ctx.pid()],
        Target::Root => vec![ProcessId::ROOT],
        Target::Workers => {
            let count = ctx.nthread()? as u32;
            (ProcessId::FIRST_WORKER.get()..count).map(ProcessId::new).collect()
        }
    })
}

fn receive(ctx: &mut Context, timeout: Duration) -> Result<String, ScriptError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(message) = ctx.recv_term::<String>()? {
            return Ok(message);
        }
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() || !ctx.wait(Some(left))? {
            return Err(ScriptError::raised(format!(
                "process {} timed out after {timeout:?} waiting for a message",
                ctx.pid()
            )));
        }
    }
}
