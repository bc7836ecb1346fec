//! Runtime configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default number of worker processes the table can hold.
pub const DEFAULT_MAX_WORKERS: usize = 128;

/// Default number of state slots.
pub const DEFAULT_MAX_STATES: usize = 1024;

/// Largest accepted worker or state capacity.
const MAX_CAPACITY: usize = u32::MAX as usize - 2;

/// What happens when the state table has no free slot left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExhaustionPolicy {
    /// Report [`StateError::Exhausted`](crate::StateError::Exhausted) to the caller.
    #[default]
    Error,

    /// Log the condition and terminate the whole process with exit code 1.
    Abort,
}

/// Capacities and thread settings of a [`Runtime`](crate::Runtime).
///
/// # Examples
///
/// ```
/// use wind_runtime::{ExhaustionPolicy, RuntimeConfig};
///
/// let config = RuntimeConfig::default()
///     .with_max_workers(4)
///     .with_max_states(16)
///     .with_state_exhaustion(ExhaustionPolicy::Abort);
///
/// assert_eq!(config.max_processes(), 6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Maximum number of worker processes (ids 2 and above).
    pub max_workers: usize,

    /// Number of state slots.
    pub max_states: usize,

    /// Behaviour when the state table is full.
    pub state_exhaustion: ExhaustionPolicy,

    /// Prefix of spawned thread names; the process id is appended.
    pub thread_name_prefix: String,

    /// Stack size of spawned threads, or the platform default.
    pub thread_stack_size: Option<usize>,
}

impl RuntimeConfig {
    /// Sets the worker capacity.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Sets the number of state slots.
    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = max_states;
        self
    }

    /// Sets the state exhaustion policy.
    pub fn with_state_exhaustion(mut self, policy: ExhaustionPolicy) -> Self {
        self.state_exhaustion = policy;
        self
    }

    /// Sets the thread name prefix.
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets the stack size of spawned threads.
    pub fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = Some(size);
        self
    }

    /// Total process table capacity: main, root and the workers.
    pub fn max_processes(&self) -> usize {
        self.max_workers + 2
    }

    /// Checks that the capacities are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.max_workers > MAX_CAPACITY {
            return Err(ConfigError::TooManyWorkers(self.max_workers));
        }
        if self.max_states == 0 {
            return Err(ConfigError::NoStates);
        }
        if self.max_states > MAX_CAPACITY {
            return Err(ConfigError::TooManyStates(self.max_states));
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            max_states: DEFAULT_MAX_STATES,
            state_exhaustion: ExhaustionPolicy::default(),
            thread_name_prefix: "wind".to_string(),
            thread_stack_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_processes(), 130);
        assert_eq!(config.max_states, 1024);
        assert_eq!(config.state_exhaustion, ExhaustionPolicy::Error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_tables() {
        assert_eq!(
            RuntimeConfig::default().with_max_workers(0).validate(),
            Err(ConfigError::NoWorkers)
        );
        assert_eq!(
            RuntimeConfig::default().with_max_states(0).validate(),
            Err(ConfigError::NoStates)
        );
    }

    #[test]
    fn test_builder() {
        let config = RuntimeConfig::default()
            .with_thread_name_prefix("svc")
            .with_thread_stack_size(1 << 20);
        assert_eq!(config.thread_name_prefix, "svc");
        assert_eq!(config.thread_stack_size, Some(1 << 20));
    }
}
