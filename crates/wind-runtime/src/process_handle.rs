//! Process handle for interacting with a registered process.
//!
//! A [`ProcessHandle`] bundles what other threads need to reach a process:
//! its id, its mailbox and its wakeup channel. The interpreter instance
//! itself never leaves the owning thread.

use crate::capability::CapabilitySet;
use crate::error::SendError;
use crate::mailbox::Mailbox;
use crate::wakeup::WakeupChannel;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use wind_core::{Payload, ProcessId};

/// How a process thread ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    /// The script ran to completion.
    Normal,
    /// The script raised an uncaught error.
    Failed(String),
    /// The thread panicked.
    Panicked(String),
}

impl ExitStatus {
    /// Returns `true` for anything but [`ExitStatus::Normal`].
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, ExitStatus::Normal)
    }
}

struct Inner {
    pid: ProcessId,
    capabilities: CapabilitySet,
    mailbox: Arc<Mailbox>,
    wakeup: Option<Arc<WakeupChannel>>,
    thread: Mutex<Option<JoinHandle<ExitStatus>>>,
}

/// A cloneable handle to a registered process.
#[derive(Clone)]
pub struct ProcessHandle {
    inner: Arc<Inner>,
}

impl ProcessHandle {
    pub(crate) fn new(
        pid: ProcessId,
        capabilities: CapabilitySet,
        mailbox: Arc<Mailbox>,
        wakeup: Option<Arc<WakeupChannel>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                pid,
                capabilities,
                mailbox,
                wakeup,
                thread: Mutex::new(None),
            }),
        }
    }

    /// Returns the process identifier.
    pub fn pid(&self) -> ProcessId {
        self.inner.pid
    }

    /// Returns the capabilities the process was started with.
    pub fn capabilities(&self) -> CapabilitySet {
        self.inner.capabilities
    }

    /// Returns the process's mailbox.
    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.inner.mailbox
    }

    /// Returns the wakeup channel; `None` for the main process.
    pub fn wakeup(&self) -> Option<&Arc<WakeupChannel>> {
        self.inner.wakeup.as_ref()
    }

    /// Pushes a payload into the mailbox and signals the wakeup channel when
    /// the mailbox went from empty to non-empty.
    pub fn deliver(&self, payload: Payload) -> Result<(), SendError> {
        match self.inner.mailbox.push(payload) {
            Err(_) => Err(SendError::Closed(self.inner.pid)),
            Ok(false) => Ok(()),
            Ok(true) => {
                let signalled = match &self.inner.wakeup {
                    Some(wakeup) => wakeup.signal(),
                    None => Ok(()),
                };
                if let Err(e) = signalled {
                    tracing::warn!(
                        pid = %self.inner.pid,
                        error = %e,
                        "failed to signal wakeup channel"
                    );
                }
                Ok(())
            }
        }
    }

    pub(crate) fn set_thread(&self, handle: JoinHandle<ExitStatus>) {
        *self.inner.thread.lock() = Some(handle);
    }

    /// Takes the join handle, leaving `None` so a thread is joined once.
    pub(crate) fn take_thread(&self) -> Option<JoinHandle<ExitStatus>> {
        self.inner.thread.lock().take()
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.inner.pid)
            .field("queued", &self.inner.mailbox.len())
            .finish()
    }
}
