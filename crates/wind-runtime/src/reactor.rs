//! Reactor adapter.
//!
//! A process that must wait on its wakeup channel together with sockets and
//! timers registers the wakeup descriptor with a tokio I/O driver. The
//! [`Reactor`] is a current-thread tokio runtime owned by one process; its
//! [`wait_wakeup`](Reactor::wait_wakeup) returns when the channel fires or a
//! deadline passes, and [`block_on`](Reactor::block_on) drives any other
//! tokio I/O on the same thread.

use crate::wakeup::WakeupChannel;
use std::future::Future;
use std::io;
use std::os::fd::AsFd;
use std::time::Duration;
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

/// Outcome of waiting on a wakeup channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The channel fired; the pending signal has been consumed.
    Woken,
    /// The deadline passed first.
    TimedOut,
}

/// A per-process tokio reactor.
pub struct Reactor {
    runtime: tokio::runtime::Runtime,
}

impl Reactor {
    /// Builds a current-thread runtime with I/O and timers enabled.
    pub fn new() -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    /// Runs a future to completion on this reactor.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Blocks until `wakeup` fires or `timeout` elapses.
    pub fn wait_wakeup(
        &self,
        wakeup: &WakeupChannel,
        timeout: Option<Duration>,
    ) -> io::Result<Readiness> {
        self.block_on(wakeup_readable(wakeup, timeout))
    }
}

impl std::fmt::Debug for Reactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor").finish_non_exhaustive()
    }
}

/// Waits for `wakeup` to become readable inside a tokio runtime.
///
/// Can be combined with other futures (`tokio::select!`) to wait on
/// messages and socket or timer readiness at once.
pub async fn wakeup_readable(
    wakeup: &WakeupChannel,
    timeout: Option<Duration>,
) -> io::Result<Readiness> {
    if wakeup.is_closed() {
        return Err(io::Error::new(io::ErrorKind::BrokenPipe, "wakeup channel is closed"));
    }
    if wakeup.consume()? {
        return Ok(Readiness::Woken);
    }
    #[allow(deprecated)]
    let fd = AsyncFd::with_interest(wakeup.as_fd(), Interest::READABLE)?;
    let woken = async {
        loop {
            let mut guard = fd.readable().await?;
            if wakeup.consume()? {
                return Ok::<_, io::Error>(());
            }
            guard.clear_ready();
        }
    };
    match timeout {
        None => woken.await.map(|()| Readiness::Woken),
        Some(limit) => match tokio::time::timeout(limit, woken).await {
            Ok(result) => result.map(|()| Readiness::Woken),
            Err(_) => Ok(Readiness::TimedOut),
        },
    }
}
