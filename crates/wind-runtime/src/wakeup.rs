//! Cross-thread wakeup channel.
//!
//! A [`WakeupChannel`] is a waitable descriptor that carries a single "there
//! is new work" edge. On Linux it is a non-blocking `eventfd`; on other unix
//! platforms it is a non-blocking pipe. Signals coalesce: any number of
//! `signal` calls before the owner consumes them wake it once, so the owner
//! must always re-check its mailbox after waking.

use parking_lot::RwLock;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

#[derive(Debug)]
struct Fds {
    /// The descriptor that becomes readable when signalled.
    read: OwnedFd,
    /// Write end for pipes; `eventfd` uses `read` for both directions.
    write: Option<OwnedFd>,
}

impl Fds {
    #[cfg(target_os = "linux")]
    fn open() -> io::Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            read: unsafe { OwnedFd::from_raw_fd(fd) },
            write: None,
        })
    }

    #[cfg(not(target_os = "linux"))]
    fn open() -> io::Result<Self> {
        let mut fds = [0 as libc::c_int; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
            return Err(io::Error::last_os_error());
        }
        let (read, write) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
        for fd in [read.as_raw_fd(), write.as_raw_fd()] {
            unsafe {
                let flags = libc::fcntl(fd, libc::F_GETFL);
                if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
                    return Err(io::Error::last_os_error());
                }
                if libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) < 0 {
                    return Err(io::Error::last_os_error());
                }
            }
        }
        Ok(Self {
            read,
            write: Some(write),
        })
    }

    fn write_fd(&self) -> RawFd {
        self.write.as_ref().unwrap_or(&self.read).as_raw_fd()
    }
}

/// Edge-triggered, coalescing wakeup signal owned by one process.
#[derive(Debug)]
pub struct WakeupChannel {
    fds: RwLock<Option<Fds>>,
    raw: RawFd,
}

impl WakeupChannel {
    /// Opens a new channel.
    pub fn new() -> io::Result<Self> {
        let fds = Fds::open()?;
        let raw = fds.read.as_raw_fd();
        Ok(Self {
            fds: RwLock::new(Some(fds)),
            raw,
        })
    }

    /// Marks the channel readable, waking the owner if it is waiting.
    ///
    /// Signalling an already-signalled channel is a no-op, and so is
    /// signalling a closed one.
    pub fn signal(&self) -> io::Result<()> {
        let fds = self.fds.read();
        let Some(fds) = fds.as_ref() else {
            return Ok(());
        };

        #[cfg(target_os = "linux")]
        let buf = 1u64.to_ne_bytes();
        #[cfg(not(target_os = "linux"))]
        let buf = [1u8];

        loop {
            let n = unsafe { libc::write(fds.write_fd(), buf.as_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                // Counter saturated or pipe full: a wakeup is already pending.
                io::ErrorKind::WouldBlock => return Ok(()),
                _ => return Err(err),
            }
        }
    }

    /// Blocks until the channel is signalled or `timeout` elapses.
    ///
    /// `None` waits forever. Returns `true` if the channel fired, in which
    /// case the pending signal has been consumed. A closed channel returns
    /// `false` immediately.
    pub fn wait_timeout(&self, timeout: Option<Duration>) -> io::Result<bool> {
        let fds = self.fds.read();
        let Some(fds) = fds.as_ref() else {
            return Ok(false);
        };

        let millis = match timeout {
            None => -1,
            Some(d) => {
                let millis = d.as_nanos().div_ceil(1_000_000);
                millis.min(libc::c_int::MAX as u128) as libc::c_int
            }
        };
        let mut pollfd = libc::pollfd {
            fd: fds.read.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        loop {
            let n = unsafe { libc::poll(&mut pollfd, 1, millis) };
            if n > 0 {
                break;
            }
            if n == 0 {
                return Ok(false);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
        drain(fds.read.as_raw_fd())?;
        Ok(true)
    }

    /// Clears any pending signal without waiting.
    ///
    /// Returns `true` if a signal was pending.
    pub fn consume(&self) -> io::Result<bool> {
        match self.fds.read().as_ref() {
            Some(fds) => drain(fds.read.as_raw_fd()),
            None => Ok(false),
        }
    }

    /// Closes the descriptor. Later signals are ignored.
    pub fn close(&self) {
        self.fds.write().take();
    }

    /// Returns `true` once the channel was closed.
    pub fn is_closed(&self) -> bool {
        self.fds.read().is_none()
    }
}

impl AsRawFd for WakeupChannel {
    /// The waitable descriptor. It stays valid until [`WakeupChannel::close`].
    fn as_raw_fd(&self) -> RawFd {
        self.raw
    }
}

impl AsFd for WakeupChannel {
    /// Borrows the waitable descriptor. Must not be used after
    /// [`WakeupChannel::close`].
    fn as_fd(&self) -> BorrowedFd<'_> {
        // SAFETY: `raw` is the read end owned by `fds`, which stays open
        // until the owning process calls `close` at thread exit.
        unsafe { BorrowedFd::borrow_raw(self.raw) }
    }
}

fn drain(fd: RawFd) -> io::Result<bool> {
    let mut buf = [0u8; 64];
    let mut fired = false;
    loop {
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n > 0 {
            fired = true;
            // An eventfd read resets the counter in one go.
            if cfg!(target_os = "linux") {
                return Ok(true);
            }
            continue;
        }
        if n == 0 {
            return Ok(fired);
        }
        let err = io::Error::last_os_error();
        match err.kind() {
            io::ErrorKind::Interrupted => continue,
            io::ErrorKind::WouldBlock => return Ok(fired),
            _ => return Err(err),
        }
    }
}
