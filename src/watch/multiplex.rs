// src/watch/multiplex.rs

//! Readiness waiting on the notification descriptor.
//!
//! The wait is a plain `poll(2)` on the calling thread. A second descriptor,
//! owned by [`ShutdownSignal`], is polled alongside so another thread (the
//! signal listener) can wake the loop without racing a blocked read.

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::errors::{Result, WatchcmdError};
use crate::watch::channel::Readiness;

/// Clonable shutdown request shared between the signal listener and the
/// watch loop.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug)]
struct ShutdownInner {
    fd: OwnedFd,
    requested: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> io::Result<Self> {
        let raw = unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `eventfd` just returned this descriptor; nothing else owns it.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        Ok(Self {
            inner: Arc::new(ShutdownInner {
                fd,
                requested: AtomicBool::new(false),
            }),
        })
    }

    /// Request shutdown and wake any thread blocked in [`wait_ready`].
    ///
    /// Idempotent.
    pub fn trigger(&self) {
        if self.inner.requested.swap(true, Ordering::SeqCst) {
            return;
        }
        let one: u64 = 1;
        let rc = unsafe {
            libc::write(
                self.inner.fd.as_raw_fd(),
                &one as *const u64 as *const libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if rc < 0 {
            // The flag is already set; the next EINTR or timeout still sees it.
            warn!(error = %io::Error::last_os_error(), "failed to wake watcher for shutdown");
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }
}

impl AsFd for ShutdownSignal {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.inner.fd.as_fd()
    }
}

/// Block until `fd` is readable, `timeout` elapses, or `shutdown` fires.
///
/// `EINTR` is retried with whatever is left of the timeout, unless the
/// shutdown flag was set in the meantime. Any other failure of `poll`, or
/// an error condition reported on `fd` itself, is a
/// [`WatchcmdError::Multiplex`].
pub fn wait_ready(
    fd: BorrowedFd<'_>,
    shutdown: Option<&ShutdownSignal>,
    timeout: Option<Duration>,
) -> Result<Readiness> {
    let deadline = timeout.map(|t| Instant::now() + t);

    loop {
        if shutdown.is_some_and(ShutdownSignal::is_triggered) {
            return Ok(Readiness::Shutdown);
        }

        let mut fds = [
            libc::pollfd {
                fd: fd.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                // poll(2) skips negative descriptors.
                fd: shutdown.map_or(-1, |s| s.as_fd().as_raw_fd()),
                events: libc::POLLIN,
                revents: 0,
            },
        ];

        let timeout_ms = remaining_millis(deadline);
        trace!(timeout_ms, "waiting for readiness");

        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };

        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                debug!("readiness wait interrupted; retrying");
                continue;
            }
            return Err(WatchcmdError::Multiplex(err));
        }

        if rc == 0 {
            return Ok(Readiness::TimedOut);
        }

        if fds[1].revents & libc::POLLIN != 0 {
            return Ok(Readiness::Shutdown);
        }

        let revents = fds[0].revents;
        if revents & libc::POLLNVAL != 0 {
            return Err(WatchcmdError::Multiplex(io::Error::from_raw_os_error(
                libc::EBADF,
            )));
        }
        if revents & libc::POLLIN != 0 {
            return Ok(Readiness::Ready);
        }
        if revents & (libc::POLLERR | libc::POLLHUP) != 0 {
            return Err(WatchcmdError::Multiplex(io::Error::other(
                "notification descriptor reported an error condition",
            )));
        }
    }
}

fn remaining_millis(deadline: Option<Instant>) -> libc::c_int {
    match deadline {
        None => -1,
        Some(deadline) => {
            let left = deadline.saturating_duration_since(Instant::now());
            let millis = left.as_nanos().div_ceil(1_000_000);
            millis.min(libc::c_int::MAX as u128) as libc::c_int
        }
    }
}
