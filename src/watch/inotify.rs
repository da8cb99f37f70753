// src/watch/inotify.rs

use std::ffi::CString;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::time::Duration;

use crate::errors::Result;
use crate::types::{EventMask, WatchId};
use crate::watch::channel::{NotifyChannel, Readiness};
use crate::watch::multiplex::{ShutdownSignal, wait_ready};

/// Linux inotify instance.
///
/// The descriptor is blocking; reads only happen after [`wait_ready`]
/// reported data. Dropping the channel closes the descriptor, which makes
/// the kernel release every watch registered on it.
#[derive(Debug)]
pub struct InotifyChannel {
    fd: OwnedFd,
    shutdown: Option<ShutdownSignal>,
}

impl InotifyChannel {
    pub fn open() -> io::Result<Self> {
        let raw = unsafe { libc::inotify_init1(libc::IN_CLOEXEC) };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `inotify_init1` just returned this descriptor.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        Ok(Self { fd, shutdown: None })
    }

    /// Let `shutdown` interrupt readiness waits on this channel.
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }
}

impl AsFd for InotifyChannel {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl NotifyChannel for InotifyChannel {
    fn add_watch(&mut self, path: &Path, mask: EventMask) -> io::Result<WatchId> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let wd =
            unsafe { libc::inotify_add_watch(self.fd.as_raw_fd(), c_path.as_ptr(), mask.bits()) };
        if wd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(WatchId::new(wd))
    }

    fn remove_watch(&mut self, id: WatchId) -> io::Result<()> {
        let rc = unsafe { libc::inotify_rm_watch(self.fd.as_raw_fd(), id.as_raw()) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn wait_ready(&mut self, timeout: Option<Duration>) -> Result<Readiness> {
        wait_ready(self.fd.as_fd(), self.shutdown.as_ref(), timeout)
    }

    fn read_events(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let rc = unsafe {
                libc::read(
                    self.fd.as_raw_fd(),
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                )
            };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            return Ok(rc as usize);
        }
    }
}
