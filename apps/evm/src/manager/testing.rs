//! Test doubles for the process seam.

use std::path::PathBuf;
use std::process::Child;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Result;

use super::process::ProcessLocator;

/// Always reports the same PID, or none.
#[derive(Debug)]
pub struct FixedLocator {
    pid: AtomicU32,
}

impl FixedLocator {
    pub fn stopped() -> Self {
        Self {
            pid: AtomicU32::new(0),
        }
    }

    pub fn running(pid: u32) -> Self {
        Self {
            pid: AtomicU32::new(pid),
        }
    }
}

impl ProcessLocator for FixedLocator {
    fn find_running_server_pid(&self) -> Result<Option<u32>> {
        let pid = self.pid.load(Ordering::SeqCst);
        Ok((pid != 0).then_some(pid))
    }
}

/// Tracks a real child process; reports it until it has exited.
#[derive(Debug)]
pub struct ChildLocator {
    child: Mutex<Child>,
}

impl ChildLocator {
    pub fn new(child: Child) -> Self {
        Self {
            child: Mutex::new(child),
        }
    }
}

impl ProcessLocator for ChildLocator {
    fn find_running_server_pid(&self) -> Result<Option<u32>> {
        let mut child = self
            .child
            .lock()
            .map_err(|_| anyhow::anyhow!("child lock poisoned"))?;
        match child.try_wait()? {
            Some(_) => Ok(None),
            None => Ok(Some(child.id())),
        }
    }
}

/// Reports nothing until `marker` exists, then either a tracked child
/// (until it exits) or a fixed PID.
#[derive(Debug)]
pub struct MarkerLocator {
    marker: PathBuf,
    pid: u32,
    child: Mutex<Option<Child>>,
}

impl MarkerLocator {
    pub fn new(marker: PathBuf, pid: u32) -> Self {
        Self {
            marker,
            pid,
            child: Mutex::new(None),
        }
    }

    pub fn with_child(marker: PathBuf, child: Child) -> Self {
        Self {
            marker,
            pid: 0,
            child: Mutex::new(Some(child)),
        }
    }

    pub fn replace_child(&self, child: Child) {
        if let Ok(mut slot) = self.child.lock() {
            *slot = Some(child);
        }
    }
}

impl ProcessLocator for MarkerLocator {
    fn find_running_server_pid(&self) -> Result<Option<u32>> {
        if !self.marker.exists() {
            return Ok(None);
        }
        let mut slot = self
            .child
            .lock()
            .map_err(|_| anyhow::anyhow!("child lock poisoned"))?;
        match slot.as_mut() {
            Some(child) => match child.try_wait()? {
                Some(_) => Ok(None),
                None => Ok(Some(child.id())),
            },
            None => Ok(Some(self.pid)),
        }
    }
}
