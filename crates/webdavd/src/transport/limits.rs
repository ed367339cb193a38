//! Per-client connection caps.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard};

/// Counts open connections per client address.
#[derive(Debug)]
pub(crate) struct ConnectionLimits {
    max_per_ip: u32,
    active: Mutex<HashMap<IpAddr, u32>>,
}

impl ConnectionLimits {
    pub(crate) fn new(max_per_ip: u32) -> Arc<Self> {
        Arc::new(Self {
            max_per_ip,
            active: Mutex::new(HashMap::new()),
        })
    }

    /// Reserves a slot for `ip`, or `None` when it is at its cap.
    pub(crate) fn try_acquire(self: &Arc<Self>, ip: IpAddr) -> Option<ConnectionPermit> {
        let mut active = self.lock();
        let count = active.entry(ip).or_insert(0);
        if *count >= self.max_per_ip {
            return None;
        }
        *count += 1;
        drop(active);
        Some(ConnectionPermit {
            limits: Arc::clone(self),
            ip,
        })
    }

    #[cfg(test)]
    pub(crate) fn active(&self, ip: IpAddr) -> u32 {
        self.lock().get(&ip).copied().unwrap_or(0)
    }

    fn release(&self, ip: IpAddr) {
        let mut active = self.lock();
        if let Some(count) = active.get_mut(&ip) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                active.remove(&ip);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<IpAddr, u32>> {
        self.active
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

/// A held connection slot, released on drop.
#[derive(Debug)]
pub(crate) struct ConnectionPermit {
    limits: Arc<ConnectionLimits>,
    ip: IpAddr,
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        self.limits.release(self.ip);
    }
}
