//! Per-project run leases
//!
//! Cron cycles and webhook triggers share one pipeline, so two runs could
//! otherwise race on the same custodial wallet and double-spend its
//! balance. A lease keyed by token mint guarantees at most one in-flight
//! run per project. Leases carry a TTL so one leaked by an aborted task
//! cannot wedge a project forever. In-process state is enough because the
//! service runs as a single instance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct LeaseEntry {
    taken_at: Instant,
    id: u64,
}

pub struct ProjectLocks {
    leases: Mutex<HashMap<String, LeaseEntry>>,
    next_id: AtomicU64,
    ttl: Duration,
}

impl ProjectLocks {
    pub fn new(ttl: Duration) -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            ttl,
        }
    }

    /// Take the lease for `token_mint`, or `None` if a live run holds it.
    pub fn try_acquire(self: &Arc<Self>, token_mint: &str) -> Option<ProjectLease> {
        let mut leases = self.leases.lock().unwrap();
        if let Some(entry) = leases.get(token_mint) {
            if entry.taken_at.elapsed() < self.ttl {
                return None;
            }
            log::warn!(
                "Reclaiming expired lease for {} (held {}s)",
                token_mint,
                entry.taken_at.elapsed().as_secs()
            );
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        leases.insert(
            token_mint.to_string(),
            LeaseEntry {
                taken_at: Instant::now(),
                id,
            },
        );
        Some(ProjectLease {
            locks: Arc::clone(self),
            token_mint: token_mint.to_string(),
            id,
        })
    }
}

/// Held for the duration of one pipeline run; released on drop. A stale
/// lease whose slot was reclaimed after TTL expiry does not release the
/// new holder.
pub struct ProjectLease {
    locks: Arc<ProjectLocks>,
    token_mint: String,
    id: u64,
}

impl Drop for ProjectLease {
    fn drop(&mut self) {
        let mut leases = self.locks.leases.lock().unwrap();
        if leases.get(&self.token_mint).is_some_and(|e| e.id == self.id) {
            leases.remove(&self.token_mint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_is_exclusive_per_mint() {
        let locks = Arc::new(ProjectLocks::new(Duration::from_secs(60)));
        let lease = locks.try_acquire("mint-a");
        assert!(lease.is_some());
        assert!(locks.try_acquire("mint-a").is_none());
        // A different project is unaffected
        assert!(locks.try_acquire("mint-b").is_some());
    }

    #[test]
    fn dropping_the_lease_releases_it() {
        let locks = Arc::new(ProjectLocks::new(Duration::from_secs(60)));
        drop(locks.try_acquire("mint-a").unwrap());
        assert!(locks.try_acquire("mint-a").is_some());
    }

    #[test]
    fn expired_leases_are_reclaimed() {
        let locks = Arc::new(ProjectLocks::new(Duration::from_millis(10)));
        let stale = locks.try_acquire("mint-a").unwrap();
        std::thread::sleep(Duration::from_millis(30));
        let fresh = locks.try_acquire("mint-a");
        assert!(fresh.is_some());
        // The stale lease going away must not release the reclaimed slot
        drop(stale);
        assert!(locks.try_acquire("mint-a").is_none());
        drop(fresh);
    }
}
