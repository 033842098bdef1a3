use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::time::Instant;
use wavez_core::definitions::TransmitStatus;
use wavez_core::util::maybe_sleep_until;

pub const DEFAULT_LEASE: Duration = Duration::from_secs(90);

/// A bounded pool of the 1..=255 correlation ids the host may attach to
/// SEND_DATA and friends. Each lease carries a future that resolves with the
/// controller's completion report; leases not released in time are reclaimed
/// so a lost callback cannot drain the pool.
pub struct FuncIdPool {
    inner: Mutex<PoolInner>,
    released: Notify,
}

struct PoolInner {
    available: VecDeque<u8>,
    leases: HashMap<u8, LeaseEntry>,
    by_expiry: BTreeMap<(Instant, u8), ()>,
    /// Distinguishes a reclaimed-and-released id from its stale lease
    next_generation: u64,
}

struct LeaseEntry {
    generation: u64,
    expires: Instant,
    completion: Option<oneshot::Sender<TransmitStatus>>,
}

/// An id leased from the pool. Dropping the lease returns the id.
pub struct FuncIdLease {
    value: u8,
    generation: u64,
    pool: Arc<FuncIdPool>,
    completion: oneshot::Receiver<TransmitStatus>,
}

impl FuncIdPool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                available: (1..=u8::MAX).collect(),
                leases: HashMap::new(),
                by_expiry: BTreeMap::new(),
                next_generation: 0,
            }),
            released: Notify::new(),
        }
    }

    /// Leases the next free id. When all 255 ids are out, first reclaims
    /// expired leases, then waits for a release or the next expiry.
    pub async fn acquire(self: &Arc<Self>, timeout: Duration) -> FuncIdLease {
        loop {
            let next_expiry = {
                let now = Instant::now();
                let mut inner = self.inner.lock().expect("pool lock poisoned");
                inner.reclaim_expired(now);

                if let Some(id) = inner.available.pop_front() {
                    let (tx, rx) = oneshot::channel();
                    let expires = now + timeout;
                    let generation = inner.next_generation;
                    inner.next_generation += 1;
                    inner.leases.insert(
                        id,
                        LeaseEntry {
                            generation,
                            expires,
                            completion: Some(tx),
                        },
                    );
                    inner.by_expiry.insert((expires, id), ());
                    return FuncIdLease {
                        value: id,
                        generation,
                        pool: self.clone(),
                        completion: rx,
                    };
                }
                inner.next_expiry()
            };

            tokio::select! {
                _ = self.released.notified() => {}
                _ = maybe_sleep_until(next_expiry) => {}
            }
        }
    }

    /// Delivers a completion report to the lease currently holding `id`.
    /// Duplicate or stale reports return false.
    pub fn set_result(&self, id: u8, status: TransmitStatus) -> bool {
        let mut inner = self.inner.lock().expect("pool lock poisoned");
        match inner.leases.get_mut(&id).and_then(|l| l.completion.take()) {
            Some(tx) => tx.send(status).is_ok(),
            None => false,
        }
    }

    fn release(&self, id: u8, generation: u64) {
        let mut inner = self.inner.lock().expect("pool lock poisoned");
        // A stale lease whose id was reclaimed must not free the new holder
        if inner.leases.get(&id).is_none_or(|l| l.generation != generation) {
            return;
        }
        let entry = inner.leases.remove(&id).expect("lease checked above");
        inner.by_expiry.remove(&(entry.expires, id));
        inner.available.push_back(id);
        self.released.notify_one();
    }
}

impl Default for FuncIdPool {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolInner {
    fn reclaim_expired(&mut self, now: Instant) {
        loop {
            let (expires, id) = match self.by_expiry.first_key_value() {
                Some((&key, _)) => key,
                None => break,
            };
            if expires > now {
                break;
            }
            self.by_expiry.remove(&(expires, id));
            self.leases.remove(&id);
            self.available.push_back(id);
        }
    }

    fn next_expiry(&self) -> Option<Instant> {
        self.by_expiry.first_key_value().map(|((e, _), _)| *e)
    }
}

impl FuncIdLease {
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Waits for the controller's completion report. Returns `None` if the
    /// report never arrives (e.g. the pool reclaimed the id).
    pub async fn completion(&mut self) -> Option<TransmitStatus> {
        (&mut self.completion).await.ok()
    }
}

impl Drop for FuncIdLease {
    fn drop(&mut self) {
        self.pool.release(self.value, self.generation);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_no_two_live_leases_share_an_id() {
        let pool = Arc::new(FuncIdPool::new());
        let mut seen = std::collections::HashSet::new();
        let mut leases = Vec::new();
        for _ in 0..255 {
            let lease = pool.acquire(DEFAULT_LEASE).await;
            assert!(seen.insert(lease.value()), "duplicate id {}", lease.value());
            leases.push(lease);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_unblocks_waiter() {
        let pool = Arc::new(FuncIdPool::new());
        let mut leases = Vec::new();
        for _ in 0..255 {
            leases.push(pool.acquire(DEFAULT_LEASE).await);
        }

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire(DEFAULT_LEASE).await.value() })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        let released = leases.pop().unwrap().value();
        drop(leases.pop());
        let reacquired = waiter.await.unwrap();
        // One of the two released ids ends up with the waiter
        let _ = released;
        assert!(pool.inner.lock().unwrap().leases.contains_key(&reacquired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_leases_are_reclaimed() {
        let pool = Arc::new(FuncIdPool::new());
        let mut leases = Vec::new();
        for _ in 0..255 {
            leases.push(pool.acquire(Duration::from_secs(1)).await);
        }
        // Keep the leases alive but let them all expire
        tokio::time::sleep(Duration::from_secs(2)).await;
        let lease = pool.acquire(DEFAULT_LEASE).await;
        assert!((1..=255).contains(&lease.value()));
        drop(leases);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_result_resolves_completion() {
        let pool = Arc::new(FuncIdPool::new());
        let mut lease = pool.acquire(DEFAULT_LEASE).await;
        assert!(pool.set_result(lease.value(), TransmitStatus::Ok));
        // A second report for the same id is discarded
        assert!(!pool.set_result(lease.value(), TransmitStatus::NoAck));
        assert_eq!(lease.completion().await, Some(TransmitStatus::Ok));
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_for_unknown_id_is_rejected() {
        let pool = Arc::new(FuncIdPool::new());
        assert!(!pool.set_result(42, TransmitStatus::Ok));
    }
}
