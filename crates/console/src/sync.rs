//! Synchronizer: full-replace refreshes of the Job Store.
//!
//! Every fetch is tagged with a generation taken at issue time; the store only
//! accepts a generation newer than the one it holds, so a slow response can
//! never overwrite a faster, later-issued one.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::store::{JobStore, ReplaceOutcome};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied { generation: u64 },
    /// Fetched, but a newer response had already landed.
    Stale { generation: u64 },
    /// Timer trigger dropped because a fetch was in flight.
    Skipped,
    /// Fetch failed; the store is unchanged.
    Failed,
    Closed,
}

pub struct Synchronizer<T> {
    transport: Arc<T>,
    store: Arc<JobStore>,
    next_generation: AtomicU64,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight count when the fetch ends, however it ends.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<T: Transport> Synchronizer<T> {
    pub fn new(transport: Arc<T>, store: Arc<JobStore>) -> Self {
        Self {
            transport,
            store,
            next_generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Timer trigger: dropped while any fetch is outstanding.
    pub async fn tick(&self) -> SyncOutcome {
        if self.store.is_closed() {
            return SyncOutcome::Closed;
        }
        if self
            .in_flight
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("sync already in flight; dropping tick");
            return SyncOutcome::Skipped;
        }
        let _guard = InFlight(&self.in_flight);
        self.fetch_and_apply().await
    }

    /// Explicit refresh after a lifecycle action. Always issues a fetch.
    pub async fn refresh_now(&self) -> SyncOutcome {
        if self.store.is_closed() {
            return SyncOutcome::Closed;
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let _guard = InFlight(&self.in_flight);
        self.fetch_and_apply().await
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    async fn fetch_and_apply(&self) -> SyncOutcome {
        let generation = self.next_generation.fetch_add(1, Ordering::AcqRel) + 1;
        match self.transport.list_downloads().await {
            Ok(resp) => match self.store.replace(generation, resp.active, resp.history) {
                ReplaceOutcome::Applied => SyncOutcome::Applied { generation },
                ReplaceOutcome::Stale => SyncOutcome::Stale { generation },
                ReplaceOutcome::Closed => SyncOutcome::Closed,
            },
            Err(e) => {
                warn!(generation, error = %e, "download sync failed");
                SyncOutcome::Failed
            }
        }
    }
}
