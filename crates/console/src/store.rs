//! Job Store: the session's cached view of the service's active/history lists.
//!
//! Writes only ever replace the whole snapshot, tagged with the generation of
//! the sync request that fetched it. Readers hold an `Arc<Snapshot>`, so they
//! always see an active/history pair from the same response.

use std::collections::HashMap;
use std::sync::Arc;

use mirror_core::{now_ms, Job, JobId};
use parking_lot::RwLock;
use tracing::{debug, warn};

/// Jobs of one list in server order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct JobCollection {
    jobs: Vec<Job>,
    index: HashMap<JobId, usize>,
}

impl JobCollection {
    /// A repeated id within one list keeps its first occurrence.
    pub fn from_jobs(jobs: Vec<Job>) -> Self {
        let mut kept = Vec::with_capacity(jobs.len());
        let mut index = HashMap::with_capacity(jobs.len());
        for job in jobs {
            if index.contains_key(&job.id) {
                warn!(job_id = %job.id, "duplicate job id in one list; keeping the first");
                continue;
            }
            index.insert(job.id.clone(), kept.len());
            kept.push(job);
        }
        Self { jobs: kept, index }
    }

    pub fn get(&self, id: &JobId) -> Option<&Job> {
        self.index.get(id).map(|&i| &self.jobs[i])
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Generation of the sync that produced this snapshot; 0 before the first.
    pub generation: u64,
    pub synced_at_ms: Option<i64>,
    pub active: JobCollection,
    pub history: JobCollection,
}

impl Snapshot {
    /// Active first, then history.
    pub fn lookup(&self, id: &JobId) -> Option<&Job> {
        self.active.get(id).or_else(|| self.history.get(id))
    }

    /// History first, then active.
    pub fn lookup_history_first(&self, id: &JobId) -> Option<&Job> {
        self.history.get(id).or_else(|| self.active.get(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Applied,
    /// A newer generation was already applied.
    Stale,
    /// The store was closed by session teardown.
    Closed,
}

#[derive(Debug, Default)]
pub struct JobStore {
    inner: RwLock<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    snapshot: Arc<Snapshot>,
    closed: bool,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.inner.read().snapshot)
    }

    /// Swaps in both lists if `generation` is newer than the applied one.
    pub fn replace(&self, generation: u64, active: Vec<Job>, history: Vec<Job>) -> ReplaceOutcome {
        let next = Snapshot {
            generation,
            synced_at_ms: Some(now_ms()),
            active: JobCollection::from_jobs(active),
            history: JobCollection::from_jobs(history),
        };

        let mut state = self.inner.write();
        if state.closed {
            return ReplaceOutcome::Closed;
        }
        if generation <= state.snapshot.generation {
            debug!(
                generation,
                applied = state.snapshot.generation,
                "discarding stale sync response"
            );
            return ReplaceOutcome::Stale;
        }
        state.snapshot = Arc::new(next);
        ReplaceOutcome::Applied
    }

    pub fn lookup(&self, id: &JobId) -> Option<Job> {
        self.snapshot().lookup(id).cloned()
    }

    pub fn lookup_history_first(&self, id: &JobId) -> Option<Job> {
        self.snapshot().lookup_history_first(id).cloned()
    }

    /// Refuses every later replace.
    pub fn close(&self) {
        self.inner.write().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }
}
