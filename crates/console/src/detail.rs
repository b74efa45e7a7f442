//! Detail Loader and the single shared modal slot.
//!
//! Opening any view replaces whatever the slot holds and takes a fresh
//! generation. A response is written only if the slot still carries the
//! generation it was requested under; superseded responses are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mirror_core::{Job, JobDetail, JobId};
use parking_lot::Mutex;
use tracing::debug;

use crate::store::JobStore;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    Details,
    Logs,
    Report,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalContent {
    Loading,
    Details(Box<JobDetail>),
    Logs { name: String, text: String },
    Report { name: String, text: String },
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalSlot {
    pub generation: u64,
    pub kind: DetailKind,
    pub job_id: JobId,
    pub content: ModalContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    Shown,
    /// Another view was opened (or the slot closed) before this one resolved.
    Superseded,
}

pub struct DetailLoader<T> {
    transport: Arc<T>,
    store: Arc<JobStore>,
    slot: Mutex<Option<ModalSlot>>,
    next_generation: AtomicU64,
}

impl<T: Transport> DetailLoader<T> {
    pub fn new(transport: Arc<T>, store: Arc<JobStore>) -> Self {
        Self {
            transport,
            store,
            slot: Mutex::new(None),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Status, timestamps, log tail and progress summary of one job.
    pub async fn show_details(&self, id: &JobId) -> DetailOutcome {
        let generation = self.open(DetailKind::Details, id);
        let content = match self.transport.job_detail(id).await {
            Ok(detail) => ModalContent::Details(Box::new(detail)),
            Err(e) => ModalContent::Error(e.user_message("Failed to load download details")),
        };
        self.settle(generation, content)
    }

    /// Persisted download log of a job, located by its recorded home dir and name.
    pub async fn view_logs(&self, id: &JobId) -> DetailOutcome {
        let generation = self.open(DetailKind::Logs, id);
        let content = match self.locate(id) {
            Ok((home_dir, name)) => match self.transport.logs(&name, &home_dir).await {
                Ok(text) => ModalContent::Logs { name, text },
                Err(e) => ModalContent::Error(e.user_message("Failed to load logs")),
            },
            Err(message) => ModalContent::Error(message),
        };
        self.settle(generation, content)
    }

    /// Summary report of a job, located like [`DetailLoader::view_logs`].
    pub async fn view_report(&self, id: &JobId) -> DetailOutcome {
        let generation = self.open(DetailKind::Report, id);
        let content = match self.locate(id) {
            Ok((home_dir, name)) => match self.transport.report(&name, &home_dir).await {
                Ok(text) => ModalContent::Report { name, text },
                Err(e) => ModalContent::Error(e.user_message("Failed to load report")),
            },
            Err(message) => ModalContent::Error(message),
        };
        self.settle(generation, content)
    }

    pub fn current(&self) -> Option<ModalSlot> {
        self.slot.lock().clone()
    }

    /// Empties the slot; responses still in flight are discarded.
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        self.next_generation.fetch_add(1, Ordering::AcqRel);
        *slot = None;
    }

    fn open(&self, kind: DetailKind, id: &JobId) -> u64 {
        // Generation is taken under the slot lock so slot order matches issue order.
        let mut slot = self.slot.lock();
        let generation = self.next_generation.fetch_add(1, Ordering::AcqRel) + 1;
        *slot = Some(ModalSlot {
            generation,
            kind,
            job_id: id.clone(),
            content: ModalContent::Loading,
        });
        generation
    }

    fn settle(&self, generation: u64, content: ModalContent) -> DetailOutcome {
        let mut slot = self.slot.lock();
        match slot.as_mut() {
            Some(current) if current.generation == generation => {
                current.content = content;
                DetailOutcome::Shown
            }
            _ => {
                debug!(generation, "discarding superseded detail response");
                DetailOutcome::Superseded
            }
        }
    }

    /// Home dir and name of a cached job, history first. Never defaulted.
    fn locate(&self, id: &JobId) -> Result<(String, String), String> {
        let job: Job = self
            .store
            .lookup_history_first(id)
            .ok_or_else(|| "Download not found".to_string())?;
        let home_dir = job
            .recorded_home_dir()
            .ok_or_else(|| "Download has no recorded home directory".to_string())?
            .to_string();
        Ok((home_dir, job.name))
    }
}
