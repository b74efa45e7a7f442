//! Lifecycle Dispatcher: submit, stop, retry and dismiss.
//!
//! Each operation checks its precondition against the cached Job Store, sends
//! one request, and on success refreshes the store right away. The store is
//! never patched locally; the refresh is the only write.

use std::sync::Arc;

use mirror_core::api::{RetryRequest, SubmitRequest};
use mirror_core::{Action, Job, JobId, LaunchConfig};
use tokio::sync::watch;
use tracing::info;

use crate::error::{ConsoleError, Result};
use crate::notice::Notice;
use crate::poller::View;
use crate::store::JobStore;
use crate::sync::Synchronizer;
use crate::transport::Transport;

/// Contents of the new-download form.
///
/// The launch configuration survives a successful submit so it can be reused;
/// the job-specific fields are cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    pub component: String,
    pub version: String,
    pub name: String,
    pub filter: Option<String>,
    pub dry_run: bool,
    pub launch: LaunchConfig,
}

impl SubmissionForm {
    pub fn validate(&self) -> Result<()> {
        if !self.launch.missing_required().is_empty() {
            return Err(ConsoleError::MissingFields(
                "Please fill in required configuration fields (home_dir, final_registry, registry_auth_file)"
                    .to_string(),
            ));
        }
        if self.component.is_empty() || self.version.is_empty() || self.name.is_empty() {
            return Err(ConsoleError::MissingFields(
                "Missing required fields (component, version, name)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_request(&self) -> SubmitRequest {
        SubmitRequest {
            component: self.component.clone(),
            version: self.version.clone(),
            name: self.name.clone(),
            filter: self.filter.clone().filter(|f| !f.is_empty()),
            dry_run: self.dry_run,
            home_dir: self.launch.home_dir.clone(),
            final_registry: self.launch.final_registry.clone(),
            registry_auth_file: self.launch.registry_auth_file.clone(),
            entitlement_key: self.launch.entitlement_key.clone().filter(|k| !k.is_empty()),
        }
    }

    pub fn clear_job_fields(&mut self) {
        self.component.clear();
        self.version.clear();
        self.name.clear();
        self.filter = None;
        self.dry_run = false;
    }
}

pub struct Dispatcher<T> {
    transport: Arc<T>,
    store: Arc<JobStore>,
    sync: Arc<Synchronizer<T>>,
    views: Arc<watch::Sender<View>>,
    retry_defaults: LaunchConfig,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(
        transport: Arc<T>,
        sync: Arc<Synchronizer<T>>,
        views: Arc<watch::Sender<View>>,
        retry_defaults: LaunchConfig,
    ) -> Self {
        Self {
            store: Arc::clone(sync.store()),
            transport,
            sync,
            views,
            retry_defaults,
        }
    }

    pub async fn submit(&self, form: &mut SubmissionForm) -> Result<Notice> {
        form.validate()?;
        let req = form.to_request();
        let resp = self.transport.submit(&req).await?;
        info!(
            name = %req.name,
            component = %req.component,
            version = %req.version,
            download_id = ?resp.download_id,
            "download submitted"
        );

        form.clear_job_fields();
        self.views.send_replace(View::ActiveDownloads);
        self.sync.refresh_now().await;
        Ok(Notice::success(format!("Download started: {}", req.name)))
    }

    pub async fn stop(&self, id: &JobId) -> Result<Notice> {
        let job = self.cached(id)?;
        job.status.check(Action::Stop)?;
        self.transport.stop(id).await?;
        info!(job_id = %id, "download stopped");

        self.sync.refresh_now().await;
        Ok(Notice::success("Download stopped"))
    }

    /// Relaunches a concluded job with its own echoed configuration.
    pub async fn retry(&self, id: &JobId) -> Result<Notice> {
        let job = match self.store.lookup_history_first(id) {
            Some(job) => job,
            None => {
                // The cache may predate the job; look once more after a fresh sync.
                self.sync.refresh_now().await;
                self.store
                    .lookup_history_first(id)
                    .ok_or_else(|| ConsoleError::JobNotFound(id.clone()))?
            }
        };
        job.status.check(Action::Retry)?;

        let req = RetryRequest::from(job.launch_config(&self.retry_defaults));
        let resp = self.transport.retry(id, &req).await?;
        info!(
            job_id = %id,
            new_id = ?resp.download_id,
            home_dir = %req.home_dir,
            final_registry = %req.final_registry,
            "download retried"
        );

        self.sync.refresh_now().await;
        Ok(Notice::success(
            "Download retry started with original configuration",
        ))
    }

    pub async fn dismiss(&self, id: &JobId) -> Result<Notice> {
        let job = self.cached(id)?;
        job.status.check(Action::Dismiss)?;
        self.transport.dismiss(id).await?;
        info!(job_id = %id, "download dismissed");

        self.sync.refresh_now().await;
        Ok(Notice::success("Download dismissed"))
    }

    fn cached(&self, id: &JobId) -> Result<Job> {
        self.store
            .lookup(id)
            .ok_or_else(|| ConsoleError::JobNotFound(id.clone()))
    }
}
