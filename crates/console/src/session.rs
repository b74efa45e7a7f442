//! One console session: wiring, command routing and teardown.

use std::sync::Arc;

use mirror_core::api::ValidateResponse;
use mirror_core::{JobId, SystemInfo};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::ConsoleConfig;
use crate::detail::DetailLoader;
use crate::dispatch::{Dispatcher, SubmissionForm};
use crate::error::{ConsoleError, Result};
use crate::notice::Notice;
use crate::poller::{Poller, View};
use crate::store::{JobStore, Snapshot};
use crate::sync::{SyncOutcome, Synchronizer};
use crate::transport::Transport;

/// A per-job user action, as named by the row buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Details(JobId),
    Stop(JobId),
    Retry(JobId),
    Dismiss(JobId),
    Logs(JobId),
    Report(JobId),
}

impl Command {
    pub fn parse(action: &str, id: impl Into<JobId>) -> Result<Self> {
        let id = id.into();
        Ok(match action {
            "details" => Command::Details(id),
            "stop" => Command::Stop(id),
            "retry" => Command::Retry(id),
            "dismiss" => Command::Dismiss(id),
            "logs" => Command::Logs(id),
            "report" => Command::Report(id),
            other => return Err(ConsoleError::UnknownAction(other.to_string())),
        })
    }

    pub fn job_id(&self) -> &JobId {
        match self {
            Command::Details(id)
            | Command::Stop(id)
            | Command::Retry(id)
            | Command::Dismiss(id)
            | Command::Logs(id)
            | Command::Report(id) => id,
        }
    }
}

pub struct Session<T> {
    transport: Arc<T>,
    config: ConsoleConfig,
    store: Arc<JobStore>,
    sync: Arc<Synchronizer<T>>,
    dispatcher: Dispatcher<T>,
    detail: DetailLoader<T>,
    catalog: Catalog,
    views: Arc<watch::Sender<View>>,
    poller: Mutex<Option<Poller>>,
}

impl<T: Transport + 'static> Session<T> {
    pub fn new(transport: Arc<T>, config: ConsoleConfig) -> Self {
        let store = Arc::new(JobStore::new());
        let sync = Arc::new(Synchronizer::new(Arc::clone(&transport), Arc::clone(&store)));
        let (views, _) = watch::channel(View::default());
        let views = Arc::new(views);
        let dispatcher = Dispatcher::new(
            Arc::clone(&transport),
            Arc::clone(&sync),
            Arc::clone(&views),
            config.retry_defaults.clone(),
        );
        let detail = DetailLoader::new(Arc::clone(&transport), Arc::clone(&store));

        Self {
            transport,
            config,
            store,
            sync,
            dispatcher,
            detail,
            catalog: Catalog::new(),
            views,
            poller: Mutex::new(None),
        }
    }

    /// Loads the catalog, runs the first sync and starts the poll timer.
    ///
    /// Returns the notices to show; an unreachable service still yields a
    /// usable (empty) session.
    pub async fn init(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if let Err(e) = self.load_catalog().await {
            warn!(error = %e, "component catalog unavailable");
            notices.push(Notice::from_error(&e, "Failed to load components"));
        }

        self.sync.refresh_now().await;

        let mut poller = self.poller.lock();
        if poller.is_none() && !self.store.is_closed() {
            *poller = Some(Poller::spawn(
                Arc::clone(&self.sync),
                self.views.subscribe(),
                self.config.poll_interval(),
            ));
        }
        info!(api_root = %self.config.api_root, "console session started");
        notices
    }

    pub async fn load_catalog(&self) -> Result<usize> {
        self.catalog.load(self.transport.as_ref()).await
    }

    /// Cancels the timer and discards every response still in flight.
    pub async fn dispose(&self) {
        let poller = self.poller.lock().take();
        if let Some(poller) = poller {
            poller.shutdown().await;
        }
        self.store.close();
        self.detail.close();
        info!("console session closed");
    }

    /// Runs a row action. Detail views report through the modal slot and
    /// return no notice.
    pub async fn execute(&self, command: Command) -> Option<Notice> {
        if self.store.is_closed() {
            return Some(Notice::from_error(&ConsoleError::Closed, ""));
        }
        let result = match &command {
            Command::Details(id) => {
                self.detail.show_details(id).await;
                return None;
            }
            Command::Logs(id) => {
                self.detail.view_logs(id).await;
                return None;
            }
            Command::Report(id) => {
                self.detail.view_report(id).await;
                return None;
            }
            Command::Stop(id) => self
                .dispatcher
                .stop(id)
                .await
                .map_err(|e| (e, "Failed to stop download")),
            Command::Retry(id) => self
                .dispatcher
                .retry(id)
                .await
                .map_err(|e| (e, "Failed to retry download")),
            Command::Dismiss(id) => self
                .dispatcher
                .dismiss(id)
                .await
                .map_err(|e| (e, "Failed to dismiss download")),
        };
        Some(match result {
            Ok(notice) => notice,
            Err((e, generic)) => {
                warn!(job_id = %command.job_id(), error = %e, "action failed");
                Notice::from_error(&e, generic)
            }
        })
    }

    pub async fn submit(&self, form: &mut SubmissionForm) -> Notice {
        if self.store.is_closed() {
            return Notice::from_error(&ConsoleError::Closed, "");
        }
        match self.dispatcher.submit(form).await {
            Ok(notice) => notice,
            Err(e) => {
                warn!(error = %e, "submit failed");
                Notice::from_error(&e, "Failed to start download")
            }
        }
    }

    /// Switches the displayed view; entering a job list refreshes it.
    pub fn show_view(&self, view: View) {
        self.views.send_replace(view);
    }

    pub fn view(&self) -> View {
        *self.views.borrow()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub async fn refresh(&self) -> SyncOutcome {
        self.sync.refresh_now().await
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn detail(&self) -> &DetailLoader<T> {
        &self.detail
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn synchronizer(&self) -> &Arc<Synchronizer<T>> {
        &self.sync
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub async fn system_info(&self, home_dir: &str) -> Result<SystemInfo> {
        self.transport.system_info(home_dir).await
    }

    pub async fn load_config(&self) -> Result<String> {
        self.transport.load_config().await
    }

    pub async fn save_config(&self, text: &str) -> Notice {
        match self.transport.save_config(text).await {
            Ok(()) => Notice::success("Configuration saved successfully"),
            Err(e) => Notice::from_error(&e, "Failed to save configuration"),
        }
    }

    pub async fn validate(&self) -> Result<(Notice, ValidateResponse)> {
        let resp = self.transport.validate().await?;
        let notice = if resp.valid {
            Notice::success("All prerequisites validated successfully")
        } else {
            Notice::warning("Some prerequisites are missing. Check system info.")
        };
        Ok((notice, resp))
    }
}
