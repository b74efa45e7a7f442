#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use mirror_console::{ConsoleError, Result, Transport};
use mirror_core::api::{
    ActionResponse, DownloadsResponse, RetryRequest, RetryResponse, SubmitRequest, SubmitResponse,
    ValidateResponse,
};
use mirror_core::{Component, Job, JobDetail, JobId, JobStatus, SystemInfo};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// One request seen by the fake service.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListComponents,
    ListDownloads,
    Submit(SubmitRequest),
    Detail(JobId),
    Stop(JobId),
    Dismiss(JobId),
    Retry(JobId, RetryRequest),
    Logs { name: String, home_dir: String },
    Report { name: String, home_dir: String },
    SystemInfo(String),
    LoadConfig,
    SaveConfig(String),
    Validate,
}

#[derive(Default)]
struct State {
    components: Vec<Component>,
    downloads: DownloadsResponse,
    calls: Vec<Call>,
    held_listings: VecDeque<(DownloadsResponse, oneshot::Receiver<()>)>,
    held_details: HashMap<JobId, oneshot::Receiver<()>>,
    fail_listing: bool,
    fail_components: bool,
    /// Next action request answers with this error.
    reject_next: Option<(u16, String)>,
    /// Action requests never reach the service.
    unreachable_actions: bool,
    next_id: u32,
}

/// In-memory orchestration service.
///
/// Lifecycle requests move jobs between lists the way the real service does;
/// listings and details can be held open until the test releases them.
#[derive(Default)]
pub struct FakeService {
    state: Mutex<State>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_downloads(active: Vec<Job>, history: Vec<Job>) -> Self {
        let fake = Self::new();
        fake.set_downloads(active, history);
        fake
    }

    pub fn set_downloads(&self, active: Vec<Job>, history: Vec<Job>) {
        self.state.lock().downloads = DownloadsResponse { active, history };
    }

    pub fn set_components(&self, components: Vec<Component>) {
        self.state.lock().components = components;
    }

    pub fn downloads(&self) -> DownloadsResponse {
        self.state.lock().downloads.clone()
    }

    /// The next listing answers with `payload` once the returned sender fires.
    pub fn hold_next_listing(&self, payload: DownloadsResponse) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().held_listings.push_back((payload, rx));
        tx
    }

    pub fn hold_detail(&self, id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().held_details.insert(JobId::new(id), rx);
        tx
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().fail_listing = fail;
    }

    pub fn fail_components(&self, fail: bool) {
        self.state.lock().fail_components = fail;
    }

    pub fn reject_next(&self, status: u16, message: &str) {
        self.state.lock().reject_next = Some((status, message.to_string()));
    }

    pub fn unreachable_actions(&self, unreachable: bool) {
        self.state.lock().unreachable_actions = unreachable;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn listings(&self) -> usize {
        self.count(|c| matches!(c, Call::ListDownloads))
    }

    /// Yields until `pred` holds, failing the test after five seconds.
    pub async fn wait_until(&self, pred: impl Fn(&Self) -> bool) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while !pred(self) {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(waited.is_ok(), "condition not reached; calls: {:?}", self.calls());
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    fn take_rejection(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.unreachable_actions {
            return Err(ConsoleError::Transport("connection refused".into()));
        }
        match state.reject_next.take() {
            Some((status, message)) => Err(ConsoleError::Server { status, message }),
            None => Ok(()),
        }
    }

    fn find(&self, id: &JobId) -> Option<Job> {
        let state = self.state.lock();
        state
            .downloads
            .active
            .iter()
            .chain(state.downloads.history.iter())
            .find(|j| &j.id == id)
            .cloned()
    }

    fn take_active(&self, id: &JobId) -> Option<Job> {
        let mut state = self.state.lock();
        let pos = state.downloads.active.iter().position(|j| &j.id == id)?;
        Some(state.downloads.active.remove(pos))
    }

    fn not_found() -> ConsoleError {
        ConsoleError::Server {
            status: 404,
            message: "Download not found".to_string(),
        }
    }
}

async fn gated<R>(gate: Option<oneshot::Receiver<()>>, then: impl Future<Output = R>) -> R {
    if let Some(gate) = gate {
        let _ = gate.await;
    }
    then.await
}

#[async_trait]
impl Transport for FakeService {
    async fn list_components(&self) -> Result<Vec<Component>> {
        self.record(Call::ListComponents);
        let state = self.state.lock();
        if state.fail_components {
            return Err(ConsoleError::Transport("connection refused".into()));
        }
        Ok(state.components.clone())
    }

    async fn list_downloads(&self) -> Result<DownloadsResponse> {
        let held = {
            let mut state = self.state.lock();
            state.calls.push(Call::ListDownloads);
            if state.fail_listing {
                return Err(ConsoleError::Transport("connection reset".into()));
            }
            state.held_listings.pop_front()
        };
        match held {
            Some((payload, gate)) => gated(Some(gate), async { Ok(payload) }).await,
            None => Ok(self.downloads()),
        }
    }

    async fn submit(&self, req: &SubmitRequest) -> Result<SubmitResponse> {
        self.record(Call::Submit(req.clone()));
        self.take_rejection()?;

        let mut state = self.state.lock();
        state.next_id += 1;
        let id = JobId::new(format!("{}-{}", req.name, state.next_id));
        let mut created = job(id.as_str(), JobStatus::Queued);
        created.component = req.component.clone();
        created.version = req.version.clone();
        created.name = req.name.clone();
        created.home_dir = Some(req.home_dir.clone());
        created.final_registry = Some(req.final_registry.clone());
        created.registry_auth_file = Some(req.registry_auth_file.clone());
        created.entitlement_key = req.entitlement_key.clone();
        state.downloads.active.push(created);

        Ok(SubmitResponse {
            success: true,
            download_id: Some(id),
            pid: Some(4242),
            message: None,
        })
    }

    async fn job_detail(&self, id: &JobId) -> Result<JobDetail> {
        self.record(Call::Detail(id.clone()));
        let gate = self.state.lock().held_details.remove(id);
        gated(gate, async {
            let job = self.find(id).ok_or_else(Self::not_found)?;
            Ok(JobDetail {
                job,
                log_tail: vec![format!("mirroring {id}")],
            })
        })
        .await
    }

    async fn stop(&self, id: &JobId) -> Result<ActionResponse> {
        self.record(Call::Stop(id.clone()));
        self.take_rejection()?;
        let mut stopped = self.take_active(id).ok_or_else(Self::not_found)?;
        stopped.status = JobStatus::Failed;
        stopped.pid = None;
        self.state.lock().downloads.history.insert(0, stopped);
        Ok(ActionResponse {
            success: true,
            message: Some("Download stopped".into()),
        })
    }

    async fn dismiss(&self, id: &JobId) -> Result<ActionResponse> {
        self.record(Call::Dismiss(id.clone()));
        self.take_rejection()?;
        let mut state = self.state.lock();
        if let Some(pos) = state.downloads.active.iter().position(|j| &j.id == id) {
            let mut dismissed = state.downloads.active.remove(pos);
            dismissed.status = JobStatus::Dismissed;
            state.downloads.history.insert(0, dismissed);
        } else if let Some(j) = state.downloads.history.iter_mut().find(|j| &j.id == id) {
            j.status = JobStatus::Dismissed;
        } else {
            return Err(Self::not_found());
        }
        Ok(ActionResponse {
            success: true,
            message: None,
        })
    }

    async fn retry(&self, id: &JobId, req: &RetryRequest) -> Result<RetryResponse> {
        self.record(Call::Retry(id.clone(), req.clone()));
        self.take_rejection()?;
        let original = self.find(id).ok_or_else(Self::not_found)?;

        let mut state = self.state.lock();
        state.next_id += 1;
        let new_id = JobId::new(format!("{}-{}", original.name, state.next_id));
        let mut relaunched = original.clone();
        relaunched.id = new_id.clone();
        relaunched.status = JobStatus::Queued;
        relaunched.end_time = None;
        relaunched.home_dir = Some(req.home_dir.clone());
        relaunched.final_registry = Some(req.final_registry.clone());
        relaunched.registry_auth_file = Some(req.registry_auth_file.clone());
        relaunched.entitlement_key = Some(req.entitlement_key.clone());
        state.downloads.active.push(relaunched);

        Ok(RetryResponse {
            success: true,
            download_id: Some(new_id),
            pid: Some(5151),
        })
    }

    async fn logs(&self, name: &str, home_dir: &str) -> Result<String> {
        self.record(Call::Logs {
            name: name.to_string(),
            home_dir: home_dir.to_string(),
        });
        self.take_rejection()?;
        Ok(format!("log of {name} under {home_dir}"))
    }

    async fn report(&self, name: &str, home_dir: &str) -> Result<String> {
        self.record(Call::Report {
            name: name.to_string(),
            home_dir: home_dir.to_string(),
        });
        self.take_rejection()?;
        Ok(format!("report of {name} under {home_dir}"))
    }

    async fn system_info(&self, home_dir: &str) -> Result<SystemInfo> {
        self.record(Call::SystemInfo(home_dir.to_string()));
        Ok(SystemInfo {
            disk_info: "120G free".into(),
            prerequisites: [("oc".to_string(), true), ("oc-mirror".to_string(), false)]
                .into_iter()
                .collect(),
            home_dir: home_dir.to_string(),
            script_path: format!("{home_dir}/mirror.sh"),
        })
    }

    async fn load_config(&self) -> Result<String> {
        self.record(Call::LoadConfig);
        Ok("HOME_DIR=/opt/cp4i\n".into())
    }

    async fn save_config(&self, text: &str) -> Result<()> {
        self.record(Call::SaveConfig(text.to_string()));
        self.take_rejection()
    }

    async fn validate(&self) -> Result<ValidateResponse> {
        self.record(Call::Validate);
        Ok(ValidateResponse {
            valid: false,
            output: Some("oc-mirror: not found".into()),
        })
    }
}

/// A job with no config echo.
pub fn job(id: &str, status: JobStatus) -> Job {
    Job {
        id: JobId::new(id),
        component: "ibm-foo-operator".into(),
        version: "1.2.3".into(),
        name: id.to_string(),
        status,
        start_time: Some("2025-01-01T09:00:00".into()),
        end_time: None,
        pid: status.is_running().then_some(4242),
        main_pid: None,
        mirror_pid: None,
        return_code: None,
        progress: None,
        filter: None,
        dry_run: None,
        home_dir: None,
        final_registry: None,
        registry_auth_file: None,
        entitlement_key: None,
    }
}

/// A job that echoes the configuration it was launched with.
pub fn echoed(id: &str, status: JobStatus, home_dir: &str, final_registry: &str) -> Job {
    Job {
        home_dir: Some(home_dir.into()),
        final_registry: Some(final_registry.into()),
        registry_auth_file: Some("/root/.docker/config.json".into()),
        entitlement_key: Some(String::new()),
        ..job(id, status)
    }
}

pub fn listing(active: Vec<Job>, history: Vec<Job>) -> DownloadsResponse {
    DownloadsResponse { active, history }
}
