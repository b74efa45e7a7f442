//! Request and response bodies of the orchestration service.

use serde::{Deserialize, Serialize};

use crate::model::{Component, Job, JobId, LaunchConfig};

/// `GET /components` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsResponse {
    /// Catalog entries.
    pub components: Vec<Component>,
    /// Where the list came from (`default` for the built-in catalog).
    #[serde(default)]
    pub source: Option<String>,
}

/// `GET /downloads` response: the authoritative active/history partition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DownloadsResponse {
    /// Queued or running jobs.
    #[serde(default)]
    pub active: Vec<Job>,
    /// Concluded jobs, newest first.
    #[serde(default)]
    pub history: Vec<Job>,
}

/// `POST /downloads` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitRequest {
    /// Catalog component name.
    pub component: String,
    /// Component version.
    pub version: String,
    /// Operator-chosen display name.
    pub name: String,
    /// Optional image filter.
    #[serde(default)]
    pub filter: Option<String>,
    /// Plan the mirror without copying.
    #[serde(default)]
    pub dry_run: bool,
    /// Working directory on the service host.
    pub home_dir: String,
    /// Target registry.
    pub final_registry: String,
    /// Registry credentials file.
    pub registry_auth_file: String,
    /// Entitlement key, omitted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entitlement_key: Option<String>,
}

/// `POST /downloads` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Whether the job was launched.
    #[serde(default)]
    pub success: bool,
    /// Id of the new job.
    #[serde(default)]
    pub download_id: Option<JobId>,
    /// Launcher process id.
    #[serde(default)]
    pub pid: Option<u32>,
    /// Service remark, if any.
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /downloads/{id}/retry` body. Every field is sent explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryRequest {
    /// Working directory on the service host.
    pub home_dir: String,
    /// Target registry.
    pub final_registry: String,
    /// Registry credentials file.
    pub registry_auth_file: String,
    /// Entitlement key, empty when unset.
    pub entitlement_key: String,
}

impl From<LaunchConfig> for RetryRequest {
    fn from(cfg: LaunchConfig) -> Self {
        Self {
            home_dir: cfg.home_dir,
            final_registry: cfg.final_registry,
            registry_auth_file: cfg.registry_auth_file,
            entitlement_key: cfg.entitlement_key.unwrap_or_default(),
        }
    }
}

/// `POST /downloads/{id}/retry` response. The retried attempt may get a new id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryResponse {
    /// Whether the retry was launched.
    #[serde(default)]
    pub success: bool,
    /// Id of the new attempt.
    #[serde(default)]
    pub download_id: Option<JobId>,
    /// Launcher process id.
    #[serde(default)]
    pub pid: Option<u32>,
}

/// Stop/dismiss/config-save response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Whether the service carried it out.
    #[serde(default)]
    pub success: bool,
    /// Service remark, shown verbatim.
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /logs/{name}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    /// Full log text.
    pub logs: String,
}

/// `GET /reports/{name}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    /// Report text.
    pub report: String,
}

/// `GET|POST /config` body: raw configuration text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// File contents.
    #[serde(default)]
    pub config: String,
}

/// `POST /validate` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// Whether every check passed.
    pub valid: bool,
    /// Checker output.
    #[serde(default)]
    pub output: Option<String>,
}

/// Error body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Message shown to the operator verbatim.
    pub error: String,
}
