//! Wire models shared by every console component.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default home directory used when a historical job predates the config echo.
pub const DEFAULT_HOME_DIR: &str = "/opt/cp4i";
/// Default target registry used when a historical job predates the config echo.
pub const DEFAULT_FINAL_REGISTRY: &str = "registry.example.com:5000";
/// Default registry auth file used when a historical job predates the config echo.
pub const DEFAULT_REGISTRY_AUTH_FILE: &str = "/root/.docker/config.json";

/// Opaque job identifier assigned by the orchestration service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Wraps a server-assigned id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Server-reported job status.
///
/// Strings the console does not know deserialize to [`JobStatus::Unknown`] so a
/// single odd record never fails a whole sync.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum JobStatus {
    /// Accepted, not yet launched.
    Queued,
    /// Mirror process alive.
    Running,
    /// Launcher exited but the mirror log is still growing.
    Progressing,
    /// Finished successfully.
    Completed,
    /// Exited with an error.
    Failed,
    /// Cancelled by a stop request.
    Stopped,
    /// Removed from active attention by the operator.
    Dismissed,
    /// A status string this console does not know.
    Unknown,
}

impl JobStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Progressing => "progressing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Stopped => "stopped",
            JobStatus::Dismissed => "dismissed",
            JobStatus::Unknown => "unknown",
        }
    }

    /// Only `running` holds a live process that can be stopped.
    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running)
    }

    /// Concluded attempts: the ones a retry may relaunch.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Stopped | JobStatus::Dismissed
        )
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "queued" => JobStatus::Queued,
            "running" => JobStatus::Running,
            "progressing" => JobStatus::Progressing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "stopped" => JobStatus::Stopped,
            "dismissed" => JobStatus::Dismissed,
            _ => JobStatus::Unknown,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress as reported by the service.
///
/// The list endpoint sends a bare percentage, the detail endpoint an object
/// carrying the summary report text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Progress {
    /// Bare percentage.
    Percent(f64),
    /// Percentage plus the report summary.
    Detail {
        /// Completion, 0-100.
        #[serde(default)]
        percent: Option<f64>,
        /// Summary report text.
        #[serde(default)]
        summary: Option<String>,
    },
}

impl Progress {
    /// Numeric percentage, if any.
    pub fn percent(&self) -> Option<f64> {
        match self {
            Progress::Percent(p) => Some(*p),
            Progress::Detail { percent, .. } => *percent,
        }
    }

    /// Free-text progress summary, if any.
    pub fn summary(&self) -> Option<&str> {
        match self {
            Progress::Percent(_) => None,
            Progress::Detail { summary, .. } => summary.as_deref(),
        }
    }
}

/// Parameters a job is launched (or relaunched) with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Working root on the mirror host.
    pub home_dir: String,
    /// Registry the images are pushed to.
    pub final_registry: String,
    /// Auth file for the target registry.
    pub registry_auth_file: String,
    /// Entitled registry key. Optional on submit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entitlement_key: Option<String>,
}

impl LaunchConfig {
    /// Best-known defaults used when a history record lacks its config echo.
    pub fn retry_fallback() -> Self {
        Self {
            home_dir: DEFAULT_HOME_DIR.to_string(),
            final_registry: DEFAULT_FINAL_REGISTRY.to_string(),
            registry_auth_file: DEFAULT_REGISTRY_AUTH_FILE.to_string(),
            entitlement_key: Some(String::new()),
        }
    }

    /// Names of the required fields that are empty.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.home_dir.is_empty() {
            missing.push("home_dir");
        }
        if self.final_registry.is_empty() {
            missing.push("final_registry");
        }
        if self.registry_auth_file.is_empty() {
            missing.push("registry_auth_file");
        }
        missing
    }
}

/// One download attempt as reported by the orchestration service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Server-assigned id.
    pub id: JobId,
    /// Catalog component name.
    pub component: String,
    /// Component version.
    pub version: String,
    /// User-chosen deployment identifier.
    pub name: String,
    /// Server-authoritative status.
    pub status: JobStatus,

    /// ISO-8601 launch time.
    #[serde(default)]
    pub start_time: Option<String>,
    /// ISO-8601 end time, once concluded.
    #[serde(default)]
    pub end_time: Option<String>,

    /// Present while running.
    #[serde(default)]
    pub pid: Option<u32>,
    /// Launcher script process.
    #[serde(default)]
    pub main_pid: Option<u32>,
    /// Mirror tool process.
    #[serde(default)]
    pub mirror_pid: Option<u32>,
    /// Exit code of the launcher.
    #[serde(default)]
    pub return_code: Option<i32>,
    /// Present while running.
    #[serde(default)]
    pub progress: Option<Progress>,

    /// Image filter the job was submitted with.
    #[serde(default)]
    pub filter: Option<String>,
    /// Whether the job was a dry run.
    #[serde(default)]
    pub dry_run: Option<bool>,

    // Config echo. History entries written by older services may lack these.
    /// Echoed [`LaunchConfig::home_dir`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_dir: Option<String>,
    /// Echoed [`LaunchConfig::final_registry`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_registry: Option<String>,
    /// Echoed [`LaunchConfig::registry_auth_file`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_auth_file: Option<String>,
    /// Echoed [`LaunchConfig::entitlement_key`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entitlement_key: Option<String>,
}

impl Job {
    /// The job's echoed launch configuration, with empty or absent fields
    /// taken from `fallback`.
    pub fn launch_config(&self, fallback: &LaunchConfig) -> LaunchConfig {
        fn pick(echo: &Option<String>, fallback: &str) -> String {
            match echo.as_deref() {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => fallback.to_string(),
            }
        }

        LaunchConfig {
            home_dir: pick(&self.home_dir, &fallback.home_dir),
            final_registry: pick(&self.final_registry, &fallback.final_registry),
            registry_auth_file: pick(&self.registry_auth_file, &fallback.registry_auth_file),
            entitlement_key: Some(pick(
                &self.entitlement_key,
                fallback.entitlement_key.as_deref().unwrap_or_default(),
            )),
        }
    }

    /// Recorded home directory, if the service echoed a non-empty one.
    pub fn recorded_home_dir(&self) -> Option<&str> {
        self.home_dir.as_deref().filter(|h| !h.is_empty())
    }
}

/// Extended job view returned by the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDetail {
    /// The job record itself.
    #[serde(flatten)]
    pub job: Job,
    /// Tail of the download log, one entry per line.
    #[serde(default)]
    pub log_tail: Vec<String>,
}

/// An installable component from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Component {
    /// Operator package name.
    pub name: String,
    /// Human description.
    pub description: String,
    /// Rough download size, e.g. `2GB`.
    pub typical_size: String,
    /// Suggested versions; any version may be entered.
    #[serde(default)]
    pub versions: Vec<String>,
}

/// Disk and prerequisite diagnostics for a home directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemInfo {
    /// `df` output for the home directory.
    #[serde(default)]
    pub disk_info: String,
    /// Tool name -> installed.
    #[serde(default)]
    pub prerequisites: BTreeMap<String, bool>,
    /// Directory the diagnostics were taken for.
    pub home_dir: String,
    /// Mirror script the service launches.
    #[serde(default)]
    pub script_path: String,
}
