//! Display rows derived from a store snapshot. Stateless.

use mirror_core::{Action, Job, JobId, JobStatus};

use crate::session::Command;
use crate::store::Snapshot;

const NOT_AVAILABLE: &str = "N/A";

/// Buttons a row offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Details,
    Stop,
    Retry,
    /// Retry of a completed job.
    Redownload,
    Dismiss,
    Logs,
    Report,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            RowAction::Details => "Details",
            RowAction::Stop => "Stop",
            RowAction::Retry => "Retry",
            RowAction::Redownload => "Re-download",
            RowAction::Dismiss => "Dismiss",
            RowAction::Logs => "View Logs",
            RowAction::Report => "View Report",
        }
    }

    pub fn command(self, id: JobId) -> Command {
        match self {
            RowAction::Details => Command::Details(id),
            RowAction::Stop => Command::Stop(id),
            RowAction::Retry | RowAction::Redownload => Command::Retry(id),
            RowAction::Dismiss => Command::Dismiss(id),
            RowAction::Logs => Command::Logs(id),
            RowAction::Report => Command::Report(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub id: JobId,
    /// `component vversion`
    pub title: String,
    pub name: String,
    pub status: JobStatus,
    pub started: String,
    pub ended: String,
    pub pid: String,
    /// Only reported while running.
    pub progress: Option<f64>,
    pub actions: Vec<RowAction>,
}

impl JobRow {
    fn from_job(job: &Job, actions: Vec<RowAction>) -> Self {
        Self {
            id: job.id.clone(),
            title: format!("{} v{}", job.component, job.version),
            name: job.name.clone(),
            status: job.status,
            started: or_na(job.start_time.as_deref()),
            ended: or_na(job.end_time.as_deref()),
            pid: job
                .pid
                .map(|p| p.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            progress: job
                .progress
                .as_ref()
                .filter(|_| job.status.is_running())
                .and_then(|p| p.percent()),
            actions,
        }
    }
}

fn or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn active_rows(snapshot: &Snapshot) -> Vec<JobRow> {
    snapshot
        .active
        .iter()
        .map(|job| {
            let mut actions = vec![RowAction::Details];
            if job.status.permits(Action::Stop) {
                actions.push(RowAction::Stop);
            }
            if job.status == JobStatus::Failed {
                actions.push(RowAction::Retry);
            }
            if job.status.permits(Action::Dismiss) {
                actions.push(RowAction::Dismiss);
            }
            JobRow::from_job(job, actions)
        })
        .collect()
}

pub fn history_rows(snapshot: &Snapshot) -> Vec<JobRow> {
    snapshot
        .history
        .iter()
        .map(|job| {
            let mut actions = vec![RowAction::Logs, RowAction::Report];
            match job.status {
                JobStatus::Completed => actions.push(RowAction::Redownload),
                JobStatus::Failed | JobStatus::Dismissed | JobStatus::Stopped => {
                    actions.push(RowAction::Retry)
                }
                _ => {}
            }
            JobRow::from_job(job, actions)
        })
        .collect()
}

/// Active jobs currently running; the badge count.
pub fn running_count(snapshot: &Snapshot) -> usize {
    snapshot
        .active
        .iter()
        .filter(|job| job.status.is_running())
        .count()
}
