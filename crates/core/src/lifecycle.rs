//! Which user-triggered transitions a job's cached status permits.
//!
//! ```text
//! queued    --(server)---> running
//! running   --(server)---> completed | failed
//! running   --(stop)-----> failed | dismissed | stopped   (server decides)
//! completed --(dismiss)--> dismissed
//! failed    --(dismiss)--> dismissed
//! failed    --(retry)----> queued
//! completed --(retry)----> queued
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::JobStatus;

/// A user-triggered lifecycle transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Cancel a running job.
    Stop,
    /// Relaunch a concluded job with its own configuration.
    Retry,
    /// Remove a job from active attention.
    Dismiss,
}

impl Action {
    /// Lower-case verb used in messages.
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Stop => "stop",
            Action::Retry => "retry",
            Action::Dismiss => "dismiss",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A transition refused before any request was sent.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cannot {action} a download that is {status}")]
pub struct ActionRejected {
    /// The refused action.
    pub action: Action,
    /// Cached status that refused it.
    pub status: JobStatus,
}

impl JobStatus {
    /// Stop only while running; dismiss never while running; retry once concluded.
    pub fn permits(&self, action: Action) -> bool {
        match action {
            Action::Stop => self.is_running(),
            Action::Dismiss => !self.is_running(),
            Action::Retry => self.is_terminal(),
        }
    }

    /// [`JobStatus::permits`] as a `Result`.
    pub fn check(&self, action: Action) -> Result<(), ActionRejected> {
        if self.permits(action) {
            Ok(())
        } else {
            Err(ActionRejected {
                action,
                status: *self,
            })
        }
    }
}
