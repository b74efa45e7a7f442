#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Shared models and lifecycle rules for the mirror download console.

pub mod api;
pub mod lifecycle;
pub mod model;

mod util;

pub use lifecycle::{Action, ActionRejected};
pub use model::{Component, Job, JobDetail, JobId, JobStatus, LaunchConfig, Progress, SystemInfo};
pub use util::now_ms;
