#![forbid(unsafe_code)]

//! Client core of the mirror download console.
//!
//! A [`Session`] owns the [`JobStore`], keeps it converged with the
//! orchestration service through the [`Synchronizer`] and its poll timer,
//! and routes user actions to the [`Dispatcher`] and [`DetailLoader`].

pub mod catalog;
pub mod config;
pub mod detail;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod notice;
pub mod poller;
pub mod session;
pub mod store;
pub mod sync;
pub mod transport;
pub mod view;

pub use catalog::Catalog;
pub use config::ConsoleConfig;
pub use detail::{DetailKind, DetailLoader, DetailOutcome, ModalContent, ModalSlot};
pub use dispatch::{Dispatcher, SubmissionForm};
pub use error::{ConsoleError, Result};
pub use http::HttpTransport;
pub use notice::{Notice, NoticeLevel};
pub use poller::{Poller, View};
pub use session::{Command, Session};
pub use store::{JobCollection, JobStore, ReplaceOutcome, Snapshot};
pub use sync::{SyncOutcome, Synchronizer};
pub use transport::Transport;
pub use view::{active_rows, history_rows, running_count, JobRow, RowAction};
