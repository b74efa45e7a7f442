use mirror_core::{ActionRejected, JobId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response; `message` is the service's `{error}` text.
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    /// Local precondition: required form fields are empty.
    #[error("{0}")]
    MissingFields(String),

    #[error(transparent)]
    Rejected(#[from] ActionRejected),

    #[error("download {0} not found")]
    JobNotFound(JobId),

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("invalid api root `{0}`")]
    InvalidApiRoot(String),

    #[error("session closed")]
    Closed,
}

impl ConsoleError {
    /// Text shown to the operator.
    ///
    /// Service-reported errors are passed through verbatim; I/O failures
    /// collapse to `generic` since their detail is only useful in logs.
    pub fn user_message(&self, generic: &str) -> String {
        match self {
            ConsoleError::Server { message, .. } => message.clone(),
            ConsoleError::Transport(_) | ConsoleError::Decode(_) => generic.to_string(),
            ConsoleError::JobNotFound(_) => "Download not found".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ConsoleError::Decode(e.to_string())
        } else {
            ConsoleError::Transport(e.to_string())
        }
    }
}
