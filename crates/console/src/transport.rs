use async_trait::async_trait;
use mirror_core::api::{
    ActionResponse, DownloadsResponse, RetryRequest, RetryResponse, SubmitRequest, SubmitResponse,
    ValidateResponse,
};
use mirror_core::{Component, JobDetail, JobId, SystemInfo};

use crate::error::Result;

/// The orchestration service as seen by the console.
///
/// One method per endpoint. Implementations report non-2xx responses as
/// [`crate::ConsoleError::Server`] carrying the service's `{error}` text.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn list_components(&self) -> Result<Vec<Component>>;

    async fn list_downloads(&self) -> Result<DownloadsResponse>;

    async fn submit(&self, req: &SubmitRequest) -> Result<SubmitResponse>;

    async fn job_detail(&self, id: &JobId) -> Result<JobDetail>;

    async fn stop(&self, id: &JobId) -> Result<ActionResponse>;

    async fn dismiss(&self, id: &JobId) -> Result<ActionResponse>;

    async fn retry(&self, id: &JobId, req: &RetryRequest) -> Result<RetryResponse>;

    async fn logs(&self, name: &str, home_dir: &str) -> Result<String>;

    async fn report(&self, name: &str, home_dir: &str) -> Result<String>;

    async fn system_info(&self, home_dir: &str) -> Result<SystemInfo>;

    async fn load_config(&self) -> Result<String>;

    async fn save_config(&self, text: &str) -> Result<()>;

    async fn validate(&self) -> Result<ValidateResponse>;
}
