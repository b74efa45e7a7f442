use async_trait::async_trait;
use mirror_core::api::{
    ActionResponse, ComponentsResponse, ConfigDocument, DownloadsResponse, ErrorBody, LogsResponse,
    ReportResponse, RetryRequest, RetryResponse, SubmitRequest, SubmitResponse, ValidateResponse,
};
use mirror_core::{Component, JobDetail, JobId, SystemInfo};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ConsoleError, Result};
use crate::transport::Transport;

/// [`Transport`] over the service's JSON HTTP API.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    api_root: Url,
}

impl HttpTransport {
    pub fn new(api_root: &str) -> Result<Self> {
        Self::with_client(Client::new(), api_root)
    }

    pub fn with_client(client: Client, api_root: &str) -> Result<Self> {
        let api_root =
            Url::parse(api_root).map_err(|_| ConsoleError::InvalidApiRoot(api_root.to_string()))?;
        if api_root.cannot_be_a_base() {
            return Err(ConsoleError::InvalidApiRoot(api_root.to_string()));
        }
        Ok(Self { client, api_root })
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Appends percent-encoded path segments to the api root.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| ConsoleError::InvalidApiRoot(self.api_root.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn endpoint_in(&self, segments: &[&str], home_dir: &str) -> Result<Url> {
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut().append_pair("home_dir", home_dir);
        Ok(url)
    }
}

/// Decodes a 2xx body as `R`; anything else becomes [`ConsoleError::Server`].
async fn decode<R: DeserializeOwned>(resp: Response) -> Result<R> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<R>().await?);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    debug!(status = status.as_u16(), %message, "service returned an error");
    Err(ConsoleError::Server {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn list_components(&self) -> Result<Vec<Component>> {
        let url = self.endpoint(&["components"])?;
        let resp: ComponentsResponse = decode(self.client.get(url).send().await?).await?;
        Ok(resp.components)
    }

    async fn list_downloads(&self) -> Result<DownloadsResponse> {
        let url = self.endpoint(&["downloads"])?;
        decode(self.client.get(url).send().await?).await
    }

    async fn submit(&self, req: &SubmitRequest) -> Result<SubmitResponse> {
        let url = self.endpoint(&["downloads"])?;
        decode(self.client.post(url).json(req).send().await?).await
    }

    async fn job_detail(&self, id: &JobId) -> Result<JobDetail> {
        let url = self.endpoint(&["downloads", id.as_str()])?;
        decode(self.client.get(url).send().await?).await
    }

    async fn stop(&self, id: &JobId) -> Result<ActionResponse> {
        let url = self.endpoint(&["downloads", id.as_str()])?;
        decode(self.client.delete(url).send().await?).await
    }

    async fn dismiss(&self, id: &JobId) -> Result<ActionResponse> {
        let url = self.endpoint(&["downloads", id.as_str()])?;
        decode(self.client.patch(url).send().await?).await
    }

    async fn retry(&self, id: &JobId, req: &RetryRequest) -> Result<RetryResponse> {
        let url = self.endpoint(&["downloads", id.as_str(), "retry"])?;
        decode(self.client.post(url).json(req).send().await?).await
    }

    async fn logs(&self, name: &str, home_dir: &str) -> Result<String> {
        let url = self.endpoint_in(&["logs", name], home_dir)?;
        let resp: LogsResponse = decode(self.client.get(url).send().await?).await?;
        Ok(resp.logs)
    }

    async fn report(&self, name: &str, home_dir: &str) -> Result<String> {
        let url = self.endpoint_in(&["reports", name], home_dir)?;
        let resp: ReportResponse = decode(self.client.get(url).send().await?).await?;
        Ok(resp.report)
    }

    async fn system_info(&self, home_dir: &str) -> Result<SystemInfo> {
        let url = self.endpoint_in(&["system", "info"], home_dir)?;
        decode(self.client.get(url).send().await?).await
    }

    async fn load_config(&self) -> Result<String> {
        let url = self.endpoint(&["config"])?;
        let doc: ConfigDocument = decode(self.client.get(url).send().await?).await?;
        Ok(doc.config)
    }

    async fn save_config(&self, text: &str) -> Result<()> {
        let url = self.endpoint(&["config"])?;
        let doc = ConfigDocument {
            config: text.to_string(),
        };
        let _: ActionResponse = decode(self.client.post(url).json(&doc).send().await?).await?;
        Ok(())
    }

    async fn validate(&self) -> Result<ValidateResponse> {
        let url = self.endpoint(&["validate"])?;
        decode(self.client.post(url).send().await?).await
    }
}
