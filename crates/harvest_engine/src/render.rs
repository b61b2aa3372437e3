//! Client for a remote rendering service.
//!
//! JavaScript-heavy pages go through a reader-style endpoint that loads the
//! page in a real browser and returns the rendered content: `GET
//! {endpoint}/{url}`, optionally authenticated with a bearer token. The
//! request budget is deliberately longer than the static loader's.

use std::time::Duration;

use crate::fetch::{map_reqwest_error, PageFetcher};
use crate::types::{FailureKind, FetchFailure, FetchMetadata, FetchOutput};

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Base endpoint; the target URL is appended as a path.
    pub endpoint: String,
    /// Bearer token, when the service wants one.
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://r.jina.ai".to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The JS-capable loader. Used for force-render classifications and for
/// every URL in the retry pass.
#[derive(Debug, Clone)]
pub struct RenderClient {
    settings: RenderSettings,
}

impl RenderClient {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl PageFetcher for RenderClient {
    async fn fetch_page(&self, url: &str) -> Result<FetchOutput, FetchFailure> {
        let target = format!("{}/{}", self.settings.endpoint.trim_end_matches('/'), url);
        let client = reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| FetchFailure::new(FailureKind::RenderService, err.to_string()))?;

        let mut request = client.get(&target);
        if let Some(key) = self.settings.api_key.as_deref() {
            if !key.is_empty() {
                request = request.header("Authorization", format!("Bearer {key}"));
            }
        }

        let response = request.send().await.map_err(map_render_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::new(
                FailureKind::RenderService,
                format!("render service returned {status}"),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(map_render_error)?
            .to_vec();

        let byte_len = bytes.len() as u64;
        Ok(FetchOutput {
            bytes,
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                redirect_count: 0,
                // Reader endpoints answer with rendered markdown/plain text
                // unless they say otherwise.
                content_type: content_type.or_else(|| Some("text/plain".to_string())),
                byte_len,
            },
        })
    }
}

fn map_render_error(err: reqwest::Error) -> FetchFailure {
    let failure = map_reqwest_error(err);
    match failure.kind {
        FailureKind::Timeout => failure,
        _ => FetchFailure::new(FailureKind::RenderService, failure.message),
    }
}
