use std::time::Duration;

use vcl_verify::{RemoteSource, SourceError, VersionRecord};

use crate::response::{ErrorResponse, VclResponse};

const DEFAULT_API_BASE: &str = "https://api.fastly.com";

/// Configuration for a Fastly API client.
#[derive(Debug, Clone, Default)]
pub struct FastlyClientConfig {
    pub token: String,
    pub api_base_url: Option<String>,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Reads service versions and VCL files from the Fastly API.
pub struct FastlyClient {
    config: FastlyClientConfig,
    client: reqwest::Client,
}

impl FastlyClient {
    /// Build a client. Fails if the token is empty or the HTTP client
    /// cannot be constructed.
    pub fn new(config: FastlyClientConfig) -> Result<Self, SourceError> {
        if config.token.trim().is_empty() {
            return Err(SourceError::Auth("missing Fastly API token".into()));
        }

        let mut builder = reqwest::Client::builder().user_agent("vcl-verify");
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SourceError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn api_base(&self) -> &str {
        self.config
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    /// Join `segments` onto the API base, percent-encoding each one.
    fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<reqwest::Url, SourceError> {
        let base = self.api_base();
        let mut url = reqwest::Url::parse(base)
            .map_err(|e| SourceError::Other(format!("invalid API base URL {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| SourceError::Other(format!("API base URL {base} cannot carry a path")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn build_request(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Fastly-Key", &self.config.token)
            .header("Accept", "application/json")
    }

    async fn get(&self, url: reqwest::Url, what: &str) -> Result<reqwest::Response, SourceError> {
        tracing::debug!(url = %url, "GET");

        let response = self
            .build_request(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.message().map(str::to_owned))
            .unwrap_or(body);

        Err(match status.as_u16() {
            404 => SourceError::NotFound(what.to_owned()),
            401 | 403 => SourceError::Auth(format!("HTTP {status}: {detail}")),
            _ => SourceError::Network(format!("HTTP {status}: {detail}")),
        })
    }
}

#[async_trait::async_trait]
impl RemoteSource for FastlyClient {
    fn label(&self) -> &str {
        "fastly"
    }

    async fn list_versions(&self, service: &str) -> Result<Vec<VersionRecord>, SourceError> {
        let url = self.endpoint(["service", service, "version"])?;

        self.get(url, &format!("service {service}"))
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))
    }

    async fn fetch_content(
        &self,
        service: &str,
        version: &str,
        name: &str,
    ) -> Result<String, SourceError> {
        let url = self.endpoint(["service", service, "version", version, "vcl", name])?;

        let vcl: VclResponse = self
            .get(url, &format!("VCL '{name}' in version {version}"))
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        vcl.content
            .ok_or_else(|| SourceError::Parse(format!("no content in VCL '{name}'")))
    }
}
