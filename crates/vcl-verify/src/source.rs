use std::sync::Arc;

use serde::{Deserialize, Deserializer};

/// Errors that can occur when talking to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

/// A version record as returned by the remote listing.
///
/// `number` is kept as text because the remote may encode it either way;
/// [`crate::version::resolve`] does the numeric parsing. `raw` holds the
/// complete record for callers that want more than the number.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRecord {
    pub number: String,
    pub raw: serde_json::Value,
}

impl VersionRecord {
    pub fn new(number: impl Into<String>) -> Self {
        let number = number.into();
        Self {
            raw: serde_json::json!({ "number": number }),
            number,
        }
    }
}

impl<'de> Deserialize<'de> for VersionRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;

        let number = match raw.get("number") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(serde::de::Error::custom(format!(
                    "version number must be a string or integer, got {other}"
                )));
            }
            None => return Err(serde::de::Error::missing_field("number")),
        };

        Ok(Self { number, raw })
    }
}

/// The remote service holding the published copies of the local files.
#[async_trait::async_trait]
pub trait RemoteSource: Send + Sync {
    /// Human-readable label identifying this source.
    fn label(&self) -> &str;

    /// List every version of a service, in whatever order the remote returns.
    async fn list_versions(&self, service: &str) -> Result<Vec<VersionRecord>, SourceError>;

    /// Fetch the text of a named file at a given service version.
    async fn fetch_content(
        &self,
        service: &str,
        version: &str,
        name: &str,
    ) -> Result<String, SourceError>;
}

#[async_trait::async_trait]
impl<T: RemoteSource + ?Sized> RemoteSource for Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    async fn list_versions(&self, service: &str) -> Result<Vec<VersionRecord>, SourceError> {
        (**self).list_versions(service).await
    }

    async fn fetch_content(
        &self,
        service: &str,
        version: &str,
        name: &str,
    ) -> Result<String, SourceError> {
        (**self).fetch_content(service, version, name).await
    }
}
