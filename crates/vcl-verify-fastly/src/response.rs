use serde::Deserialize;

/// Response from Fastly's VCL API.
/// `GET /service/{service_id}/version/{version}/vcl/{name}`
///
/// Only the body is compared; the other keys Fastly sends are ignored.
#[derive(Debug, Deserialize)]
pub struct VclResponse {
    pub content: Option<String>,
}

/// Error body Fastly returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub msg: Option<String>,
    pub detail: Option<String>,
}

impl ErrorResponse {
    /// The most specific message available.
    pub fn message(&self) -> Option<&str> {
        self.detail.as_deref().or(self.msg.as_deref())
    }
}
