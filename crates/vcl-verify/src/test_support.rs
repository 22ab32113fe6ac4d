use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{RemoteSource, SourceError, VersionRecord};

/// In-memory remote for testing. Files are keyed by (version, name).
pub struct InMemorySource {
    label: String,
    versions: Vec<VersionRecord>,
    files: HashMap<(String, String), String>,
    failures: HashMap<String, SourceError>,
    listing_error: Option<SourceError>,
    fetches: AtomicUsize,
}

impl InMemorySource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            versions: Vec::new(),
            files: HashMap::new(),
            failures: HashMap::new(),
            listing_error: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Append a version record; listing order is insertion order.
    pub fn add_version(&mut self, number: impl Into<String>) {
        self.versions.push(VersionRecord::new(number));
    }

    pub fn add_file(
        &mut self,
        version: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) {
        self.files
            .insert((version.into(), name.into()), content.into());
    }

    /// Make every fetch of `name` fail with `error`, at any version.
    pub fn fail_file(&mut self, name: impl Into<String>, error: SourceError) {
        self.failures.insert(name.into(), error);
    }

    pub fn fail_listing(&mut self, error: SourceError) {
        self.listing_error = Some(error);
    }

    /// Number of `fetch_content` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RemoteSource for InMemorySource {
    fn label(&self) -> &str {
        &self.label
    }

    async fn list_versions(&self, _service: &str) -> Result<Vec<VersionRecord>, SourceError> {
        match &self.listing_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.versions.clone()),
        }
    }

    async fn fetch_content(
        &self,
        _service: &str,
        version: &str,
        name: &str,
    ) -> Result<String, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(e) = self.failures.get(name) {
            return Err(e.clone());
        }

        self.files
            .get(&(version.to_owned(), name.to_owned()))
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("{name} at version {version}")))
    }
}
