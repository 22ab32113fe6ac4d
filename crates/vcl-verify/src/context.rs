use crate::version::ResolvedVersion;

/// Settings fixed before any concurrent work starts.
///
/// Built once per run and shared by reference with every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub service: String,
    pub version: ResolvedVersion,
}

impl RunContext {
    pub fn new(service: impl Into<String>, version: ResolvedVersion) -> Self {
        Self {
            service: service.into(),
            version,
        }
    }

    /// The version string used for every remote lookup in this run.
    pub fn selected_version(&self) -> &str {
        &self.version.selected
    }
}
