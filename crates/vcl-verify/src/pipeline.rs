use std::path::PathBuf;
use std::sync::Arc;

use crate::context::RunContext;
use crate::dispatch::{DispatchOptions, dispatch};
use crate::feedback::Feedback;
use crate::path::{DiscoveryError, FilterOptions, PathFilter, WalkErrorPolicy, discover};
use crate::report::{Report, report_all};
use crate::source::{RemoteSource, SourceError};
use crate::version::{self, VersionError};

/// Errors that stop a run before any comparison is reported.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("failed to list versions for service {service}: {source}")]
    Listing {
        service: String,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("directory walk did not complete: {0}")]
    WalkTask(#[from] tokio::task::JoinError),
}

/// Everything one verification run needs.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub service: String,
    pub version_override: Option<String>,
    pub root: PathBuf,
    pub filter: FilterOptions,
    pub walk_errors: WalkErrorPolicy,
    pub dispatch: DispatchOptions,
    pub debug: bool,
}

/// A finished run.
#[derive(Debug)]
pub struct VerifyRun {
    pub context: RunContext,
    pub reports: Vec<Report>,
    pub feedback: Vec<Feedback>,
}

impl VerifyRun {
    pub fn matched(&self) -> usize {
        self.reports.iter().filter(|r| r.is_match()).count()
    }

    pub fn mismatched(&self) -> usize {
        self.reports.len() - self.matched()
    }
}

/// Resolve the version, discover local files, fetch them all, and compare.
///
/// Only configuration problems and a failed version listing are errors.
/// Per-file failures end up as mismatching reports.
pub async fn run(
    source: Arc<dyn RemoteSource>,
    options: &VerifyOptions,
) -> Result<VerifyRun, VerifyError> {
    let filter = PathFilter::new(&options.filter)?;

    let records = source
        .list_versions(&options.service)
        .await
        .map_err(|source| VerifyError::Listing {
            service: options.service.clone(),
            source,
        })?;
    let resolved = version::resolve(&records, options.version_override.as_deref())?;
    let context = RunContext::new(options.service.clone(), resolved);

    // walkdir blocks, so the walk runs off the async workers.
    let root = options.root.clone();
    let policy = options.walk_errors;
    let discovery =
        tokio::task::spawn_blocking(move || discover(&root, &filter, policy)).await??;
    let mut feedback = discovery.feedback;

    if discovery.candidates.is_empty() {
        feedback.push(Feedback::warning(format!(
            "no candidate files found under {}",
            options.root.display()
        )));
    } else {
        feedback.push(Feedback::info(format!(
            "comparing {} file(s) against version {} of {}",
            discovery.candidates.len(),
            context.selected_version(),
            source.label()
        )));
    }

    let outcomes = dispatch(source, &context, discovery.candidates, options.dispatch).await;
    let reports = report_all(&context, outcomes, options.debug).await;

    Ok(VerifyRun {
        context,
        reports,
        feedback,
    })
}
