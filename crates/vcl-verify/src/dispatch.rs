use std::borrow::Cow;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::context::RunContext;
use crate::path::Candidate;
use crate::source::{RemoteSource, SourceError};

/// The remote side of one candidate, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub source_path: PathBuf,
    pub logical_name: String,
    pub content: Result<String, SourceError>,
}

impl FetchOutcome {
    /// Remote text, or `error: <cause>` standing in for it.
    pub fn content_text(&self) -> Cow<'_, str> {
        match &self.content {
            Ok(text) => Cow::Borrowed(text),
            Err(e) => Cow::Owned(format!("error: {e}")),
        }
    }

    pub fn error(&self) -> Option<&SourceError> {
        self.content.as_ref().err()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Upper bound on in-flight fetches. `None` starts every fetch at once.
    pub max_concurrency: Option<NonZeroUsize>,
}

/// Fetch the remote counterpart of every candidate concurrently.
///
/// One task per candidate. Each task publishes exactly one outcome, failed
/// lookups included, into a channel with one slot per candidate, so no
/// send ever waits on the consumer. This returns once every task has
/// finished; the returned receiver holds all outcomes, in completion order,
/// and is already closed.
pub async fn dispatch(
    source: Arc<dyn RemoteSource>,
    context: &RunContext,
    candidates: Vec<Candidate>,
    options: DispatchOptions,
) -> mpsc::Receiver<FetchOutcome> {
    let (tx, rx) = mpsc::channel(candidates.len().max(1));
    let limit = options
        .max_concurrency
        .map(|n| Arc::new(Semaphore::new(n.get())));

    tracing::debug!(
        candidates = candidates.len(),
        service = %context.service,
        version = %context.selected_version(),
        "dispatching fetches"
    );

    let mut tasks = JoinSet::new();

    for candidate in candidates {
        let source = Arc::clone(&source);
        let tx = tx.clone();
        let limit = limit.clone();
        let service = context.service.clone();
        let version = context.selected_version().to_owned();

        tasks.spawn(async move {
            let _permit = match limit {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };

            // A panicking client must still yield an outcome for this path.
            let name = candidate.logical_name.clone();
            let fetch = tokio::spawn(async move {
                fetch_one(source.as_ref(), &service, &version, &name).await
            });
            let content = fetch
                .await
                .unwrap_or_else(|e| Err(SourceError::Other(format!("fetch task failed: {e}"))));

            let outcome = FetchOutcome {
                source_path: candidate.path,
                logical_name: candidate.logical_name,
                content,
            };

            if tx.send(outcome).await.is_err() {
                tracing::error!("result channel closed before all outcomes were sent");
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "fetch task did not complete");
        }
    }

    drop(tx);
    rx
}

async fn fetch_one(
    source: &dyn RemoteSource,
    service: &str,
    version: &str,
    name: &str,
) -> Result<String, SourceError> {
    if name.is_empty() {
        return Err(SourceError::Other("file name has no logical name".into()));
    }

    tracing::debug!(name, version, "fetching remote file");

    let result = source.fetch_content(service, version, name).await;

    if let Err(e) = &result {
        tracing::debug!(name, error = %e, "remote fetch failed");
    }

    result
}
