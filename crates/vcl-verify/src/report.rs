use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::context::RunContext;
use crate::diff;
use crate::dispatch::FetchOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Match,
    Mismatch,
}

/// Why a comparison came out as a mismatch, beyond differing content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MismatchCause {
    /// Both sides were read and their normalized content differs.
    Content,
    /// The remote lookup failed; holds the error text.
    Retrieval(String),
    /// The local file could not be read; holds the I/O error text.
    LocalRead(String),
}

/// The verdict for one candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Report {
    pub version: String,
    pub logical_name: String,
    pub source_path: PathBuf,
    pub verdict: Verdict,
    pub cause: Option<MismatchCause>,
    /// Unified diff, kept only for mismatches in debug mode.
    pub diff: Option<String>,
}

impl Report {
    pub fn is_match(&self) -> bool {
        self.verdict == Verdict::Match
    }
}

/// Compare one fetched file with its local copy.
///
/// Never fails: a failed fetch or an unreadable local file is a mismatch.
pub async fn compare_outcome(context: &RunContext, outcome: &FetchOutcome, debug: bool) -> Report {
    let mut report = Report {
        version: context.selected_version().to_owned(),
        logical_name: outcome.logical_name.clone(),
        source_path: outcome.source_path.clone(),
        verdict: Verdict::Mismatch,
        cause: None,
        diff: None,
    };

    let local = match tokio::fs::read_to_string(&outcome.source_path).await {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(path = %outcome.source_path.display(), error = %e, "local read failed");
            report.cause = Some(MismatchCause::LocalRead(e.to_string()));
            return report;
        }
    };

    let remote = outcome.content_text();
    let remote_label = format!("{} (version {})", outcome.logical_name, report.version);
    let local_label = outcome.source_path.display().to_string();
    let comparison = diff::compare(&remote, &local, (remote_label.as_str(), local_label.as_str()));

    // A failed lookup never counts as a match, whatever the local file says.
    match (outcome.error(), comparison.matches) {
        (None, true) => report.verdict = Verdict::Match,
        (Some(e), _) => report.cause = Some(MismatchCause::Retrieval(e.to_string())),
        (None, false) => report.cause = Some(MismatchCause::Content),
    }

    if debug && !report.is_match() {
        report.diff = comparison.diff;
    }

    tracing::debug!(
        name = %report.logical_name,
        path = %report.source_path.display(),
        verdict = ?report.verdict,
        "compared"
    );

    report
}

/// Drain every outcome and compare each one, in arrival order.
pub async fn report_all(
    context: &RunContext,
    mut outcomes: mpsc::Receiver<FetchOutcome>,
    debug: bool,
) -> Vec<Report> {
    let mut reports = Vec::new();
    while let Some(outcome) = outcomes.recv().await {
        reports.push(compare_outcome(context, &outcome, debug).await);
    }
    reports
}
