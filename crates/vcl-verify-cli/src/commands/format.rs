use colored::Colorize;
use vcl_verify::{MismatchCause, Report, VerifyRun};

/// Render one verdict block: a colored headline, the local path, and for
/// mismatches the cause and (in debug mode) the diff.
pub fn format_report(report: &Report) -> String {
    let mut out = String::new();

    if report.is_match() {
        out.push_str(
            &format!(
                "No difference between the version ({}) of '{}' and the version found locally",
                report.version, report.logical_name
            )
            .green()
            .to_string(),
        );
    } else {
        out.push_str(
            &format!(
                "There was a difference between the version ({}) of '{}' and the version found locally",
                report.version, report.logical_name
            )
            .red()
            .to_string(),
        );
    }

    out.push_str(&format!("\n\t{}", report.source_path.display()));

    match &report.cause {
        Some(MismatchCause::Retrieval(e)) => {
            out.push_str(&format!("\n\tremote lookup failed: {e}"));
        }
        Some(MismatchCause::LocalRead(e)) => {
            out.push_str(&format!("\n\tlocal file could not be read: {e}"));
        }
        Some(MismatchCause::Content) | None => {}
    }

    if let Some(diff) = &report.diff {
        out.push_str("\n\n");
        out.push_str(diff.trim_end());
    }

    out
}

pub fn format_summary(run: &VerifyRun) -> String {
    let line = format!(
        "{} file(s) checked against version {}: {} matched, {} differed",
        run.reports.len(),
        run.context.selected_version(),
        run.matched(),
        run.mismatched()
    );

    if run.mismatched() == 0 {
        line.bold().to_string()
    } else {
        line.yellow().bold().to_string()
    }
}
