use std::sync::Arc;

use anyhow::{Context, Result};
use vcl_verify::{Feedback, RemoteSource, VerifyRun};
use vcl_verify_fastly::FastlyClient;

use crate::commands::format::{format_report, format_summary};
use crate::config::Settings;

/// Print feedback items to stderr.
pub fn print_feedback(feedback: &[Feedback]) {
    for item in feedback {
        eprintln!("{item}");
    }
}

/// Run one verification against an already-built source.
pub async fn run_with(source: Arc<dyn RemoteSource>, settings: &Settings) -> Result<VerifyRun> {
    let options = settings.verify_options();

    vcl_verify::run(source, &options)
        .await
        .with_context(|| format!("verification of service {} failed", settings.service))
}

/// Build the Fastly client, verify, and print one block per candidate.
///
/// Mismatches are reported, not returned as errors.
pub async fn run(settings: &Settings) -> Result<()> {
    let client = FastlyClient::new(settings.client_config())
        .context("could not create Fastly client")?;

    let run = run_with(Arc::new(client), settings).await?;

    print_feedback(&run.feedback);

    for report in &run.reports {
        println!("\n{}", format_report(report));
    }

    println!("\n{}", format_summary(&run));

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use vcl_verify::{MismatchCause, Verdict};
    use vcl_verify_fastly::FastlyClientConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::{FileConfig, Overrides};

    use super::*;

    fn settings_for(server: &MockServer, dir: PathBuf) -> Settings {
        let file = FileConfig {
            api_base_url: Some(server.uri()),
            ..FileConfig::default()
        };
        let overrides = Overrides {
            service: Some("svc123".into()),
            token: Some("test-token".into()),
            dir: Some(dir),
            ..Overrides::default()
        };
        Settings::resolve(overrides, file).unwrap()
    }

    #[tokio::test]
    async fn verifies_against_fastly_api() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/service/svc123/version"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[{"number":2},{"number":3},{"number":1}]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/service/svc123/version/3/vcl/x"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"name":"x","content":"sub vcl_recv {\n  return(pass); # always\n}\n"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/service/svc123/version/3/vcl/y"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.vcl"), "sub vcl_recv {\nreturn(pass);\n}\n").unwrap();
        std::fs::write(dir.path().join("y.vcl"), "sub vcl_deliver {}\n").unwrap();

        let settings = settings_for(&server, dir.path().to_path_buf());
        let client = FastlyClient::new(settings.client_config()).unwrap();
        let run = run_with(Arc::new(client), &settings).await.unwrap();

        assert_eq!(run.context.selected_version(), "3");
        assert_eq!(run.reports.len(), 2);

        let x = run.reports.iter().find(|r| r.logical_name == "x").unwrap();
        assert_eq!(x.verdict, Verdict::Match);

        let y = run.reports.iter().find(|r| r.logical_name == "y").unwrap();
        assert_eq!(y.verdict, Verdict::Mismatch);
        assert!(matches!(&y.cause, Some(MismatchCause::Retrieval(e)) if e.contains("not found")));
    }

    #[tokio::test]
    async fn listing_failure_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/service/svc123/version"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(&server, dir.path().to_path_buf());
        let client = FastlyClient::new(settings.client_config()).unwrap();

        let err = run_with(Arc::new(client), &settings).await.unwrap_err();
        assert!(format!("{err:#}").contains("authentication failed"));
    }

    #[test]
    fn empty_token_fails_client_construction() {
        let result = FastlyClient::new(FastlyClientConfig::default());
        assert!(result.is_err());
    }
}
