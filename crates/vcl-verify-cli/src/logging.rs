use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set. Otherwise only warnings are shown, or debug
/// output for the vcl-verify crates when `debug` is on.
pub fn init(debug: bool) {
    let default_directive = if debug {
        "warn,vcl_verify=debug,vcl_verify_fastly=debug,vcl_verify_cli=debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
