//! Tracing setup for the CLI.
//!
//! `RUST_LOG` wins when set; otherwise the configured `log_filter` applies.
//! Output goes to stderr so rendered SVG and JSON on stdout stay clean.

use tracing_subscriber::EnvFilter;

pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed (tests, embedding hosts).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
