//! Logging bootstrap demonstration.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p core-runtime --example logging_demo
//!
//! # JSON format
//! cargo run -p core-runtime --example logging_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run -p core-runtime --example logging_demo -- compact "core_runtime=trace"
//! ```

use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LogLevel, LoggingConfig};
use std::env;
use tracing::{debug, info, instrument, span, warn, Level};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_target(true);

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config).expect("Failed to initialize logging");

    info!(format = ?format, "Logging initialized");

    demo_structured_fields();
    demo_redaction();
    demo_instrumented_resolve("s-demo").await;
}

fn demo_structured_fields() {
    let span = span!(Level::INFO, "dashboard_load");
    let _enter = span.enter();

    info!(
        top_tracks = 20,
        playlists = 12,
        saved_albums = 48,
        "Dashboard sections loaded"
    );
    warn!(section = "recently_played", status = 429, "Section fetch rate limited");
}

fn demo_redaction() {
    let token = "demo_access_token_value";
    let email = "listener@example.com";

    info!(
        access_token = %redact_if_sensitive("access_token", token),
        email = %redact_if_sensitive("email", email),
        "Session established"
    );
}

#[instrument(fields(session_id = %session_id))]
async fn demo_instrumented_resolve(session_id: &str) {
    debug!("Resolving session");
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    info!(expires_in_secs = 3600, "Session resolved");
}
