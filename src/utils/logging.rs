use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::{level_filters::LevelFilter, warn};
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    filter::ParseError, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub const CLI_PREFIX: &str = "commitstreak";

const KEPT_LOG_FILES: usize = 5;

fn crate_target() -> String {
    env!("CARGO_PKG_NAME").replace('-', "_")
}

/// Filter directive for the logs. An explicit level wins over `RUST_LOG`, which in turn wins over
/// `debug`. A bare level is scoped to this crate, anything with targets is used as written.
pub fn filter_directive(log_level: Option<LevelFilter>, rust_log: Option<String>) -> String {
    if let Some(level) = log_level {
        return format!("{}={}", crate_target(), level.to_string().to_lowercase());
    }
    match rust_log.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(directive) if directive.contains('=') || directive.contains(',') => directive,
        Some(level) => format!("{}={level}", crate_target()),
        None => format!("{}=debug", crate_target()),
    }
}

/// Parses `directive`, falling back to the crate's default when it isn't valid. The parse error
/// is handed back so it can be logged once a subscriber exists.
pub fn parse_filter(directive: &str) -> (EnvFilter, Option<ParseError>) {
    match EnvFilter::try_new(directive) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(format!("{}=debug", crate_target())), Some(e)),
    }
}

/// Sends logs into a daily rotated file under `<application_data_path>/logs`. With `show_std`
/// they are mirrored to the console as well.
pub fn enable_logging(
    prefix: &str,
    application_data_path: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(KEPT_LOG_FILES)
        .filename_prefix(prefix)
        .build(application_data_path.join("logs"))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE);

    let console_layer = show_std.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    });

    let directive = filter_directive(log_level, std::env::var("RUST_LOG").ok());
    let (filter, parse_error) = parse_filter(&directive);
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    if let Some(e) = parse_error {
        warn!("Ignoring log filter {directive:?}: {e}");
    }
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    // Test modules race for the global subscriber, the first one wins
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .try_init();
});
