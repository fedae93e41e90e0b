use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Default directives when `RUST_LOG` is unset. sqlx statement logs are noisy at info.
const COMPACT_DIRECTIVES: &str = "info,tower_http=info,axum=info,sqlx=warn";
/// Payment round-trips stay visible in structured output.
const JSON_DIRECTIVES: &str = "info,sqlx=warn,service::payment=debug";

fn filter_or(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Human-readable compact lines on stdout.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(filter_or(COMPACT_DIRECTIVES))
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event on stdout, targets included so services can be filtered downstream.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(filter_or(JSON_DIRECTIVES))
        .with_target(true)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// `"json"` selects structured output; anything else is compact. A second call is a no-op.
pub fn init_logging(format: &str) {
    if format.eq_ignore_ascii_case("json") {
        init_logging_json();
    } else {
        init_logging_default();
    }
}
