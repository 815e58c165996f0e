//! Tracing setup for hosts that embed the kernel.
//!
//! ## Environment
//!
//! - `RUST_LOG`: filter directives (default: `cruise_kernel=info`)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

const DEFAULT_FILTER: &str = "cruise_kernel=info";

/// Install a global subscriber.
///
/// Fails without side effects when the host already installed one.
pub fn init_tracing() -> Result<(), TryInitError> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .try_init()
    }
}
