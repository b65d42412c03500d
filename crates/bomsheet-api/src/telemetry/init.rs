use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "bomsheet=debug,tower_http=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Initialize tracing. `log_format` is "json" for structured output, anything else for the
/// compact console format.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_telemetry(log_format: &str, environment: &str) {
    let result = if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        // Console: compact format. Structured fields stay on the event line.
        let console_fmt = tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        );
        tracing_subscriber::registry()
            .with(env_filter())
            .with(console_fmt)
            .try_init()
    };

    match result {
        Ok(()) => tracing::info!(log_format, environment, "Tracing initialized"),
        Err(_) => tracing::debug!("Tracing subscriber already set"),
    }
}
