//! Telemetry and Observability
//!
//! Sets up `tracing-subscriber` for structured logging. Output goes to stderr
//! so the chat REPL on stdout stays readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with the given log level.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter. Outside of our own
/// crates only warnings are shown, which keeps reqwest/hyper quiet.
///
/// In debug builds: pretty-printed terminal output.
/// In release builds: JSON structured output with spans.
///
/// Calling this more than once is harmless; only the first call installs a
/// subscriber.
pub fn init_telemetry_with_level(log_level: &str) {
    let default_filter = format!(
        "warn,librarian_engine={lvl},librarian={lvl}",
        lvl = log_level
    );

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }
}
