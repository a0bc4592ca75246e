//! Logging initialisation
//!
//! Events go to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` takes precedence over `--log`; without either the level is
//! `info`. `NO_COLOR` disables ANSI colours.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither `RUST_LOG` nor `--log` is given
const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber
pub fn init_logging(filter: Option<&str>) {
    let env_filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(filter.unwrap_or(DEFAULT_FILTER))
    };

    // A subscriber may already be installed (tests); keep that one
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var_os("NO_COLOR").is_none()),
        )
        .with(env_filter)
        .try_init();
}
