//! Structured logging for the peekaboo server.
//!
//! Initializes a `tracing` subscriber with:
//! - `RUST_LOG` environment filter support
//! - Default filter: [`DEFAULT_FILTER`]
//! - JSON output when `PEEKABOO_LOG_FORMAT=json`
//! - Human-readable output otherwise

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "peekaboo=info,peekaboo_server=info,peekaboo_db=info,peekaboo_core=info,tower_http=info";

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "PEEKABOO_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON; anything else is human-readable.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }

    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the global tracing subscriber.
///
/// Call this once at program startup. Later calls are no-ops.
pub fn init_tracing() {
    init_tracing_with(LogFormat::from_env());
}

pub fn init_tracing_with(format: LogFormat) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Json => {
            let _ = subscriber.json().try_init();
        }
        LogFormat::Pretty => {
            let _ = subscriber.try_init();
        }
    }
}
