//! Log setup for the CLI.
//!
//! Events go to stderr so command output on stdout stays parseable.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the default filter
const LOG_ENV: &str = "STRATUM_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber.
///
/// Priority: `--log` flag > `STRATUM_LOG` > `warn`.
pub fn init(flag: Option<&str>) {
    let filter = match flag {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
