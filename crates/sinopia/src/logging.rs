//! Logging bootstrap for the CLI.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `SINOPIA_LOG=debug`.
pub const LOG_ENV: &str = "SINOPIA_LOG";

/// Install the stderr subscriber. Filters come from `SINOPIA_LOG` and default
/// to `warn`, so reactive warnings and uncaught errors are visible.
pub fn init_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        // a subscriber installed by an embedding program wins
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}
