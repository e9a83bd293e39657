use std::{env, path::PathBuf, sync::Once};

use tally_config::Config;

/// Environment variable selecting the base directory for config and data.
pub const HOME_ENV: &str = "TALLY_HOME";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber, writing to stderr so command output stays clean.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        for raw in ["tally=info", "tally_core=info"] {
            if let Ok(directive) = raw.parse() {
                filter = filter.add_directive(directive);
            }
        }

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

/// Base directory holding `config.json` and, by default, the data store.
pub fn app_base_dir() -> PathBuf {
    env::var_os(HOME_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_base_dir)
}
