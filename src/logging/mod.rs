use crate::config::LoggingSettings;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "battle_web=info";

fn env_filter() -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match DEFAULT_DIRECTIVE.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(settings: &LoggingSettings) {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());
    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}
