//! Logging setup
//!
//! One `tracing-subscriber` registry per process. A set `RUST_LOG` replaces
//! the computed filter entirely. Debug builds print pretty lines, release
//! builds emit JSON events with their current span.

use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// HTTP transport crates that flood the output below `warn`
const TRANSPORT_TARGETS: [&str; 4] = ["hyper", "hyper_util", "h2", "rustls"];

/// Filter directives used when `RUST_LOG` is unset.
///
/// `level` applies globally; transport crates are capped at `warn`. An
/// unparseable level falls back to `info`.
pub fn default_directives(level: &str) -> String {
    let level = level.trim().parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);

    let mut directives = vec![level.to_string()];
    if level > LevelFilter::WARN {
        directives.extend(
            TRANSPORT_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, LevelFilter::WARN)),
        );
    }
    directives.join(",")
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let registry = tracing_subscriber::registry().with(filter);

    #[cfg(debug_assertions)]
    let installed = registry
        .with(fmt::layer().pretty().with_target(false))
        .try_init();

    #[cfg(not(debug_assertions))]
    let installed = registry
        .with(fmt::layer().json().with_current_span(true))
        .try_init();

    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_levels_cap_transport_crates() {
        assert_eq!(
            default_directives("debug"),
            "debug,hyper=warn,hyper_util=warn,h2=warn,rustls=warn"
        );
        assert!(default_directives("info").starts_with("info,hyper=warn"));
    }

    #[test]
    fn test_quiet_levels_stand_alone() {
        assert_eq!(default_directives("warn"), "warn");
        assert_eq!(default_directives(" ERROR "), "error");
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        assert!(default_directives("loud").starts_with("info,"));
    }
}
