// 📝 Logging - tracing subscriber setup shared by both binaries
//
// Precedence: an explicit level flag > RUST_LOG > info.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Build the filter from a `RUST_LOG` value and an optional level flag.
///
/// The flag's level is only added when a flag was given, so a global level in
/// `RUST_LOG` is not shadowed by the default. An unparseable `RUST_LOG` falls
/// back to `info`.
pub fn log_filter(rust_log: Option<&str>, flag: Option<Level>) -> EnvFilter {
    let from_env = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok());

    match (from_env, flag) {
        (Some(filter), Some(level)) => filter.add_directive(level.into()),
        (Some(filter), None) => filter,
        (None, level) => EnvFilter::builder()
            .with_default_directive(level.unwrap_or(Level::INFO).into())
            .parse_lossy(""),
    }
}

/// Install the global fmt subscriber
pub fn init(flag: Option<Level>) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), flag))
        .with_target(false)
        .init();
}
