use tracing_subscriber::EnvFilter;

/// Filter variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "CMERGE_LOG";

/// Install the global stderr subscriber. `verbose` lifts the default level
/// from `warn` to `debug`; an explicit filter in the environment wins.
pub fn init(verbose: bool, no_color: bool) {
    let default_level = if verbose { "code_merger=debug,cmerge=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // Ignore the error if a subscriber is already set (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .try_init();
}
