use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Logs go to stderr so stdout only carries the plugin output.
///
/// `RUST_LOG` takes precedence over `level`; `verbose` lowers the default to debug.
pub fn init_logging(verbose: bool, level: Level) {
    let level = if verbose { Level::DEBUG } else { level };

    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // http internals are noisy at debug
    for directive in ["hyper_util=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
