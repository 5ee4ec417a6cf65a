use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber so stdout stays free for JSON Lines.
/// `RUST_LOG` wins over the default filter.
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("daily_arxiv={level},daily_arxiv_core={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
