use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use todo_tracker::config::{self, Config};

mod cli;

fn main() {
    let (config, config_error) = match config::load_config() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    init_logging(&config.log_filter);

    if let Some(e) = config_error {
        tracing::warn!("Using default configuration: {:#}", e);
    }

    cli::handle_cli(&config);
}

/// Logs go to stderr so command output stays clean. `RUST_LOG` wins over
/// the configured filter.
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
