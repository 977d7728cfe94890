//! Log subscriber setup for the CLI. The library itself only emits `tracing`
//! events and never installs a subscriber.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// `RUST_LOG` wins when set. Logs go to stderr so `--json` output on stdout
/// stays machine-readable.
pub fn init_cli_logger(verbose: bool) {
    let fallback = if verbose {
        "cv_page=debug,info"
    } else {
        "cv_page=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
