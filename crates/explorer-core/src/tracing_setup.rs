use std::fs::OpenOptions;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Env var naming an extra log file that receives DEBUG output
pub const LOG_FILE_ENV: &str = "EXPLORER_LOG_FILE";

/// Install the global subscriber: stderr filtered by `RUST_LOG` (default
/// `info`), plus a DEBUG file layer when `EXPLORER_LOG_FILE` is set.
pub fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let file_logging = std::env::var(LOG_FILE_ENV).ok();
    let file = file_logging.as_deref().and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", log_path, e);
                None
            }
        }
    });

    if let Some(file) = file {
        let file_layer = fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_filter(LevelFilter::DEBUG);

        let _ = registry.with(file_layer).try_init();
    } else {
        let _ = registry.try_init();
    }
}
