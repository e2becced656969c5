use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize logging.  If the environment variable `RUST_LOG` is set to a
/// non-empty value we interpret it through `EnvFilter` and enable compact
/// output; shell wrappers frequently export RUST_LOG unconditionally but
/// empty, and an empty value should not be read as a desire for logging.
pub fn init_logging() {
    INIT.call_once(|| {
        if let Ok(rustlog) = std::env::var("RUST_LOG") {
            if !rustlog.is_empty() {
                if let Ok(env_filter) = EnvFilter::try_from_default_env() {
                    tracing_subscriber::fmt()
                        .compact()
                        // These logs get excerpted into plain-text contexts,
                        // so ANSI isn't helpful.
                        .with_ansi(false)
                        // Wall time takes up a lot of columns and rarely
                        // matters for a cursor-driven tool.
                        .without_time()
                        .with_env_filter(env_filter)
                        .init();
                }
            }
        }
    });
}
