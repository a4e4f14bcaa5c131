//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from the `RUST_LOG` environment variable
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with an explicit filter such as `"info"` or
/// `"scene_runtime=trace"`
///
/// Safe to call more than once; later calls keep the first logger.
pub fn init_with_filter(filter: &str) {
    let result = env_logger::Builder::new()
        .parse_filters(filter)
        .format_timestamp_millis()
        .try_init();

    if result.is_err() {
        debug!("Logger already initialized, keeping existing configuration");
    }
}
