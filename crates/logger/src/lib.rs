mod subscriber;

pub use subscriber::{LogFormat, init, init_with_level};

/// Initialize the global subscriber at INFO, honouring `RUST_LOG` and `RUST_LOG_FORMAT`.
pub fn init_tracing() {
    init();
}
