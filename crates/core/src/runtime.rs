//! Single-threaded monoio runtime
//!
//! Every order and every TWAP slice runs on the calling thread, one request
//! at a time. The timer driver is always enabled: slice delays and transport
//! timeouts depend on it.

use monoio::{FusionDriver, RuntimeBuilder};
use tracing::debug;

/// Runtime wrapper that owns the driver choice for the whole workspace.
#[derive(Debug, Default)]
pub struct BotRuntime;

impl BotRuntime {
    pub fn new() -> Self {
        Self
    }

    /// Run a future to completion on a fresh runtime with the timer enabled.
    pub fn block_on<F>(&self, future: F) -> std::io::Result<F::Output>
    where
        F: std::future::Future,
    {
        let mut runtime = RuntimeBuilder::<FusionDriver>::new()
            .enable_timer()
            .build()?;
        debug!("▶️  Runtime started");
        let output = runtime.block_on(future);
        debug!("⏹️  Runtime stopped");
        Ok(output)
    }
}
