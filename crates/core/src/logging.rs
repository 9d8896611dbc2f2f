//! Unified logging
//!
//! One `tracing` subscriber for every crate. `RUST_LOG` overrides the default
//! `info` filter.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Initialize logging with the default `info` filter. Safe to call repeatedly.
pub fn init_logging() {
    init_logging_with("info");
}

/// Initialize logging with `default_filter` unless `RUST_LOG` is set.
pub fn init_logging_with(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .finish();

        // A subscriber installed by a test harness or host application wins.
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::debug!("📝 Initialized tracing logging");
        }
    });
}

#[macro_export]
macro_rules! log_order {
    ($action:expr, $symbol:expr, $side:expr, $quantity:expr) => {
        tracing::info!("📋 ORDER {}: {} {} qty={}", $action, $side, $symbol, $quantity);
    };
}

#[macro_export]
macro_rules! log_error {
    ($operation:expr, $error:expr) => {
        tracing::error!("❌ {} failed: {}", $operation, $error);
    };
}
