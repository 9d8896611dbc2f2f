//! # BasicBot Core
//!
//! Runtime-neutral building blocks shared by the futures client and the CLI.
//!
//! 1. **Single-threaded async with monoio** - one request in flight at a time
//! 2. **Exact decimals** - quantities and prices never pass through floats on the wire
//! 3. **Epoch-millisecond timing** - the exchange's unit for timestamps
//! 4. **Unified logging** - one tracing subscriber for every crate

pub mod fixed;
pub mod logging;
pub mod runtime;
pub mod timing;

pub use fixed::{Fixed, FixedError};
pub use logging::{init_logging, init_logging_with};
pub use runtime::BotRuntime;
pub use timing::{PerfTimer, Timestamp, epoch_millis, nanos};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixed::{Fixed, FixedError};
    pub use crate::logging::init_logging;
    pub use crate::runtime::BotRuntime;
    pub use crate::timing::{PerfTimer, Timestamp, epoch_millis, nanos};

    pub use monoio;
    pub use serde::{Deserialize, Serialize};
}
