//! # BasicBot Exchange Integrations
//!
//! Signed order entry for Binance USDT-M futures.
//!
//! ## Architecture
//!
//! - **monoio-based HTTP client** - single-threaded async, one request at a time
//! - **Injected collaborators** - transport and clock arrive at construction
//! - **Exact signing** - parameters keep insertion order from build to wire
//! - **Fixed-point arithmetic** - exact decimal quantities and prices

pub mod binance;
pub mod errors;
pub mod http;
pub mod traits;
pub mod types;

// Re-export main types
pub use binance::{FuturesConfig, FuturesRestClient, OrderRequest, TwapRun};
pub use errors::{ApiErrorCode, ErrorKind, ExchangeError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, MonoioHttpsClient};
pub use traits::{Clock, HttpTransport, SystemClock};
pub use types::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::binance::{FuturesConfig, FuturesRestClient, OrderRequest, SliceResult, TwapPlan, TwapRun};
    pub use crate::errors::{ErrorKind, ExchangeError, Result};
    pub use crate::http::{HttpMethod, MonoioHttpsClient};
    pub use crate::traits::{Clock, HttpTransport, SystemClock};
    pub use crate::types::*;
    pub use basicbot_core::prelude::*;
}
