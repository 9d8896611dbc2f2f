//! Binance USDT-M futures integration
//!
//! Signed REST order entry over monoio: request signing, server-time
//! stamping, response classification, order construction and TWAP slicing.

pub mod auth;
pub mod order;
pub mod rest;
pub mod time_sync;
pub mod twap;

pub use auth::{API_KEY_HEADER, Credentials, sign};
pub use order::{DEFAULT_TIME_IN_FORCE, ORDER_PATH, OrderRequest, build_order};
pub use rest::{
    FuturesConfig, FuturesRestClient, MAINNET_BASE_URL, REQUEST_TIMEOUT, TESTNET_BASE_URL, classify_response,
};
pub use time_sync::{RECV_WINDOW_MS, SERVER_TIME_OFFSET_MS, SignedTimestamp, TIME_PATH, TIME_SYNC_TIMEOUT, TimeSource};
pub use twap::{DEFAULT_TWAP_DURATION_SECS, DEFAULT_TWAP_SLICES, SliceResult, TwapPlan, TwapRun};
