//! Collaborators injected into the futures client
//!
//! The client never reaches for a global session or the system clock directly;
//! both arrive through these traits at construction. Futures are `?Send`
//! because monoio sockets live on one thread.

use crate::errors::Result;
use crate::http::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::time::Duration;

/// Perform one HTTP request and return status + body.
///
/// Implementations report network-layer failures as
/// `NetworkError`/`ConnectionFailed`/`Timeout` and must not retry.
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Local wall clock and the delay primitive used between TWAP slices.
#[async_trait(?Send)]
pub trait Clock {
    /// Milliseconds since Unix epoch
    fn now_ms(&self) -> u64;

    async fn sleep(&self, duration: Duration);
}

/// System clock backed by the monoio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait(?Send)]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        basicbot_core::epoch_millis()
    }

    async fn sleep(&self, duration: Duration) {
        monoio::time::sleep(duration).await;
    }
}
