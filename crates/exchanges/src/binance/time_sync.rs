//! Request timestamps synchronized to exchange server time
//!
//! Signed requests carry `timestamp` and `recvWindow`. The timestamp comes
//! from `GET /fapi/v1/time` plus a fixed lead; when that lookup fails for any
//! reason the local clock is used and the request still goes out.

use crate::errors::{ExchangeError, Result};
use crate::http::{HttpMethod, HttpRequest};
use crate::traits::{Clock, HttpTransport};
use crate::types::ParameterSet;

use std::time::Duration;
use tracing::{debug, warn};

/// Server time endpoint
pub const TIME_PATH: &str = "/fapi/v1/time";

/// Validity window attached to every signed request
pub const RECV_WINDOW_MS: u64 = 15_000;

/// Lead added to server time when stamping a request
pub const SERVER_TIME_OFFSET_MS: u64 = 500;

/// Timeout for the time lookup
pub const TIME_SYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a request timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// `serverTime + SERVER_TIME_OFFSET_MS`
    Server,
    /// Local wall clock after a failed or skipped lookup
    Local,
}

/// Timestamp to stamp onto a signed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedTimestamp {
    pub millis: u64,
    pub source: TimeSource,
}

/// `GET {base}/fapi/v1/time` and extract `serverTime`
pub async fn fetch_server_time<T: HttpTransport + ?Sized>(transport: &T, base_url: &str) -> Result<u64> {
    let request = HttpRequest::new(
        HttpMethod::Get,
        format!("{base_url}{TIME_PATH}"),
        "",
        TIME_SYNC_TIMEOUT,
    );
    let response = transport.send(&request).await?;

    if !response.is_success() {
        return Err(ExchangeError::Api {
            status: response.status,
            code: None,
            msg: response.body,
        });
    }

    let body: serde_json::Value = serde_json::from_str(&response.body)?;
    body.get("serverTime")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| ExchangeError::SerializationError(format!("Missing serverTime in {}", response.body)))
}

/// Server time plus lead, or the local clock when the lookup fails.
pub async fn current_signed_timestamp<T, C>(transport: &T, clock: &C, base_url: &str) -> SignedTimestamp
where
    T: HttpTransport + ?Sized,
    C: Clock + ?Sized,
{
    let led = fetch_server_time(transport, base_url).await.and_then(|server_time| {
        debug!("🕒 Server time {}", server_time);
        server_time
            .checked_add(SERVER_TIME_OFFSET_MS)
            .ok_or_else(|| ExchangeError::SerializationError(format!("serverTime {server_time} out of range")))
    });

    match led {
        Ok(millis) => SignedTimestamp {
            millis,
            source: TimeSource::Server,
        },
        Err(e) => {
            warn!("Could not fetch server time, falling back to local time: {}", e);
            local_timestamp(clock)
        }
    }
}

/// Local wall-clock timestamp
pub fn local_timestamp<C: Clock + ?Sized>(clock: &C) -> SignedTimestamp {
    SignedTimestamp {
        millis: clock.now_ms(),
        source: TimeSource::Local,
    }
}

/// Append `timestamp` then `recvWindow` after the caller's fields
pub fn stamp(mut params: ParameterSet, timestamp: SignedTimestamp) -> ParameterSet {
    params.push("timestamp", timestamp.millis.to_string());
    params.push("recvWindow", RECV_WINDOW_MS.to_string());
    params
}
