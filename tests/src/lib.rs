//! Shared fakes for the BasicBot test suites
//!
//! Everything here runs offline: the transport answers from a script and the
//! clock only moves when a test sleeps on it.

use async_trait::async_trait;
use basicbot_core::{BotRuntime, Fixed};
use basicbot_exchanges::binance::TIME_PATH;
use basicbot_exchanges::{
    Clock, ExchangeError, FuturesConfig, FuturesRestClient, HttpRequest, HttpResponse, HttpTransport, Result,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

pub const TEST_API_KEY: &str = "test_api_key";
pub const TEST_API_SECRET: &str = "test_api_secret";
pub const TEST_BASE_URL: &str = "https://testnet.binancefuture.com";

/// Server time the scripted time endpoint reports
pub const SERVER_TIME_MS: u64 = 1_700_000_000_000;

/// Local wall clock the manual clock starts at
pub const LOCAL_TIME_MS: u64 = 1_690_000_000_000;

/// Transport that answers the time endpoint separately from everything else.
///
/// Non-time requests consume the script front to back; once it runs dry
/// they get a generic `NEW` order acknowledgement.
pub struct ScriptedTransport {
    time_reply: Result<HttpResponse>,
    script: RefCell<VecDeque<Result<HttpResponse>>>,
    requests: RefCell<Vec<HttpRequest>>,
    next_order_id: Cell<u64>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            time_reply: Ok(HttpResponse::new(200, format!(r#"{{"serverTime":{SERVER_TIME_MS}}}"#))),
            script: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
            next_order_id: Cell::new(1),
        }
    }

    /// Time endpoint fails with a connection error
    pub fn without_server_time(mut self) -> Self {
        self.time_reply = Err(ExchangeError::ConnectionFailed("time endpoint unreachable".to_string()));
        self
    }

    pub fn with_time_reply(mut self, reply: Result<HttpResponse>) -> Self {
        self.time_reply = reply;
        self
    }

    pub fn then_respond(self, status: u16, body: &str) -> Self {
        self.script
            .borrow_mut()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn then_fail(self, error: ExchangeError) -> Self {
        self.script.borrow_mut().push_back(Err(error));
        self
    }

    /// Every request seen, time lookups included
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// Requests other than time lookups
    pub fn order_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| !is_time_request(r))
            .cloned()
            .collect()
    }

    pub fn time_requests(&self) -> usize {
        self.requests.borrow().iter().filter(|r| is_time_request(r)).count()
    }

    fn default_ack(&self) -> HttpResponse {
        let order_id = self.next_order_id.get();
        self.next_order_id.set(order_id + 1);
        HttpResponse::new(200, order_ack_body(order_id))
    }
}

#[async_trait(?Send)]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());

        if is_time_request(request) {
            return self.time_reply.clone();
        }

        let scripted = self.script.borrow_mut().pop_front();
        match scripted {
            Some(reply) => reply,
            None => Ok(self.default_ack()),
        }
    }
}

fn is_time_request(request: &HttpRequest) -> bool {
    request.url.ends_with(TIME_PATH)
}

/// Clock that only advances when slept on, recording every sleep
pub struct ManualClock {
    now_ms: Cell<u64>,
    sleeps: RefCell<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(LOCAL_TIME_MS)
    }
}

impl ManualClock {
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

#[async_trait(?Send)]
impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.now_ms.set(self.now_ms.get() + duration.as_millis() as u64);
    }
}

/// Testnet config with throwaway credentials
pub fn test_config() -> FuturesConfig {
    FuturesConfig::testnet()
        .with_credentials(TEST_API_KEY, TEST_API_SECRET)
        .with_timing(false)
}

pub type TestClient = FuturesRestClient<ScriptedTransport, ManualClock>;

pub fn live_client(transport: ScriptedTransport) -> TestClient {
    FuturesRestClient::with_collaborators(test_config(), transport, ManualClock::default())
        .expect("test config is valid")
}

pub fn dry_run_client(transport: ScriptedTransport) -> TestClient {
    FuturesRestClient::with_collaborators(test_config().with_dry_run(true), transport, ManualClock::default())
        .expect("test config is valid")
}

/// A minimal `POST /fapi/v1/order` acknowledgement
pub fn order_ack_body(order_id: u64) -> String {
    format!(
        r#"{{"orderId":{order_id},"symbol":"BTCUSDT","status":"NEW","clientOrderId":"test_{order_id}","type":"MARKET","side":"BUY"}}"#
    )
}

pub fn qty(s: &str) -> Fixed {
    Fixed::from_str_exact(s).expect("valid decimal literal")
}

/// `units * 10^-scale` as an exact decimal, e.g. `scaled(1234, 2)` is `12.34`
pub fn scaled(units: u64, scale: u32) -> Fixed {
    let digits = format!("{:0>width$}", units, width = scale as usize + 1);
    let (whole, frac) = digits.split_at(digits.len() - scale as usize);
    if frac.is_empty() {
        qty(whole)
    } else {
        qty(&format!("{whole}.{frac}"))
    }
}

/// Split a query string into its `(key, value)` pairs, still encoded
pub fn query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Drive a future on a fresh single-threaded runtime
pub fn block_on<F: Future>(future: F) -> F::Output {
    BotRuntime::new()
        .block_on(future)
        .expect("failed to build monoio runtime")
}
