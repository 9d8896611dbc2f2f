//! Binance USDT-M futures REST client
//!
//! - Single-threaded async with monoio, one request in flight at a time
//! - Transport and clock injected at construction
//! - Signed requests stamped with server time and signed over the exact wire string
//! - Two error channels: non-2xx status, and a negative `code` inside a 2xx body

use crate::binance::auth::{API_KEY_HEADER, Credentials};
use crate::binance::order::{ORDER_PATH, OrderRequest};
use crate::binance::time_sync::{current_signed_timestamp, fetch_server_time, local_timestamp, stamp};
use crate::errors::{ExchangeError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, MonoioHttpsClient};
use crate::traits::{Clock, HttpTransport, SystemClock};
use crate::types::{DryRunEcho, ExecutionResult, ParameterSet};
use basicbot_core::{Fixed, PerfTimer, log_order};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

/// Futures testnet
pub const TESTNET_BASE_URL: &str = "https://testnet.binancefuture.com";

/// Futures production
pub const MAINNET_BASE_URL: &str = "https://fapi.binance.com";

/// Timeout for trading calls
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Binance futures client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct FuturesConfig {
    pub api_key: String,
    #[serde(skip_serializing, default)]
    pub api_secret: String,
    pub base_url: String,
    pub testnet: bool,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub enable_timing: bool,
}

impl Default for FuturesConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

impl FuturesConfig {
    pub fn testnet() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            base_url: TESTNET_BASE_URL.to_string(),
            testnet: true,
            dry_run: false,
            enable_timing: true,
        }
    }

    pub fn mainnet() -> Self {
        Self {
            base_url: MAINNET_BASE_URL.to_string(),
            testnet: false,
            ..Self::testnet()
        }
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self.api_secret = api_secret.into();
        self
    }

    /// Read `BINANCE_API_KEY` / `BINANCE_API_SECRET`
    pub fn with_env_credentials(mut self) -> Result<Self> {
        let api_key = std::env::var("BINANCE_API_KEY")
            .map_err(|_| ExchangeError::MissingCredentials("BINANCE_API_KEY".to_string()))?;
        let api_secret = std::env::var("BINANCE_API_SECRET")
            .map_err(|_| ExchangeError::MissingCredentials("BINANCE_API_SECRET".to_string()))?;

        self.api_key = api_key;
        self.api_secret = api_secret;
        Ok(self)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_timing(mut self, enable: bool) -> Self {
        self.enable_timing = enable;
        self
    }

    fn credentials(&self) -> Result<Credentials> {
        let credentials = Credentials::new(&self.api_key, &self.api_secret);
        if !credentials.is_valid() {
            return Err(ExchangeError::InvalidCredentials);
        }
        Ok(credentials)
    }
}

impl fmt::Debug for FuturesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuturesConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("testnet", &self.testnet)
            .field("dry_run", &self.dry_run)
            .field("enable_timing", &self.enable_timing)
            .finish()
    }
}

/// Signed futures REST client
///
/// Owns the credentials and the transport session for its whole lifetime.
/// Dry-run is fixed at construction and applies to every operation.
pub struct FuturesRestClient<T = MonoioHttpsClient, C = SystemClock> {
    config: FuturesConfig,
    credentials: Credentials,
    transport: T,
    clock: C,
}

impl FuturesRestClient {
    /// Client over the monoio HTTPS transport and the system clock.
    ///
    /// The API key header is installed on the session here, once.
    pub fn new(config: FuturesConfig) -> Result<Self> {
        let credentials = config.credentials()?;
        let transport = MonoioHttpsClient::new()?.with_default_header(API_KEY_HEADER, credentials.api_key());
        Self::assemble(config, credentials, transport, SystemClock)
    }
}

impl<T: HttpTransport, C: Clock> FuturesRestClient<T, C> {
    /// Client over caller-supplied collaborators
    pub fn with_collaborators(config: FuturesConfig, transport: T, clock: C) -> Result<Self> {
        let credentials = config.credentials()?;
        Self::assemble(config, credentials, transport, clock)
    }

    fn assemble(config: FuturesConfig, credentials: Credentials, transport: T, clock: C) -> Result<Self> {
        url::Url::parse(&config.base_url)?;

        info!("🔗 Binance futures client created");
        info!("   Base URL: {}", config.base_url);
        info!("   Dry run: {}", config.dry_run);

        Ok(Self {
            config,
            credentials,
            transport,
            clock,
        })
    }

    pub fn config(&self) -> &FuturesConfig {
        &self.config
    }

    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// `GET /fapi/v1/time`, unsigned. Dry-run answers from the local clock.
    pub async fn server_time(&self) -> Result<u64> {
        if self.config.dry_run {
            return Ok(self.clock.now_ms());
        }
        fetch_server_time(&self.transport, &self.config.base_url).await
    }

    /// Like [`execute`](Self::execute) with the method given by name.
    ///
    /// Anything but GET/POST/DELETE fails before signing or any I/O.
    pub async fn request(&self, method: &str, path: &str, params: ParameterSet, signed: bool) -> Result<ExecutionResult> {
        let method: HttpMethod = method.parse()?;
        self.execute(method, path, params, signed).await
    }

    /// Build, sign, send and classify one request. Never retries.
    pub async fn execute(&self, method: HttpMethod, path: &str, params: ParameterSet, signed: bool) -> Result<ExecutionResult> {
        let _timer = self
            .config
            .enable_timing
            .then(|| PerfTimer::start(format!("binance_futures_{method}_{path}")));

        let url = format!("{}{}", self.config.base_url, path);
        let params = if signed { self.sign_params(params).await } else { params };

        debug!("📡 REQUEST --> {} {} params={}", method, url, params.redacted());

        if self.config.dry_run {
            info!("[DRY RUN] Would send request: {} {}", method, url);
            return Ok(ExecutionResult::DryRun(DryRunEcho {
                dry_run: true,
                method,
                url,
                params,
            }));
        }

        let request = HttpRequest::new(method, url, params.to_query_string(), REQUEST_TIMEOUT);
        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error during request to {}: {}", request.url, e);
                return Err(e);
            }
        };

        debug!("HTTP {} {} --> status {}", method, request.url, response.status);
        classify_response(response)
    }

    // Dry-run never touches the network, time sync included.
    async fn sign_params(&self, params: ParameterSet) -> ParameterSet {
        let timestamp = if self.config.dry_run {
            local_timestamp(&self.clock)
        } else {
            current_signed_timestamp(&self.transport, &self.clock, &self.config.base_url).await
        };
        self.credentials.append_signature(stamp(params, timestamp))
    }

    /// `POST /fapi/v1/order`, signed
    pub async fn place_order(&self, order: &OrderRequest) -> Result<ExecutionResult> {
        let params = order.to_params()?;
        log_order!("SUBMIT", order.symbol, order.side, order.quantity);

        let result = self.execute(HttpMethod::Post, ORDER_PATH, params, true).await?;
        info!("Order result: {}", result);
        Ok(result)
    }

    /// MARKET order with `reduceOnly=false` and no `positionSide`; build an
    /// [`OrderRequest`] and use [`place_order`](Self::place_order) for those.
    pub async fn place_market_order(&self, symbol: &str, side: &str, quantity: Fixed) -> Result<ExecutionResult> {
        let order = OrderRequest::new(symbol, side, "MARKET", quantity)?;
        self.place_order(&order).await
    }

    /// LIMIT order; same defaults as [`place_market_order`](Self::place_market_order).
    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: Fixed,
        price: Fixed,
        time_in_force: &str,
    ) -> Result<ExecutionResult> {
        let order = OrderRequest::new(symbol, side, "LIMIT", quantity)?
            .with_price(price)
            .with_time_in_force(time_in_force);
        self.place_order(&order).await
    }
}

/// Map an HTTP response onto success or an API error.
///
/// Empty bodies read as `{}`. A non-2xx status is an error carrying the
/// exchange's `msg` or the raw body; a 2xx body with a negative `code` is an
/// error as well.
pub fn classify_response(response: HttpResponse) -> Result<ExecutionResult> {
    let status = response.status;
    let body = if response.body.trim().is_empty() {
        Some(Value::Object(Map::new()))
    } else {
        serde_json::from_str::<Value>(&response.body).ok()
    };

    debug!("RESPONSE <-- {}", response.body);

    if !response.is_success() {
        let code = body.as_ref().and_then(|v| v.get("code")).and_then(error_code);
        let msg = body
            .as_ref()
            .and_then(|v| v.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(response.body);
        return Err(ExchangeError::Api { status, code, msg });
    }

    let payload = body.ok_or_else(|| {
        ExchangeError::SerializationError(format!("Invalid JSON response: {}", response.body))
    })?;

    if let Some(code) = payload.get("code").and_then(error_code).filter(|code| *code < 0) {
        let msg = payload
            .get("msg")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| payload.to_string());
        return Err(ExchangeError::Api { status, code: Some(code), msg });
    }

    Ok(ExecutionResult::Success(payload))
}

// Integer codes, also when sent as floats (`-1021.0`)
fn error_code(code: &Value) -> Option<i64> {
    code.as_i64().or_else(|| code.as_f64().map(|f| f.trunc() as i64))
}
