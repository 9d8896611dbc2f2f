//! Exchange error taxonomy
//!
//! Three outcomes must stay distinguishable to the caller: rejected before
//! anything was sent (validation), never reached the exchange (transport), and
//! reached the exchange but refused (API).

use thiserror::Error;

/// Result type for exchange operations
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Exchange operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    /// Malformed caller input, detected before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// Non-2xx HTTP status, or a negative `code` inside a 2xx body
    #[error("{}", format_api_error(.status, .code, .msg))]
    Api {
        status: u16,
        code: Option<i64>,
        msg: String,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Fixed point error: {0}")]
    FixedPointError(String),
}

fn format_api_error(status: &u16, code: &Option<i64>, msg: &str) -> String {
    match code {
        Some(code) if (200..300).contains(status) => format!("Binance error {code}: {msg}"),
        Some(code) => format!("HTTP {status} error (code {code}): {msg}"),
        None => format!("HTTP {status} error: {msg}"),
    }
}

/// Coarse classification used by callers to present outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally; nothing was sent
    Validation,
    /// The request did not complete at the network layer
    Transport,
    /// The exchange answered with a rejection
    Api,
    /// Configuration, serialization or signing problem on our side
    Internal,
}

impl ExchangeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NetworkError(_) | Self::ConnectionFailed(_) | Self::Timeout(_) => {
                ErrorKind::Transport
            }
            Self::Api { .. } => ErrorKind::Api,
            Self::ConfigurationError(_)
            | Self::InvalidUrl(_)
            | Self::SerializationError(_)
            | Self::MissingCredentials(_)
            | Self::InvalidCredentials
            | Self::FixedPointError(_) => ErrorKind::Internal,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    pub fn is_api(&self) -> bool {
        self.kind() == ErrorKind::Api
    }

    /// Exchange error code, when the exchange supplied one
    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            Self::Api { code: Some(code), .. } => Some(ApiErrorCode::from(*code)),
            _ => None,
        }
    }
}

impl From<basicbot_core::FixedError> for ExchangeError {
    fn from(err: basicbot_core::FixedError) -> Self {
        Self::FixedPointError(err.to_string())
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<url::ParseError> for ExchangeError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Binance USDT-M futures error codes this client runs into most often
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    Unknown,
    Disconnected,
    TooManyRequests,
    TimestampOutsideRecvWindow,
    InvalidSignature,
    BadPrecision,
    MandatoryParamMissing,
    InvalidSide,
    InvalidOrderType,
    MarginInsufficient,
    ReduceOnlyRejected,
    MinNotional,
}

impl From<i64> for ApiErrorCode {
    fn from(code: i64) -> Self {
        match code {
            -1001 => ApiErrorCode::Disconnected,
            -1003 => ApiErrorCode::TooManyRequests,
            -1021 => ApiErrorCode::TimestampOutsideRecvWindow,
            -1022 => ApiErrorCode::InvalidSignature,
            -1111 => ApiErrorCode::BadPrecision,
            -1102 => ApiErrorCode::MandatoryParamMissing,
            -1117 => ApiErrorCode::InvalidSide,
            -1116 => ApiErrorCode::InvalidOrderType,
            -2019 => ApiErrorCode::MarginInsufficient,
            -2022 => ApiErrorCode::ReduceOnlyRejected,
            -4164 => ApiErrorCode::MinNotional,
            _ => ApiErrorCode::Unknown,
        }
    }
}
