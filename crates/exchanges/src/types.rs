//! Order vocabulary, ordered request parameters and execution results

use crate::errors::{ExchangeError, Result};
use crate::http::HttpMethod;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = ExchangeError;

    /// Case-insensitive; anything but BUY/SELL is a validation error.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            _ => Err(ExchangeError::validation(format!(
                "side must be BUY or SELL, got {s:?}"
            ))),
        }
    }
}

/// Order types accepted by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            _ => Err(ExchangeError::validation(format!(
                "order type must be MARKET or LIMIT, got {s:?}"
            ))),
        }
    }
}

/// Request parameters in insertion order.
///
/// Never sorted and never deduplicated: the signature covers the encoded
/// string in exactly this order, and the same string goes on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    pairs: Vec<(String, String)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field after all existing ones
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Builder form of [`push`](Self::push)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// URL-encode as `k1=v1&k2=v2…` preserving insertion order.
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Copy without the `signature` field, for logging
    pub fn redacted(&self) -> ParameterSet {
        self.pairs
            .iter()
            .filter(|(k, _)| k != "signature")
            .cloned()
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}

// Serialized as a JSON object whose keys keep insertion order.
impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (k, v) in &self.pairs {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// What a dry-run client returns instead of sending a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRunEcho {
    #[serde(rename = "dryRun")]
    pub dry_run: bool,
    pub method: HttpMethod,
    pub url: String,
    pub params: ParameterSet,
}

/// Outcome of a request that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Dry-run mode: the fully built request, never sent
    DryRun(DryRunEcho),
    /// The exchange accepted the request; its JSON payload (empty object for an empty body)
    Success(Value),
}

impl ExecutionResult {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, ExecutionResult::DryRun(_))
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            ExecutionResult::Success(value) => Some(value),
            ExecutionResult::DryRun(_) => None,
        }
    }

    pub fn dry_run_echo(&self) -> Option<&DryRunEcho> {
        match self {
            ExecutionResult::DryRun(echo) => Some(echo),
            ExecutionResult::Success(_) => None,
        }
    }

    /// Typed view of an order acknowledgement, if the payload is one
    pub fn order_ack(&self) -> Option<FuturesOrderAck> {
        self.payload()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn to_json(&self) -> Value {
        match self {
            ExecutionResult::DryRun(echo) => serde_json::to_value(echo).unwrap_or(Value::Null),
            ExecutionResult::Success(value) => value.clone(),
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// `POST /fapi/v1/order` acknowledgement
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesOrderAck {
    pub order_id: u64,
    pub symbol: String,
    pub status: String,
    #[serde(default)]
    pub client_order_id: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub avg_price: String,
    #[serde(default)]
    pub orig_qty: String,
    #[serde(default)]
    pub executed_qty: String,
    #[serde(default)]
    pub time_in_force: String,
    #[serde(rename = "type", default)]
    pub order_type: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub position_side: String,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub close_position: bool,
    #[serde(default)]
    pub update_time: u64,
}
