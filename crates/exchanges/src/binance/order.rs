//! Futures order construction
//!
//! Field order on the wire is fixed: symbol, side, type, quantity,
//! reduceOnly, closePosition, then positionSide when set, then price and
//! timeInForce for LIMIT orders. The dispatcher appends timestamp,
//! recvWindow and signature after these.

use crate::errors::{ExchangeError, Result};
use crate::types::{OrderSide, OrderType, ParameterSet};
use basicbot_core::Fixed;

/// New order endpoint
pub const ORDER_PATH: &str = "/fapi/v1/order";

/// Default time in force for LIMIT orders
pub const DEFAULT_TIME_IN_FORCE: &str = "GTC";

/// A validated-on-build futures order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Fixed,
    pub price: Option<Fixed>,
    pub time_in_force: String,
    pub reduce_only: bool,
    pub close_position: bool,
    pub position_side: Option<String>,
}

impl OrderRequest {
    /// Parse side and type from user input (case-insensitive).
    ///
    /// Fails with a validation error on anything but BUY/SELL and
    /// MARKET/LIMIT. A LIMIT order still needs [`with_price`](Self::with_price)
    /// before it can be turned into parameters.
    pub fn new(symbol: &str, side: &str, order_type: &str, quantity: Fixed) -> Result<Self> {
        let side: OrderSide = side.parse()?;
        let order_type: OrderType = order_type.parse()?;
        Ok(Self::typed(symbol, side, order_type, quantity))
    }

    pub fn market(symbol: &str, side: OrderSide, quantity: Fixed) -> Self {
        Self::typed(symbol, side, OrderType::Market, quantity)
    }

    pub fn limit(symbol: &str, side: OrderSide, quantity: Fixed, price: Fixed) -> Self {
        Self::typed(symbol, side, OrderType::Limit, quantity).with_price(price)
    }

    fn typed(symbol: &str, side: OrderSide, order_type: OrderType, quantity: Fixed) -> Self {
        Self {
            symbol: symbol.trim().to_ascii_uppercase(),
            side,
            order_type,
            quantity,
            price: None,
            time_in_force: DEFAULT_TIME_IN_FORCE.to_string(),
            reduce_only: false,
            close_position: false,
            position_side: None,
        }
    }

    pub fn with_price(mut self, price: Fixed) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_time_in_force(mut self, time_in_force: impl Into<String>) -> Self {
        self.time_in_force = time_in_force.into();
        self
    }

    pub fn with_reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    pub fn with_close_position(mut self, close_position: bool) -> Self {
        self.close_position = close_position;
        self
    }

    /// Empty strings are treated as unset
    pub fn with_position_side(mut self, position_side: impl Into<String>) -> Self {
        let position_side = position_side.into();
        self.position_side = (!position_side.is_empty()).then_some(position_side);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.order_type == OrderType::Limit && self.price.is_none() {
            return Err(ExchangeError::validation("LIMIT orders require a price"));
        }
        Ok(())
    }

    /// Validate and render the order's request parameters in wire order
    pub fn to_params(&self) -> Result<ParameterSet> {
        self.validate()?;

        let mut params = ParameterSet::new()
            .with("symbol", self.symbol.as_str())
            .with("side", self.side.as_str())
            .with("type", self.order_type.as_str())
            .with("quantity", self.quantity.to_wire_string())
            .with("reduceOnly", bool_literal(self.reduce_only))
            .with("closePosition", bool_literal(self.close_position));

        if let Some(position_side) = &self.position_side {
            params.push("positionSide", position_side.as_str());
        }

        if let (OrderType::Limit, Some(price)) = (self.order_type, self.price) {
            params.push("price", price.to_string());
            params.push("timeInForce", self.time_in_force.as_str());
        }

        Ok(params)
    }
}

/// Parse, validate and render in one step
pub fn build_order(
    symbol: &str,
    side: &str,
    order_type: &str,
    quantity: Fixed,
    price: Option<Fixed>,
) -> Result<ParameterSet> {
    let mut order = OrderRequest::new(symbol, side, order_type, quantity)?;
    order.price = price;
    order.to_params()
}

// The exchange wants lowercase string literals, not JSON booleans
fn bool_literal(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
