//! Fixed-point arithmetic for order quantities and prices
//!
//! Wraps `rust_decimal::Decimal` so that quantities split across TWAP slices
//! stay exact and prices are rendered to the exchange without float noise.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Exact decimal value used for every quantity and price sent to the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Fixed {
    value: Decimal,
}

impl Fixed {
    /// Zero value
    pub const ZERO: Fixed = Fixed {
        value: Decimal::ZERO,
    };

    /// Create a Fixed from a decimal string such as `"0.001"`
    pub fn from_str_exact(s: &str) -> Result<Self, FixedError> {
        let value = Decimal::from_str(s.trim()).map_err(|_| FixedError::InvalidValue)?;
        Ok(Fixed { value })
    }

    /// Render without trailing zeros, the form used on the wire (`0.10` -> `0.1`).
    pub fn to_wire_string(&self) -> String {
        self.value.normalize().to_string()
    }

    /// Divide into `parts` equal pieces.
    pub fn split(&self, parts: u32) -> Result<Fixed, FixedError> {
        if parts == 0 {
            return Err(FixedError::DivisionByZero);
        }
        self.value
            .checked_div(Decimal::from(parts))
            .map(|value| Fixed { value })
            .ok_or(FixedError::Overflow)
    }
}

/// Fixed-point arithmetic errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedError {
    #[error("Invalid decimal value")]
    InvalidValue,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Overflow in arithmetic operation")]
    Overflow,
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Self) -> Self::Output {
        Fixed {
            value: self.value + rhs.value,
        }
    }
}

impl Sum for Fixed {
    fn sum<I: Iterator<Item = Fixed>>(iter: I) -> Self {
        iter.fold(Fixed::ZERO, |acc, x| acc + x)
    }
}

impl Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for Fixed {
    type Err = FixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_exact(s)
    }
}
