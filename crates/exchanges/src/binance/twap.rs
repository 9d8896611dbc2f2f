//! Naive TWAP execution
//!
//! Splits a total quantity into equal MARKET slices submitted one at a time
//! on a fixed cadence. No re-pricing and no slippage control. A failed slice
//! is recorded in place and the schedule carries on.

use crate::binance::rest::FuturesRestClient;
use crate::errors::{ExchangeError, Result};
use crate::traits::{Clock, HttpTransport};
use crate::types::ExecutionResult;
use basicbot_core::{Fixed, log_error};

use std::fmt;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_TWAP_SLICES: u32 = 5;
pub const DEFAULT_TWAP_DURATION_SECS: i64 = 60;

/// A checked TWAP schedule
#[derive(Debug, Clone, PartialEq)]
pub struct TwapPlan {
    pub symbol: String,
    /// Passed through to the order builder on every slice
    pub side: String,
    pub total_quantity: Fixed,
    pub slices: u32,
    pub duration_secs: i64,
}

impl TwapPlan {
    /// Fails with a validation error if `slices < 1` or `duration_secs < 0`.
    pub fn new(symbol: &str, side: &str, total_quantity: Fixed, slices: u32, duration_secs: i64) -> Result<Self> {
        let plan = Self {
            symbol: symbol.to_string(),
            side: side.to_string(),
            total_quantity,
            slices,
            duration_secs,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Schedule checks; side and symbol are left to the order builder.
    pub fn validate(&self) -> Result<()> {
        if self.slices < 1 {
            return Err(ExchangeError::validation("slices must be >= 1"));
        }
        if self.duration_secs < 0 {
            return Err(ExchangeError::validation("duration must be >= 0"));
        }
        Ok(())
    }

    /// `total_quantity / slices`
    pub fn slice_quantity(&self) -> Result<Fixed> {
        Ok(self.total_quantity.split(self.slices)?)
    }

    /// `duration_secs / slices`, zero for a plan that fails `validate`
    pub fn interval(&self) -> Duration {
        if self.validate().is_err() {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.duration_secs as f64 / f64::from(self.slices))
    }
}

/// Outcome of one slice
#[derive(Debug, Clone, PartialEq)]
pub struct SliceResult {
    /// 1-based position in the schedule
    pub index: u32,
    pub quantity: Fixed,
    pub outcome: Result<ExecutionResult>,
}

impl SliceResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&ExchangeError> {
        self.outcome.as_ref().err()
    }
}

impl fmt::Display for SliceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(result) => write!(f, "{result}"),
            Err(e) => write!(f, "{}", serde_json::json!({ "error": e.to_string() })),
        }
    }
}

/// Every slice's outcome, in submission order
#[derive(Debug, Clone, PartialEq)]
pub struct TwapRun {
    pub plan: TwapPlan,
    pub results: Vec<SliceResult>,
}

impl TwapRun {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Sum of the quantities requested across all slices, failed ones included
    pub fn requested_quantity(&self) -> Fixed {
        self.results.iter().map(|r| r.quantity).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SliceResult> {
        self.results.iter()
    }
}

impl<T: HttpTransport, C: Clock> FuturesRestClient<T, C> {
    /// Submit `slices` MARKET orders of `total_quantity / slices`, sleeping
    /// `duration_secs / slices` between consecutive slices.
    ///
    /// Only an invalid plan fails the call. Per-slice errors of any kind are
    /// recorded at that slice's position and the next slice still goes out.
    pub async fn run_twap(
        &self,
        symbol: &str,
        side: &str,
        total_quantity: Fixed,
        slices: u32,
        duration_secs: i64,
    ) -> Result<TwapRun> {
        let plan = TwapPlan::new(symbol, side, total_quantity, slices, duration_secs)?;
        self.execute_twap(plan).await
    }

    /// Run a prepared plan. The plan is checked again since its fields are
    /// public.
    pub async fn execute_twap(&self, plan: TwapPlan) -> Result<TwapRun> {
        plan.validate()?;
        let slice_quantity = plan.slice_quantity()?;
        let interval = plan.interval();

        info!(
            "Starting TWAP: {} {} total={} slices={} interval={:.2}s slice_qty={}",
            plan.symbol,
            plan.side,
            plan.total_quantity,
            plan.slices,
            interval.as_secs_f64(),
            slice_quantity
        );

        let mut results = Vec::with_capacity(plan.slices as usize);
        for index in 1..=plan.slices {
            info!("TWAP slice {}/{} placing market order qty={}", index, plan.slices, slice_quantity);

            let outcome = self
                .place_market_order(&plan.symbol, &plan.side, slice_quantity)
                .await;
            if let Err(e) = &outcome {
                log_error!(format!("TWAP slice {index}"), e);
            }
            results.push(SliceResult {
                index,
                quantity: slice_quantity,
                outcome,
            });

            if index < plan.slices && !interval.is_zero() {
                self.clock().sleep(interval).await;
            }
        }

        let run = TwapRun { plan, results };
        info!("TWAP complete: {}/{} slices succeeded", run.succeeded(), run.len());
        Ok(run)
    }
}
