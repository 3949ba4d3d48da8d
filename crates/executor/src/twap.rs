use crate::error::ExecutorError;
use crate::exchange::Executor;
use crate::outcome::{OrderOutcome, SliceFailure};
use core_types::{OrderRequest, OrderSide, TwapPlan};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

/// Lifecycle of a `TwapExecutor`. A run is one linear pass; there is no resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TwapState {
    Created,
    Running,
    Completed,
}

/// Everything a caller needs to reconcile a finished TWAP run.
#[derive(Debug, Clone, Serialize)]
pub struct TwapReport {
    pub symbol: String,
    pub side: OrderSide,
    pub total_quantity: Decimal,
    pub slice_quantity: Decimal,
    pub parts: u32,
    pub interval_ms: u64,
    /// One entry per slice, in slice order.
    pub outcomes: Vec<OrderOutcome>,
}

impl TwapReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Sum of the requested quantity of every slice the exchange accepted.
    pub fn accepted_quantity(&self) -> Decimal {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.quantity)
            .sum()
    }
}

/// Splits a quantity into equal MARKET child orders spaced evenly over time.
pub struct TwapExecutor {
    executor: Arc<dyn Executor>,
    symbol: String,
    side: OrderSide,
    plan: TwapPlan,
    state: TwapState,
}

impl TwapExecutor {
    pub fn new(executor: Arc<dyn Executor>, symbol: &str, side: OrderSide, plan: TwapPlan) -> Self {
        Self {
            executor,
            symbol: symbol.trim().to_uppercase(),
            side,
            plan,
            state: TwapState::Created,
        }
    }

    pub fn state(&self) -> TwapState {
        self.state
    }

    pub fn plan(&self) -> &TwapPlan {
        &self.plan
    }

    /// Places every slice, waiting `plan.interval()` between consecutive slices.
    ///
    /// A failed slice is recorded and the loop moves on; it still waits the
    /// full interval before the next slice. No wait follows the last slice.
    /// The only error is calling `run` on an executor that has already run.
    pub async fn run(&mut self) -> Result<TwapReport, ExecutorError> {
        if self.state != TwapState::Created {
            return Err(ExecutorError::AlreadyRun(self.state));
        }
        self.state = TwapState::Running;

        let parts = self.plan.parts();
        let slice_quantity = self.plan.slice_quantity();
        let interval = self.plan.interval();

        tracing::info!(
            side = %self.side,
            symbol = %self.symbol,
            total = %self.plan.total_quantity(),
            parts,
            duration_secs = self.plan.duration_secs(),
            "Starting TWAP"
        );

        let mut outcomes = Vec::new();
        for slice in 1..=parts {
            tracing::info!("Placing child market order {}/{} qty={}", slice, parts, slice_quantity);

            let order = OrderRequest::market(&self.symbol, self.side, slice_quantity);
            let result = match self.executor.execute(&order).await {
                Ok(response) => {
                    tracing::info!(slice, "Child order executed");
                    Ok(response)
                }
                Err(e) => {
                    tracing::error!(slice, error = %e, "Child order failed");
                    Err(SliceFailure::from(&e))
                }
            };
            outcomes.push(OrderOutcome {
                slice,
                quantity: slice_quantity,
                result,
            });

            if slice < parts {
                tokio::time::sleep(interval).await;
            }
        }

        self.state = TwapState::Completed;

        let report = TwapReport {
            symbol: self.symbol.clone(),
            side: self.side,
            total_quantity: self.plan.total_quantity(),
            slice_quantity,
            parts,
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            outcomes,
        };
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "TWAP completed"
        );
        Ok(report)
    }
}
