use crate::error::ExecutorError;
use api_client::{ApiClient, ApiError, OrderResponse};
use async_trait::async_trait;
use chrono::Utc;
use core_types::OrderRequest;
use serde_json::Value;
use std::sync::Arc;

/// A generic trait for placing a single order.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Places `order` and returns the exchange's decoded response body.
    async fn execute(&self, order: &OrderRequest) -> Result<Value, ExecutorError>;
}

/// The "live" executor that sends real orders to the exchange via the ApiClient.
pub struct OrderExecutor {
    api_client: Arc<dyn ApiClient>,
}

impl OrderExecutor {
    pub fn new(api_client: Arc<dyn ApiClient>) -> Self {
        Self { api_client }
    }
}

#[async_trait]
impl Executor for OrderExecutor {
    /// Validates the order, then issues exactly one network call.
    ///
    /// HTTP rejections are logged with the decoded body (or the generic
    /// fallback when the body is not JSON) before being returned.
    async fn execute(&self, order: &OrderRequest) -> Result<Value, ExecutorError> {
        order.validate()?;

        tracing::info!(
            symbol = %order.symbol,
            side = %order.side,
            order_type = %order.order_type,
            quantity = ?order.quantity,
            price = ?order.price,
            time_in_force = ?order.time_in_force,
            "Placing {} order",
            order.order_type
        );

        match self.api_client.place_order(order).await {
            Ok(body) => {
                let summary = OrderResponse::from_value(&body)
                    .map(|response| response.summary())
                    .unwrap_or_else(|| body.to_string());
                tracing::info!(symbol = %order.symbol, "Order response: {}", summary);
                Ok(body)
            }
            Err(e) => {
                match &e {
                    ApiError::Http { status, body } => {
                        tracing::error!(status, "{} order failed", order.order_type);
                        tracing::error!("Response body: {}", body);
                    }
                    other => {
                        tracing::error!(
                            transport = other.is_transport(),
                            error = %other,
                            "{} order failed",
                            order.order_type
                        );
                    }
                }
                Err(ExecutorError::Api(e))
            }
        }
    }
}

/// Asks the exchange for its clock and logs the skew against local time.
///
/// Failure is never fatal: it is logged as a warning and `None` is returned,
/// and signed requests keep using the local timestamp either way.
pub async fn check_server_time(api_client: &dyn ApiClient) -> Option<i64> {
    match api_client.server_time().await {
        Ok(server_time) => {
            let skew_ms = Utc::now().timestamp_millis() - server_time;
            tracing::info!(server_time, skew_ms, "Exchange server time");
            Some(server_time)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not fetch server time; continuing with local timestamp");
            None
        }
    }
}
