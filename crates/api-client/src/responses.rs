use core_types::OrderSide;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// A typed view of a successful `POST /fapi/v1/order` response.
///
/// Every field is optional: the raw JSON is what gets reported, this view is
/// only used for one-line summaries.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderResponse {
    pub order_id: Option<i64>,
    pub symbol: Option<String>,
    pub status: Option<String>,
    pub side: Option<OrderSide>,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub orig_qty: Option<Decimal>,
    pub executed_qty: Option<Decimal>,
    pub price: Option<Decimal>,
    pub avg_price: Option<Decimal>,
}

impl OrderResponse {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn summary(&self) -> String {
        fn show<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
        }
        format!(
            "orderId={} {} {} {} status={} origQty={} executedQty={} price={} avgPrice={}",
            show(&self.order_id),
            show(&self.symbol),
            show(&self.side),
            show(&self.order_type),
            show(&self.status),
            show(&self.orig_qty),
            show(&self.executed_qty),
            show(&self.price),
            show(&self.avg_price),
        )
    }
}

/// The response from `GET /fapi/v1/time`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTimeResponse {
    pub server_time: i64,
}

/// Represents an error response from the Binance API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}
