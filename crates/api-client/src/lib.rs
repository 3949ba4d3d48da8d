use crate::auth::sign_params;
use crate::responses::ServerTimeResponse;
use async_trait::async_trait;
use chrono::Utc;
use configuration::{Credentials, ExchangeConfig};
use core_types::OrderRequest;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

pub mod auth;
pub mod error;
pub mod responses;
// --- Public API ---
pub use error::{ApiError, ErrorBody};
pub use responses::{ApiErrorResponse, OrderResponse};

/// The header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";
pub const ORDER_ENDPOINT: &str = "/fapi/v1/order";
pub const SERVER_TIME_ENDPOINT: &str = "/fapi/v1/time";

/// The interface the executors use to reach the exchange.
///
/// Keeping it behind a trait lets the order and TWAP executors run against a
/// mock in tests.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Fetches the exchange clock in epoch milliseconds. (Public)
    async fn server_time(&self) -> Result<i64, ApiError>;

    /// Places a new order on the exchange and returns the decoded response body. (Authenticated)
    async fn place_order(&self, order: &OrderRequest) -> Result<Value, ApiError>;
}

/// A concrete implementation of the `ApiClient` for Binance USDT-M futures.
///
/// Holds one pooled `reqwest::Client` with the API key installed as a default
/// header, so every call in an invocation reuses the same connections.
#[derive(Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,

    api_secret: String,
    recv_window_ms: u64,
    get_timeout: Duration,
    post_timeout: Duration,
}

impl BinanceClient {
    pub fn new(credentials: &Credentials, exchange: &ExchangeConfig) -> Result<Self, ApiError> {
        let mut api_key = HeaderValue::from_str(&credentials.key)
            .map_err(|e| ApiError::InvalidCredentials(format!("API key is not a valid header value: {}", e)))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: exchange.base_url.trim_end_matches('/').to_string(),

            api_secret: credentials.secret.clone(),
            recv_window_ms: exchange.recv_window_ms,
            get_timeout: exchange.get_timeout(),
            post_timeout: exchange.post_timeout(),
        })
    }

    async fn _get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = "GET", %url, "Sending request");

        let response = self
            .client
            .get(&url)
            .timeout(self.get_timeout)
            .send()
            .await?;
        read_response(response).await
    }

    /// Signs `params` and POSTs them as a query string with no body.
    ///
    /// `timestamp` and `recvWindow` are added unless the caller already set them.
    async fn _post_signed(
        &self,
        path: &str,
        params: &mut BTreeMap<&'static str, String>,
    ) -> Result<Value, ApiError> {
        params
            .entry("timestamp")
            .or_insert_with(|| Utc::now().timestamp_millis().to_string());
        params
            .entry("recvWindow")
            .or_insert_with(|| self.recv_window_ms.to_string());

        let signed = sign_params(
            params.iter().map(|(key, value)| (*key, value.as_str())),
            &self.api_secret,
        )?;

        tracing::debug!(
            method = "POST",
            url = %format!("{}{}?{}&signature=<redacted>", self.base_url, path, signed.query),
            "Sending signed request"
        );
        let url = format!("{}{}?{}", self.base_url, path, signed.to_query_string());

        let response = match self
            .client
            .post(&url)
            .timeout(self.post_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(path, error = %e, timed_out = e.is_timeout(), "Network error while POST");
                return Err(ApiError::Transport(e));
            }
        };
        tracing::debug!(path, status = response.status().as_u16(), "Response received");

        read_response(response).await
    }
}

/// Decodes a 2xx body as `T`; anything else becomes `ApiError::Http` with the
/// body decoded as JSON when possible.
///
/// Once a status line has arrived the failure is never reported as transport,
/// even if reading the body breaks off.
async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) if status.is_success() => {
            return Err(ApiError::Deserialization(format!(
                "Failed to read the HTTP {} response body: {}",
                status.as_u16(),
                e
            )));
        }
        Err(e) => {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: ErrorBody::Unreadable(format!("Failed to read the response body: {}", e)),
            });
        }
    };

    if status.is_success() {
        serde_json::from_str::<T>(&text).map_err(|e| {
            ApiError::Deserialization(format!("{}. Original text: {}", e, text))
        })
    } else {
        Err(ApiError::Http {
            status: status.as_u16(),
            body: ErrorBody::from_text(&text),
        })
    }
}

/// Formats a decimal the way the exchange expects: plain digits, no exponent,
/// no trailing zeros.
fn decimal_param(value: Decimal) -> String {
    value.normalize().to_string()
}

/// The exchange parameters for an order. Optional fields are only present when set.
pub fn order_params(order: &OrderRequest) -> BTreeMap<&'static str, String> {
    let mut params = BTreeMap::new();
    params.insert("symbol", order.symbol.to_uppercase());
    params.insert("side", order.side.to_string());
    params.insert("type", order.order_type.to_string());
    if let Some(quantity) = order.quantity {
        params.insert("quantity", decimal_param(quantity));
    }
    if let Some(price) = order.price {
        params.insert("price", decimal_param(price));
    }
    if let Some(time_in_force) = order.time_in_force {
        params.insert("timeInForce", time_in_force.to_string());
    }
    if let Some(stop_price) = order.stop_price {
        params.insert("stopPrice", decimal_param(stop_price));
    }
    params
}

#[async_trait]
impl ApiClient for BinanceClient {
    async fn server_time(&self) -> Result<i64, ApiError> {
        let response: ServerTimeResponse = self._get(SERVER_TIME_ENDPOINT).await?;
        Ok(response.server_time)
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<Value, ApiError> {
        let mut params = order_params(order);
        self._post_signed(ORDER_ENDPOINT, &mut params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{OrderSide, TimeInForce};
    use rust_decimal_macros::dec;

    #[test]
    fn market_params_omit_price_fields() {
        let order = OrderRequest::market("btcusdt", OrderSide::Buy, dec!(0.00100));
        let params = order_params(&order);

        assert_eq!(params.get("symbol").map(String::as_str), Some("BTCUSDT"));
        assert_eq!(params.get("side").map(String::as_str), Some("BUY"));
        assert_eq!(params.get("type").map(String::as_str), Some("MARKET"));
        assert_eq!(params.get("quantity").map(String::as_str), Some("0.001"));
        assert!(!params.contains_key("price"));
        assert!(!params.contains_key("timeInForce"));
        assert!(!params.contains_key("stopPrice"));
    }

    #[test]
    fn limit_params_carry_price_and_time_in_force() {
        let order = OrderRequest::limit("ETHUSDT", OrderSide::Sell, dec!(2), dec!(3150.50), TimeInForce::Fok)
            .with_stop_price(dec!(3100));
        let params = order_params(&order);

        assert_eq!(params.get("quantity").map(String::as_str), Some("2"));
        assert_eq!(params.get("price").map(String::as_str), Some("3150.5"));
        assert_eq!(params.get("timeInForce").map(String::as_str), Some("FOK"));
        assert_eq!(params.get("stopPrice").map(String::as_str), Some("3100"));
    }

    #[test]
    fn decimals_never_use_exponent_notation() {
        assert_eq!(decimal_param(dec!(0.00000001)), "0.00000001");
        assert_eq!(decimal_param(dec!(50000)), "50000");
        assert_eq!(decimal_param(dec!(0.00333333)), "0.00333333");
    }

    #[test]
    fn rejects_api_key_that_is_not_a_header_value() {
        let credentials = Credentials::new("bad\nkey", "secret");
        let exchange = ExchangeConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            recv_window_ms: 5000,
            get_timeout_secs: 10,
            post_timeout_secs: 15,
        };
        let err = BinanceClient::new(&credentials, &exchange).err().unwrap();
        assert!(matches!(err, ApiError::InvalidCredentials(_)));
    }
}
