#![allow(dead_code)]

use api_client::{ApiClient, ApiError, ErrorBody};
use async_trait::async_trait;
use core_types::OrderRequest;
use mockall::mock;
use serde_json::Value;

mock! {
    pub Exchange {}

    #[async_trait]
    impl ApiClient for Exchange {
        async fn server_time(&self) -> Result<i64, ApiError>;
        async fn place_order(&self, order: &OrderRequest) -> Result<Value, ApiError>;
    }
}

pub fn invalid_symbol() -> ApiError {
    ApiError::Http {
        status: 400,
        body: ErrorBody::from_text(r#"{"code": -1121, "msg": "Invalid symbol."}"#),
    }
}

pub fn gateway_error() -> ApiError {
    ApiError::Http {
        status: 502,
        body: ErrorBody::from_text("<html>Bad Gateway</html>"),
    }
}
