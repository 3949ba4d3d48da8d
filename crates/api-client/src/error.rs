use crate::responses::ApiErrorResponse;
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

/// Shown in place of an error body that is not JSON.
pub const NO_JSON_BODY: &str = "No JSON body in response";

#[derive(Error, Debug)]
pub enum ApiError {
    /// No response was received: DNS, connect, timeout or a dropped connection.
    #[error("No response received from the exchange: {0}")]
    Transport(#[from] reqwest::Error),

    /// The exchange answered with a non-2xx status.
    #[error("The exchange returned HTTP {status}: {body}")]
    Http { status: u16, body: ErrorBody },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Failed to sign the request: {0}")]
    Signing(String),

    #[error("Invalid API credentials: {0}")]
    InvalidCredentials(String),

    #[error("Failed to build the HTTP client: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// True when the request may never have reached the exchange.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// The body of a non-2xx response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Json(Value),
    /// The raw text (or why it could not be read); displayed as `NO_JSON_BODY`.
    Unreadable(String),
}

impl ErrorBody {
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => ErrorBody::Json(value),
            Err(_) => ErrorBody::Unreadable(text.to_string()),
        }
    }

    /// The exchange's `{"code": .., "msg": ..}` error, when the body has that shape.
    pub fn exchange_error(&self) -> Option<ApiErrorResponse> {
        match self {
            ErrorBody::Json(value) => serde_json::from_value(value.clone()).ok(),
            ErrorBody::Unreadable(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ErrorBody::Json(value) => value.clone(),
            ErrorBody::Unreadable(_) => json!({ "error": NO_JSON_BODY }),
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBody::Json(value) => write!(f, "{}", value),
            ErrorBody::Unreadable(_) => f.write_str(NO_JSON_BODY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_body_exposes_exchange_code() {
        let body = ErrorBody::from_text(r#"{"code": -1121, "msg": "Invalid symbol."}"#);
        let decoded = body.exchange_error().unwrap();
        assert_eq!(decoded.code, -1121);
        assert_eq!(decoded.msg, "Invalid symbol.");
        assert_eq!(body.to_json()["code"], -1121);
    }

    #[test]
    fn non_json_body_falls_back_to_generic_message() {
        let body = ErrorBody::from_text("<html>502 Bad Gateway</html>");
        assert!(matches!(body, ErrorBody::Unreadable(_)));
        assert!(body.exchange_error().is_none());
        assert_eq!(body.to_string(), NO_JSON_BODY);
        assert_eq!(body.to_json()["error"], NO_JSON_BODY);
    }

    #[test]
    fn http_error_reports_status() {
        let err = ApiError::Http {
            status: 400,
            body: ErrorBody::from_text(r#"{"code": -1121, "msg": "Invalid symbol."}"#),
        };
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_transport());
        assert!(err.to_string().contains("HTTP 400"));
    }
}
