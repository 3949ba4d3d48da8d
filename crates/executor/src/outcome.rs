use crate::error::ExecutorError;
use api_client::ApiError;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Why a slice did not produce an exchange response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected locally; no request was made.
    Validation,
    /// No response was received. Whether the order reached the exchange is unknown.
    Transport,
    /// The exchange answered with a non-2xx status.
    Http,
    /// Anything else: an undecodable success body, a signing failure.
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceFailure {
    pub kind: FailureKind,
    pub status_code: Option<u16>,
    pub error: String,
    /// The decoded error body for HTTP failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl From<&ExecutorError> for SliceFailure {
    fn from(err: &ExecutorError) -> Self {
        let (kind, body) = match err {
            ExecutorError::Validation(_) => (FailureKind::Validation, None),
            ExecutorError::Api(ApiError::Transport(_)) => (FailureKind::Transport, None),
            ExecutorError::Api(ApiError::Http { body, .. }) => (FailureKind::Http, Some(body.to_json())),
            ExecutorError::Api(_) | ExecutorError::AlreadyRun(_) => (FailureKind::Other, None),
        };
        let status_code = match err {
            ExecutorError::Api(api) => api.status(),
            _ => None,
        };
        Self {
            kind,
            status_code,
            error: err.to_string(),
            body,
        }
    }
}

/// The result of one TWAP slice.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    /// 1-based position of the slice within the run.
    pub slice: u32,
    pub quantity: Decimal,
    pub result: Result<Value, SliceFailure>,
}

impl OrderOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

impl Serialize for OrderOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("OrderOutcome", 4)?;
        state.serialize_field("slice", &self.slice)?;
        state.serialize_field("quantity", &self.quantity)?;
        match &self.result {
            Ok(response) => {
                state.serialize_field("outcome", "success")?;
                state.serialize_field("response", response)?;
            }
            Err(failure) => {
                state.serialize_field("outcome", "failed")?;
                state.serialize_field("failure", failure)?;
            }
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::ErrorBody;
    use core_types::CoreError;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn http_failure_keeps_status_and_body() {
        let err = ExecutorError::Api(ApiError::Http {
            status: 400,
            body: ErrorBody::from_text(r#"{"code": -1121, "msg": "Invalid symbol."}"#),
        });
        let failure = SliceFailure::from(&err);
        assert_eq!(failure.kind, FailureKind::Http);
        assert_eq!(failure.status_code, Some(400));
        assert_eq!(failure.body, Some(json!({"code": -1121, "msg": "Invalid symbol."})));
    }

    #[test]
    fn validation_failure_has_no_status() {
        let err = ExecutorError::Validation(CoreError::InvalidInput(
            "quantity".to_string(),
            "value must be positive, got 0".to_string(),
        ));
        let failure = SliceFailure::from(&err);
        assert_eq!(failure.kind, FailureKind::Validation);
        assert_eq!(failure.status_code, None);
        assert!(failure.body.is_none());
    }

    #[test]
    fn outcomes_serialize_with_a_tag() {
        let ok = OrderOutcome {
            slice: 1,
            quantity: dec!(0.00333333),
            result: Ok(json!({"orderId": 1})),
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"slice": 1, "quantity": "0.00333333", "outcome": "success", "response": {"orderId": 1}})
        );

        let failed = OrderOutcome {
            slice: 2,
            quantity: dec!(0.00333333),
            result: Err(SliceFailure {
                kind: FailureKind::Transport,
                status_code: None,
                error: "timed out".to_string(),
                body: None,
            }),
        };
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["outcome"], "failed");
        assert_eq!(value["failure"]["kind"], "transport");
        assert!(value["failure"].get("body").is_none());
    }
}
