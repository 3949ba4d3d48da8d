use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Missing required field for {order_type} order: {field}")]
    MissingField {
        order_type: &'static str,
        field: &'static str,
    },

    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}
