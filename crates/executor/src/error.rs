use crate::twap::TwapState;
use api_client::ApiError;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The order failed its structural checks; nothing was sent.
    #[error("Order rejected before sending: {0}")]
    Validation(#[from] CoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("TWAP executor is {0:?}; a plan can only be run once")]
    AlreadyRun(TwapState),
}
