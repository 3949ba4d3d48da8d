pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{OrderSide, OrderType, TimeInForce};
pub use error::CoreError;
pub use structs::{MAX_TWAP_PARTS, OrderRequest, TWAP_QUANTITY_SCALE, TwapPlan};
