//! # Order Executor Crate
//!
//! This crate turns validated order instructions into calls on an `ApiClient`.
//! It provides the `OrderExecutor` for single MARKET/LIMIT orders and the
//! `TwapExecutor`, which slices a quantity into equal MARKET orders spread
//! over a duration.
//!
//! ## Architectural Principles
//!
//! - **Execution Abstraction:** The `Executor` trait lets the TWAP loop stay
//!   agnostic about how a single order reaches the exchange.
//! - **Best-effort slicing:** A TWAP run never aborts because one slice failed.
//!   Each slice produces an `OrderOutcome` holding either the exchange response
//!   or a `SliceFailure`, and the run always yields one outcome per slice.
//!
//! ## Public API
//!
//! - `Executor`: The core trait for placing one order.
//! - `OrderExecutor`: Validates and places one order through an `ApiClient`.
//! - `TwapExecutor`: Runs a `TwapPlan` slice by slice.
//! - `check_server_time`: Non-fatal exchange clock check.
//! - `ExecutorError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod exchange;
pub mod outcome;
pub mod twap;

// Re-export the key components to provide a clean, public-facing API.
pub use error::ExecutorError;
pub use exchange::{Executor, OrderExecutor, check_server_time};
pub use outcome::{FailureKind, OrderOutcome, SliceFailure};
pub use twap::{TwapExecutor, TwapReport, TwapState};
