//!
//! Common types and utilities shared by the quote parser engine and the runner.
//!
//! This crate aggregates:
//! - `error`: unified error type `ParserError` used across the workspace.
//! - `result`: handy `Result<T, ParserError>` alias.
//! - `currency`: currency codes and the flag-emoji decoding table.
//! - `quote`: the `Quote` record emitted by the pipeline and persisted by sinks.
#![warn(missing_docs)]
pub mod currency;
pub mod error;
pub mod quote;
pub mod result;

pub use currency::Currency;
pub use error::ParserError;
pub use quote::Quote;
pub use result::Result;
