//! Error handling foundation for parley.
//!
//! Library crates define their own domain error enums. At the turn-pipeline
//! and server boundary those are wrapped in a rootcause `Report` so each layer
//! can attach its own context as errors propagate.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
