//! Provider-agnostic normalization.
//!
//! - region resolution for column names and identifiers (`alias`)
//! - locale-tolerant numbers and derived metrics (`number`)
//! - latest row per region for long-format files (`latest`)

pub mod alias;
pub mod latest;
pub mod number;

pub use alias::*;
pub use latest::*;
pub use number::*;
