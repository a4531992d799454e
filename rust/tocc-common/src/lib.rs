//! Core definitions (error types, result alias and validation macros), relied upon
//! by all tocc-* crates.

pub mod error;
pub mod macros;
pub mod result;

pub use result::Result;
