//! Flattens nested style rules into top-level rules in a single pass.
//!
//! Each rule present when the pass starts is expanded exactly once, however
//! many new rules the expansion inserts into the tree it is walking.

pub mod error;
pub mod flatten;
pub mod nesting;
pub mod parser;
pub mod sheet;

pub use error::NestingError;
pub use flatten::nest_once;
