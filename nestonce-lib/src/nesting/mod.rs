//! Single-pass flattening of nested style rules.
//!
//! [`controller::run`] captures every rule up front and hands each one to a
//! [`expander::RuleExpander`] exactly once, so rules created while flattening
//! are never expanded a second time.

pub mod controller;
pub mod expander;
pub mod options;
pub mod selector;
pub mod snapshot;

pub use controller::{run, PassStats};
pub use expander::{NestedRuleExpander, RuleExpander};
pub use options::{NestingContext, NestingOptions, StalePolicy};
