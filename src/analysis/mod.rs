//! Analysis modules.
//!
//! Feedback aggregation lives in [`aggregator`].

pub mod aggregator;

pub use aggregator::*;
