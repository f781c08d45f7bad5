//! Per-counterpart unseen counts.

pub mod aggregator;

pub use aggregator::UnseenAggregator;
