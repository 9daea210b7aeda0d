//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Pluggy HTTP client for AggregatorApi
//! - JSON snapshot files for AggregateSink
//! - In-memory sink for dry runs and tests
//! - Demo aggregator serving sample data

pub mod demo;
pub mod json_sink;
pub mod memory;
pub mod pluggy;

#[cfg(test)]
pub mod pluggy_mock;
