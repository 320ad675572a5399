//! Infrastructure - configuration, metrics, and key dispatch
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults)
//! - `metrics` - Lock-free session counters
//! - `keys` - Global key-listener registry with scoped subscriptions

pub mod config;
pub mod keys;
pub mod metrics;

// Re-export commonly used types
pub use config::{Config, TrackerSettings};
pub use keys::{Key, KeyBus, KeySubscription};
pub use metrics::{Metrics, MetricsSummary};
