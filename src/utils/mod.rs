//! # Utility Modules
//!
//! Supporting utilities for logging and observability.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup from `LoggingConfig`
//! - **Metrics**: Thread-safe session and packet counters

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LoggingGuard};
pub use metrics::{Metrics, MetricsSnapshot};
