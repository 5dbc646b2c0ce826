//! # Observability
//!
//! - `logging`: `tracing-subscriber` initialisation
//! - `metrics`: Prometheus metrics collection

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, try_init_logging};
pub use metrics::{gather_metrics, register_metrics};
