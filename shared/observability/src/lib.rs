//! Catalog QA observability library.
//!
//! Provides standardized tracing-subscriber setup and a process-wide request
//! metrics collector shared by the HTTP handlers and the query pipeline.

pub mod init;
pub mod metrics;
pub mod middleware;

pub use init::*;
pub use metrics::*;
pub use middleware::{request_logger, RequestId, RequestLogger};

// Re-export tracing for convenience
pub use tracing::{debug, error, info, span, trace, warn, Instrument, Level};
