pub mod cache;
pub mod health;
pub mod query;

pub use cache::{cache_cleanup_handler, cache_clear_handler, cache_stats_handler, metrics_handler};
pub use health::health_handler;
pub use query::query_handler;
