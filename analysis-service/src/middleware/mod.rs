pub mod auth;
pub mod metrics;

pub use auth::require_operator_token;
pub use metrics::http_metrics_middleware;
