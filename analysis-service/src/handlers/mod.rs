//! HTTP handlers for the relay.

pub mod analyze;
pub mod health;
pub mod metrics;
