//! sitewatch - website uptime monitoring with debounced alerting
//!
//! This crate provides:
//! - One independent polling worker per website
//! - Hysteresis and debounce alerting policies
//! - Email and email-to-SMS notifications
//! - Prometheus metrics

pub mod config;
pub mod health;
pub mod metrics;
pub mod notify;
pub mod probe;
pub mod scheduler;
pub mod util;

pub use config::Config;
