#![deny(missing_docs)]

//! Core library for the Daily Light devotional service.

/// HTTP routing and handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Devotional prompt construction and generation service.
pub mod devotional;
/// Chat-completion client abstraction and the OpenAI adapter.
pub mod generation;
/// Structured logging and tracing setup.
pub mod logging;
/// Request outcome counters.
pub mod metrics;
