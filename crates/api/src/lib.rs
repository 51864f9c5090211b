//! eCards HTTP service: configuration, routing, middleware, adapters and
//! background jobs around the domain crate.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod services;
