//! HTTP route handlers.

pub mod admin;
pub mod ecards;
pub mod health;
pub mod templates;
