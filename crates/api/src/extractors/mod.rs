//! Custom Axum extractors.

pub mod auth_user;
pub mod client_info;

pub use client_info::ClientInfo;
