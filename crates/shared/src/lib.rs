//! Shared utilities and common types for the eCards backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Bearer token verification for the external identity provider
//! - Common validation logic

pub mod jwt;
pub mod validation;
