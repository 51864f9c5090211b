//! Domain layer for the eCards backend.
//!
//! This crate contains:
//! - Domain models (Card, Sender, ViewRecord, PremadeTemplate)
//! - Collaborator traits for storage, artwork files and notification delivery
//! - Lifecycle policy and the core card services
//! - In-memory collaborators used by tests and local development

pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{CardError, StoreError};
