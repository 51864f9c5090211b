//! Repository implementations for database operations.

pub mod card;
pub mod template;

pub use card::CardRepository;
pub use template::TemplateRepository;
