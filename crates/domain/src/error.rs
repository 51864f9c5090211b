//! Domain error types.

use thiserror::Error;
use validator::ValidationErrors;

use crate::services::artwork::ArtworkError;
use crate::services::notification::DeliveryError;

/// Failure reported by a [`CardStore`](crate::store::CardStore) or
/// [`TemplateStore`](crate::store::TemplateStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Error type for card operations.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Artwork deletion failed: {0}")]
    ArtworkDelete(#[source] ArtworkError),

    #[error("Artwork storage failed: {0}")]
    ArtworkStorage(#[source] ArtworkError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl From<ValidationErrors> for CardError {
    fn from(errors: ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: invalid", field),
                })
            })
            .collect();
        CardError::Validation(messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct NamedForm {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
    }

    #[test]
    fn test_validation_errors_convert() {
        let err = NamedForm {
            name: String::new(),
        }
        .validate()
        .unwrap_err();
        let card_err: CardError = err.into();
        match card_err {
            CardError::Validation(msg) => assert_eq!(msg, "name: Name is required"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(CardError::NotFound("eCard".into()).to_string(), "eCard not found");
    }
}
