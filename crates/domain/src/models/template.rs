//! Premade artwork template domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A premade artwork a sender can pick instead of uploading one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremadeTemplate {
    pub id: String,
    pub name: String,
    pub category: String,
    pub icon_emoji: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
}

/// Create/update payload for a premade template.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    /// Optional on create; a UUID string is assigned when blank.
    #[serde(default)]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: String,

    #[validate(length(max = 10, message = "Icon cannot exceed 10 characters"))]
    #[serde(default)]
    pub icon_emoji: String,

    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 500, message = "Image path cannot exceed 500 characters"))]
    pub image_path: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default)]
    pub sort_order: i32,
}

fn default_active() -> bool {
    true
}

impl TemplateRequest {
    /// Builds the template stored under `id`.
    pub fn into_template(self, id: String) -> PremadeTemplate {
        PremadeTemplate {
            id,
            name: self.name,
            category: self.category,
            icon_emoji: self.icon_emoji,
            description: self.description,
            image_path: self.image_path,
            is_active: self.is_active,
            sort_order: self.sort_order,
        }
    }
}
