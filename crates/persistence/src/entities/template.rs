//! Premade template entity (database row mapping).

use sqlx::FromRow;

use domain::models::PremadeTemplate;

/// Database row mapping for the premade_templates table.
#[derive(Debug, Clone, FromRow)]
pub struct PremadeTemplateEntity {
    pub id: String,
    pub name: String,
    pub category: String,
    pub icon_emoji: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
}

impl From<PremadeTemplateEntity> for PremadeTemplate {
    fn from(entity: PremadeTemplateEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            category: entity.category,
            icon_emoji: entity.icon_emoji,
            description: entity.description,
            image_path: entity.image_path,
            is_active: entity.is_active,
            sort_order: entity.sort_order,
        }
    }
}
