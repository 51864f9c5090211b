//! Premade template management.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use shared::validation::validate_template_id;

use crate::error::CardError;
use crate::models::{PremadeTemplate, TemplateRequest};
use crate::store::TemplateStore;

#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn TemplateStore>,
}

impl TemplateService {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<PremadeTemplate>, CardError> {
        Ok(self.store.list_active().await?)
    }

    /// Ids of active templates in display order.
    pub async fn active_ids(&self) -> Result<Vec<String>, CardError> {
        Ok(self.list().await?.into_iter().map(|t| t.id).collect())
    }

    pub async fn get(&self, id: &str) -> Result<PremadeTemplate, CardError> {
        self.store
            .find_active(id)
            .await?
            .ok_or_else(|| CardError::NotFound("Template".to_string()))
    }

    /// Creates a template; a blank id is replaced with a fresh UUID string.
    pub async fn create(&self, request: TemplateRequest) -> Result<PremadeTemplate, CardError> {
        request.validate()?;

        let id = match request.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                validate_template_id(id).map_err(|e| {
                    CardError::Validation(
                        e.message
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Invalid template id".to_string()),
                    )
                })?;
                id.to_string()
            }
            _ => Uuid::new_v4().to_string(),
        };

        let template = self.store.insert_template(request.into_template(id)).await?;
        tracing::info!(template_id = %template.id, "Created premade template");
        Ok(template)
    }

    /// Replaces every field of template `id`.
    pub async fn update(&self, id: &str, request: TemplateRequest) -> Result<(), CardError> {
        request.validate()?;
        let updated = self
            .store
            .update_template(request.into_template(id.to_string()))
            .await?;
        if !updated {
            return Err(CardError::NotFound("Template".to_string()));
        }
        tracing::info!(template_id = %id, "Updated premade template");
        Ok(())
    }

    /// Soft-deletes template `id`.
    pub async fn deactivate(&self, id: &str) -> Result<(), CardError> {
        if !self.store.deactivate_template(id).await? {
            return Err(CardError::NotFound("Template".to_string()));
        }
        tracing::info!(template_id = %id, "Deactivated premade template");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCardStore;

    fn request(id: Option<&str>, name: &str, sort_order: i32) -> TemplateRequest {
        TemplateRequest {
            id: id.map(str::to_string),
            name: name.to_string(),
            category: "Birthday".to_string(),
            icon_emoji: "🎂".to_string(),
            description: None,
            image_path: None,
            is_active: true,
            sort_order,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_when_blank() {
        let service = TemplateService::new(Arc::new(InMemoryCardStore::new()));
        let created = service.create(request(Some("  "), "Cake", 1)).await.unwrap();
        assert!(Uuid::parse_str(&created.id).is_ok());

        let named = service
            .create(request(Some("balloons"), "Balloons", 0))
            .await
            .unwrap();
        assert_eq!(named.id, "balloons");

        assert_eq!(
            service.active_ids().await.unwrap(),
            vec!["balloons".to_string(), created.id]
        );
    }

    #[tokio::test]
    async fn test_create_rejects_bad_id_and_duplicates() {
        let service = TemplateService::new(Arc::new(InMemoryCardStore::new()));
        assert!(matches!(
            service.create(request(Some("../x"), "Bad", 0)).await,
            Err(CardError::Validation(_))
        ));

        service.create(request(Some("cake"), "Cake", 0)).await.unwrap();
        assert!(matches!(
            service.create(request(Some("cake"), "Cake", 0)).await,
            Err(CardError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let service = TemplateService::new(Arc::new(InMemoryCardStore::new()));
        service.create(request(Some("cake"), "Cake", 0)).await.unwrap();

        service
            .update("cake", request(None, "Chocolate Cake", 5))
            .await
            .unwrap();
        let template = service.get("cake").await.unwrap();
        assert_eq!(template.name, "Chocolate Cake");
        assert_eq!(template.sort_order, 5);

        service.deactivate("cake").await.unwrap();
        assert!(matches!(
            service.get("cake").await,
            Err(CardError::NotFound(_))
        ));
        assert!(service.list().await.unwrap().is_empty());

        assert!(matches!(
            service.update("missing", request(None, "X", 0)).await,
            Err(CardError::NotFound(_))
        ));
        assert!(matches!(
            service.deactivate("missing").await,
            Err(CardError::NotFound(_))
        ));
    }
}
