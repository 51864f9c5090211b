//! Premade template repository.

use async_trait::async_trait;
use sqlx::PgPool;

use domain::error::StoreError;
use domain::models::PremadeTemplate;
use domain::store::TemplateStore;

use crate::entities::PremadeTemplateEntity;
use crate::metrics::QueryTimer;

/// Postgres unique violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Repository for premade artwork templates.
#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    /// Creates a new TemplateRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for TemplateRepository {
    async fn list_active(&self) -> Result<Vec<PremadeTemplate>, StoreError> {
        let timer = QueryTimer::new("list_active_templates");
        let result = sqlx::query_as::<_, PremadeTemplateEntity>(
            r#"
            SELECT * FROM premade_templates
            WHERE is_active = TRUE
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn find_active(&self, id: &str) -> Result<Option<PremadeTemplate>, StoreError> {
        let timer = QueryTimer::new("find_active_template");
        let result = sqlx::query_as::<_, PremadeTemplateEntity>(
            "SELECT * FROM premade_templates WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn insert_template(
        &self,
        template: PremadeTemplate,
    ) -> Result<PremadeTemplate, StoreError> {
        let timer = QueryTimer::new("insert_template");
        let result = sqlx::query_as::<_, PremadeTemplateEntity>(
            r#"
            INSERT INTO premade_templates
                (id, name, category, icon_emoji, description, image_path, is_active, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&template.id)
        .bind(&template.name)
        .bind(&template.category)
        .bind(&template.icon_emoji)
        .bind(&template.description)
        .bind(&template.image_path)
        .bind(template.is_active)
        .bind(template.sort_order)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        match result {
            Ok(entity) => Ok(entity.into()),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(StoreError::Conflict(format!(
                    "template {} already exists",
                    template.id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_template(&self, template: PremadeTemplate) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("update_template");
        let result = sqlx::query(
            r#"
            UPDATE premade_templates SET
                name = $2,
                category = $3,
                icon_emoji = $4,
                description = $5,
                image_path = $6,
                is_active = $7,
                sort_order = $8
            WHERE id = $1
            "#,
        )
        .bind(&template.id)
        .bind(&template.name)
        .bind(&template.category)
        .bind(&template.icon_emoji)
        .bind(&template.description)
        .bind(&template.image_path)
        .bind(template.is_active)
        .bind(template.sort_order)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    async fn deactivate_template(&self, id: &str) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("deactivate_template");
        let result = sqlx::query("UPDATE premade_templates SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
