/// Template manager implementation using runtime queries
use crate::{
    db::models::EmailTemplate,
    error::{ApiError, ApiResult},
};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Template manager service
pub struct TemplateManager {
    db: SqlitePool,
}

impl TemplateManager {
    /// Create a new template manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a template at a location
    pub async fn create_template(
        &self,
        name: &str,
        subject: &str,
        body: &str,
        location_id: Uuid,
        created_by: Uuid,
    ) -> ApiResult<EmailTemplate> {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Template name cannot be empty".to_string()));
        }
        if subject.trim().is_empty() {
            return Err(ApiError::Validation("Template subject cannot be empty".to_string()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO email_templates (id, name, subject, body, location_id, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(id)
        .bind(name)
        .bind(subject)
        .bind(body)
        .bind(location_id)
        .bind(created_by)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        tracing::info!(template_id = %id, location_id = %location_id, "Template created");

        Ok(EmailTemplate {
            id,
            name: name.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            location_id,
            created_by,
            created_at: now,
        })
    }

    /// Get template by id
    pub async fn get_template(&self, id: Uuid) -> ApiResult<EmailTemplate> {
        let row = sqlx::query(
            "SELECT id, name, subject, body, location_id, created_by, created_at
             FROM email_templates WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

        Ok(template_from_row(&row))
    }

    /// List templates at a location
    pub async fn list_templates(&self, location_id: Uuid) -> ApiResult<Vec<EmailTemplate>> {
        let rows = sqlx::query(
            "SELECT id, name, subject, body, location_id, created_by, created_at
             FROM email_templates WHERE location_id = ?1 ORDER BY name",
        )
        .bind(location_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(rows.iter().map(template_from_row).collect())
    }
}

fn template_from_row(row: &sqlx::sqlite::SqliteRow) -> EmailTemplate {
    EmailTemplate {
        id: row.get("id"),
        name: row.get("name"),
        subject: row.get("subject"),
        body: row.get("body"),
        location_id: row.get("location_id"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
    }
}
