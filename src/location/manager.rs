/// Location manager implementation using runtime queries
use crate::{
    authz::{Identity, Role},
    db::models::Location,
    error::{ApiError, ApiResult},
};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Location manager service
pub struct LocationManager {
    db: SqlitePool,
}

impl LocationManager {
    /// Create a new location manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a location
    pub async fn create_location(&self, name: &str, created_by: Uuid) -> ApiResult<Location> {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Location name cannot be empty".to_string()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO locations (id, name, created_by, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id)
        .bind(name)
        .bind(created_by)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        tracing::info!(location_id = %id, name, "Location created");

        Ok(Location {
            id,
            name: name.to_string(),
            created_by: Some(created_by),
            created_at: now,
        })
    }

    /// List every location (developer administration view)
    pub async fn list_locations(&self) -> ApiResult<Vec<Location>> {
        let rows = sqlx::query(
            "SELECT id, name, created_by, created_at FROM locations ORDER BY name",
        )
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(rows.iter().map(location_from_row).collect())
    }

    /// List the locations an identity can access: all of them for a
    /// developer, membership rows for everyone else
    pub async fn list_for_identity(&self, identity: &Identity) -> ApiResult<Vec<Location>> {
        if identity.role == Role::Developer {
            return self.list_locations().await;
        }

        let rows = sqlx::query(
            "SELECT l.id, l.name, l.created_by, l.created_at
             FROM locations l
             JOIN account_locations al ON al.location_id = l.id
             WHERE al.account_id = ?1
             ORDER BY l.name",
        )
        .bind(identity.account_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(rows.iter().map(location_from_row).collect())
    }

    /// Check a location exists
    pub async fn location_exists(&self, id: Uuid) -> ApiResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.db)
            .await
            .map_err(ApiError::Database)?;

        Ok(count > 0)
    }
}

fn location_from_row(row: &sqlx::sqlite::SqliteRow) -> Location {
    Location {
        id: row.get("id"),
        name: row.get("name"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
    }
}
