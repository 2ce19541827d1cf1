/// Button manager implementation using runtime queries
use crate::{
    authz::{self, Identity, Role},
    buttons::PermissionSpec,
    db::models::{ButtonPermission, CustomButton},
    error::{ApiError, ApiResult},
};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Button manager service
pub struct ButtonManager {
    db: SqlitePool,
}

impl ButtonManager {
    /// Create a new button manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a button at a location
    pub async fn create_button(
        &self,
        name: &str,
        url: &str,
        location_id: Uuid,
        created_by: Uuid,
    ) -> ApiResult<CustomButton> {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Button name cannot be empty".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ApiError::Validation(
                "Button URL must be an http(s) URL".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO custom_buttons (id, name, url, location_id, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(id)
        .bind(name)
        .bind(url)
        .bind(location_id)
        .bind(created_by)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        tracing::info!(button_id = %id, location_id = %location_id, "Button created");

        Ok(CustomButton {
            id,
            name: name.to_string(),
            url: url.to_string(),
            location_id,
            created_by,
            created_at: now,
        })
    }

    /// Get button by id
    pub async fn get_button(&self, id: Uuid) -> ApiResult<CustomButton> {
        let row = sqlx::query(
            "SELECT id, name, url, location_id, created_by, created_at
             FROM custom_buttons WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Button not found".to_string()))?;

        Ok(button_from_row(&row)?)
    }

    /// List the buttons at a location visible to the caller
    ///
    /// Visibility is decided by the authorization layer against freshly
    /// loaded permission rows; nothing is cached between requests.
    pub async fn list_visible_buttons(
        &self,
        identity: &Identity,
        location_id: Uuid,
    ) -> ApiResult<Vec<CustomButton>> {
        let rows = sqlx::query(
            "SELECT id, name, url, location_id, created_by, created_at
             FROM custom_buttons WHERE location_id = ?1 ORDER BY name",
        )
        .bind(location_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        let mut buttons = Vec::new();
        for row in rows {
            buttons.push(button_from_row(&row)?);
        }

        let permissions = self.permissions_at_location(location_id).await?;

        Ok(buttons
            .into_iter()
            .filter(|b| authz::button_visible(identity, b, &permissions))
            .collect())
    }

    /// Read the permission rows for one button
    pub async fn get_permissions(&self, button_id: Uuid) -> ApiResult<Vec<ButtonPermission>> {
        let rows = sqlx::query(
            "SELECT button_id, role, account_id FROM button_permissions WHERE button_id = ?1",
        )
        .bind(button_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        let mut permissions = Vec::new();
        for row in rows {
            permissions.push(permission_from_row(&row)?);
        }

        Ok(permissions)
    }

    /// Replace the full permission set for a button
    ///
    /// Delete-then-insert under one transaction, so a concurrent reader never
    /// observes an empty set mid-update and a failed step leaves the original
    /// set untouched.
    pub async fn set_permissions(
        &self,
        button_id: Uuid,
        permissions: &[PermissionSpec],
    ) -> ApiResult<()> {
        // Validate before any mutation
        for spec in permissions {
            match (&spec.role, &spec.account_id) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => {
                    return Err(ApiError::Validation(
                        "Each permission must set exactly one of role or accountId".to_string(),
                    ))
                }
            }
        }

        // Ensure the button exists so a typo'd id is NotFound, not a silent no-op
        self.get_button(button_id).await?;

        let mut tx = self.db.begin().await.map_err(ApiError::Database)?;

        sqlx::query("DELETE FROM button_permissions WHERE button_id = ?1")
            .bind(button_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::Database)?;

        for spec in permissions {
            sqlx::query(
                "INSERT INTO button_permissions (button_id, role, account_id) VALUES (?1, ?2, ?3)",
            )
            .bind(button_id)
            .bind(spec.role.map(|r| r.as_str()))
            .bind(spec.account_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::Database)?;
        }

        tx.commit().await.map_err(ApiError::Database)?;

        tracing::info!(
            button_id = %button_id,
            count = permissions.len(),
            "Button permissions replaced"
        );

        Ok(())
    }

    /// All permission rows for buttons at a location
    async fn permissions_at_location(&self, location_id: Uuid) -> ApiResult<Vec<ButtonPermission>> {
        let rows = sqlx::query(
            "SELECT bp.button_id, bp.role, bp.account_id
             FROM button_permissions bp
             JOIN custom_buttons b ON b.id = bp.button_id
             WHERE b.location_id = ?1",
        )
        .bind(location_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        let mut permissions = Vec::new();
        for row in rows {
            permissions.push(permission_from_row(&row)?);
        }

        Ok(permissions)
    }
}

fn button_from_row(row: &sqlx::sqlite::SqliteRow) -> ApiResult<CustomButton> {
    Ok(CustomButton {
        id: row.get("id"),
        name: row.get("name"),
        url: row.get("url"),
        location_id: row.get("location_id"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
    })
}

fn permission_from_row(row: &sqlx::sqlite::SqliteRow) -> ApiResult<ButtonPermission> {
    let role = match row.get::<Option<String>, _>("role") {
        Some(s) => Some(Role::from_str(&s)?),
        None => None,
    };

    Ok(ButtonPermission {
        button_id: row.get("button_id"),
        role,
        account_id: row.get("account_id"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> ButtonManager {
        let db = SqlitePool::connect(":memory:").await.unwrap();

        sqlx::query(
            r#"
            CREATE TABLE custom_buttons (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                url TEXT NOT NULL,
                location_id TEXT NOT NULL,
                created_by TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE button_permissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                button_id TEXT NOT NULL REFERENCES custom_buttons(id) ON DELETE CASCADE,
                role TEXT,
                account_id TEXT,
                CHECK ((role IS NULL) != (account_id IS NULL))
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        ButtonManager::new(db)
    }

    fn identity(account_id: Uuid, role: Role, locations: Vec<Uuid>) -> Identity {
        Identity {
            account_id,
            role,
            location_ids: locations,
        }
    }

    #[tokio::test]
    async fn test_create_button_validates_input() {
        let manager = setup_test_db().await;
        let loc = Uuid::new_v4();
        let creator = Uuid::new_v4();

        assert!(manager
            .create_button("", "https://example.com", loc, creator)
            .await
            .is_err());
        assert!(manager
            .create_button("Menu", "ftp://example.com", loc, creator)
            .await
            .is_err());
        assert!(manager
            .create_button("Menu", "https://example.com", loc, creator)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_role_permission_controls_visibility() {
        let manager = setup_test_db().await;
        let loc = Uuid::new_v4();
        let creator = Uuid::new_v4();

        let btn = manager
            .create_button("Attendance", "https://example.com/att", loc, creator)
            .await
            .unwrap();
        manager
            .set_permissions(
                btn.id,
                &[PermissionSpec {
                    role: Some(Role::Teacher),
                    account_id: None,
                }],
            )
            .await
            .unwrap();

        let teacher = identity(Uuid::new_v4(), Role::Teacher, vec![loc]);
        let office = identity(Uuid::new_v4(), Role::Office, vec![loc]);

        assert_eq!(
            manager.list_visible_buttons(&teacher, loc).await.unwrap().len(),
            1
        );
        assert_eq!(
            manager.list_visible_buttons(&office, loc).await.unwrap().len(),
            0
        );

        // Creator ownership overrides the permission rows
        let creator_identity = identity(creator, Role::Office, vec![loc]);
        assert_eq!(
            manager
                .list_visible_buttons(&creator_identity, loc)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_set_permissions_is_idempotent() {
        let manager = setup_test_db().await;
        let loc = Uuid::new_v4();
        let btn = manager
            .create_button("Menu", "https://example.com", loc, Uuid::new_v4())
            .await
            .unwrap();

        let account = Uuid::new_v4();
        let specs = vec![
            PermissionSpec {
                role: Some(Role::Teacher),
                account_id: None,
            },
            PermissionSpec {
                role: None,
                account_id: Some(account),
            },
        ];

        manager.set_permissions(btn.id, &specs).await.unwrap();
        let first = manager.get_permissions(btn.id).await.unwrap();

        manager.set_permissions(btn.id, &specs).await.unwrap();
        let second = manager.get_permissions(btn.id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn test_set_permissions_rejects_malformed_spec() {
        let manager = setup_test_db().await;
        let loc = Uuid::new_v4();
        let btn = manager
            .create_button("Menu", "https://example.com", loc, Uuid::new_v4())
            .await
            .unwrap();

        // Both set
        assert!(manager
            .set_permissions(
                btn.id,
                &[PermissionSpec {
                    role: Some(Role::Teacher),
                    account_id: Some(Uuid::new_v4()),
                }],
            )
            .await
            .is_err());

        // Neither set
        assert!(manager
            .set_permissions(
                btn.id,
                &[PermissionSpec {
                    role: None,
                    account_id: None,
                }],
            )
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_failed_replacement_keeps_original_set() {
        let manager = setup_test_db().await;
        let loc = Uuid::new_v4();
        let btn = manager
            .create_button("Menu", "https://example.com", loc, Uuid::new_v4())
            .await
            .unwrap();

        manager
            .set_permissions(
                btn.id,
                &[PermissionSpec {
                    role: Some(Role::Lead),
                    account_id: None,
                }],
            )
            .await
            .unwrap();

        // Second spec trips the table CHECK constraint mid-transaction; the
        // earlier delete must be rolled back with it. Insert directly so the
        // pre-mutation validation cannot intercept it.
        let mut tx = manager.db.begin().await.unwrap();
        sqlx::query("DELETE FROM button_permissions WHERE button_id = ?1")
            .bind(btn.id)
            .execute(&mut *tx)
            .await
            .unwrap();
        let violation = sqlx::query(
            "INSERT INTO button_permissions (button_id, role, account_id) VALUES (?1, NULL, NULL)",
        )
        .bind(btn.id)
        .execute(&mut *tx)
        .await;
        assert!(violation.is_err());
        drop(tx); // rollback

        let remaining = manager.get_permissions(btn.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].role, Some(Role::Lead));
    }

    #[tokio::test]
    async fn test_set_permissions_unknown_button() {
        let manager = setup_test_db().await;
        let result = manager.set_permissions(Uuid::new_v4(), &[]).await;
        match result.unwrap_err() {
            ApiError::NotFound(_) => {}
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }
}
