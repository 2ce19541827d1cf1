/// Account manager implementation using runtime queries
use crate::{
    account::AccountInfo,
    authz::{self, Identity, Role},
    db::models::Account,
    error::{ApiError, ApiResult},
    session::{account_from_row, hash_password},
};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use validator::ValidateEmail;

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a new account with its location memberships
    ///
    /// The account insert and all membership inserts happen inside a single
    /// transaction; any failure rolls the whole creation back.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
        location_ids: &[Uuid],
        created_by: Uuid,
    ) -> ApiResult<Account> {
        if !email.validate_email() {
            return Err(ApiError::Validation("Invalid email format".to_string()));
        }

        if password.len() < 8 {
            return Err(ApiError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.email_exists(email).await? {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(password)?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.db.begin().await.map_err(ApiError::Database)?;

        sqlx::query(
            "INSERT INTO accounts (id, email, password_hash, role, is_active, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(id)
        .bind(email)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(true)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

        for location_id in location_ids {
            sqlx::query(
                "INSERT INTO account_locations (account_id, location_id) VALUES (?1, ?2)",
            )
            .bind(id)
            .bind(location_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::Database)?;
        }

        tx.commit().await.map_err(ApiError::Database)?;

        tracing::info!(account_id = %id, role = role.as_str(), "Account created");

        Ok(Account {
            id,
            email: email.to_string(),
            password_hash,
            role,
            is_active: true,
            created_by: Some(created_by),
            deactivated_by: None,
            deactivated_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get account by id
    pub async fn get_account(&self, id: Uuid) -> ApiResult<Account> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, is_active, created_by, deactivated_by,
                    deactivated_at, reset_token, reset_token_expires_at, created_at, updated_at
             FROM accounts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

        account_from_row(&row)
    }

    /// List accounts with a membership at a location
    pub async fn list_accounts_at_location(&self, location_id: Uuid) -> ApiResult<Vec<AccountInfo>> {
        let rows = sqlx::query(
            "SELECT a.id, a.email, a.role, a.is_active, a.created_at
             FROM accounts a
             JOIN account_locations al ON al.account_id = a.id
             WHERE al.location_id = ?1
             ORDER BY a.email",
        )
        .bind(location_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(AccountInfo {
                id: row.get("id"),
                email: row.get("email"),
                role: Role::from_str(row.get::<String, _>("role").as_str())?,
                is_active: row.get("is_active"),
                created_at: row.get("created_at"),
            });
        }

        Ok(accounts)
    }

    /// Soft-deactivate an account
    ///
    /// Enforces the cross-role rules in the backend: never self, and only a
    /// developer may deactivate a developer. Accounts are never hard-deleted.
    pub async fn deactivate_account(&self, identity: &Identity, target_id: Uuid) -> ApiResult<()> {
        let target = self.get_account(target_id).await?;

        authz::check_deactivate(identity, target.id, target.role)?;

        if !target.is_active {
            return Err(ApiError::Conflict("Account is already deactivated".to_string()));
        }

        let now = Utc::now();
        sqlx::query(
            "UPDATE accounts
             SET is_active = 0, deactivated_by = ?1, deactivated_at = ?2, updated_at = ?3
             WHERE id = ?4",
        )
        .bind(identity.account_id)
        .bind(now)
        .bind(now)
        .bind(target_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        tracing::info!(
            account_id = %target_id,
            deactivated_by = %identity.account_id,
            "Account deactivated"
        );

        Ok(())
    }

    /// Check if email exists
    async fn email_exists(&self, email: &str) -> ApiResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db)
            .await
            .map_err(ApiError::Database)?;

        Ok(count > 0)
    }
}
