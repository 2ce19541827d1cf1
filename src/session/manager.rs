/// Session manager implementation using runtime queries
use crate::{
    authz::{Identity, Role},
    config::ServerConfig,
    db::models::Account,
    error::{ApiError, ApiResult},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Hash a password with Argon2id
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored Argon2id hash (constant-time)
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Corrupt password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// JWT claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub role: Role,
    pub locations: Vec<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

/// Session manager service
pub struct SessionManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Authenticate a credential pair and mint a session token
    ///
    /// Absent account, inactive account and wrong password all produce the
    /// same error so the caller cannot tell which check failed.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> ApiResult<(Account, String, DateTime<Utc>)> {
        let invalid = || ApiError::Authentication("Invalid email or password".to_string());

        let account = match self.get_account_by_email(email).await? {
            Some(account) => account,
            None => return Err(invalid()),
        };

        if !account.is_active {
            return Err(invalid());
        }

        if !verify_password(password, &account.password_hash)? {
            return Err(invalid());
        }

        let location_ids = self.accessible_location_ids(&account).await?;
        let (token, expires_at) = self.generate_session_token(&account, &location_ids)?;

        tracing::info!(account_id = %account.id, role = account.role.as_str(), "Login successful");

        Ok((account, token, expires_at))
    }

    /// Decode and verify a session token, failing closed on any defect
    pub fn decode_and_verify(&self, token: &str) -> ApiResult<SessionClaims> {
        use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

        let decoding_key =
            DecodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<SessionClaims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Authentication("Token has expired".to_string())
                }
                _ => ApiError::Authentication("Invalid token".to_string()),
            }
        })?;

        Ok(data.claims)
    }

    /// Load the caller identity for verified claims
    ///
    /// Role and memberships are re-read from the store on every request so a
    /// deactivated account or revoked membership takes effect immediately,
    /// regardless of what a still-live token claims.
    pub async fn load_identity(&self, account_id: Uuid) -> ApiResult<Identity> {
        let row = sqlx::query("SELECT role, is_active FROM accounts WHERE id = ?1")
            .bind(account_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::Authentication("Invalid session".to_string()))?;

        let is_active: bool = row.get("is_active");
        if !is_active {
            return Err(ApiError::Authentication("Invalid session".to_string()));
        }

        let role = Role::from_str(row.get::<String, _>("role").as_str())?;
        let location_ids = self.membership_location_ids(account_id).await?;

        Ok(Identity {
            account_id,
            role,
            location_ids,
        })
    }

    /// Issue a single-use password reset token with a fixed expiry window
    ///
    /// Returns None for an unknown email; the API layer answers with the same
    /// success-shaped response either way so account existence never leaks.
    pub async fn issue_password_reset_token(
        &self,
        email: &str,
    ) -> ApiResult<Option<(String, Account)>> {
        let account = match self.get_account_by_email(email).await? {
            Some(account) if account.is_active => account,
            _ => return Ok(None),
        };

        let token = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at =
            now + Duration::minutes(self.config.authentication.reset_token_lifetime_minutes);

        sqlx::query(
            "UPDATE accounts SET reset_token = ?1, reset_token_expires_at = ?2, updated_at = ?3
             WHERE id = ?4",
        )
        .bind(&token)
        .bind(expires_at)
        .bind(now)
        .bind(account.id)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        tracing::info!(account_id = %account.id, "Password reset token issued");

        Ok(Some((token, account)))
    }

    /// Consume a reset token: replace the password hash and clear the token
    /// atomically. Unknown and expired tokens produce the same error.
    pub async fn consume_reset_token(&self, token: &str, new_password: &str) -> ApiResult<()> {
        if new_password.len() < 8 {
            return Err(ApiError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let invalid = || ApiError::Authentication("Invalid or expired reset token".to_string());

        let mut tx = self.db.begin().await.map_err(ApiError::Database)?;

        let row = sqlx::query(
            "SELECT id, reset_token_expires_at FROM accounts WHERE reset_token = ?1",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(invalid)?;

        let account_id: Uuid = row.get("id");
        let expires_at: Option<DateTime<Utc>> = row.get("reset_token_expires_at");

        match expires_at {
            Some(expiry) if Utc::now() <= expiry => {}
            _ => return Err(invalid()),
        }

        let password_hash = hash_password(new_password)?;
        let now = Utc::now();

        sqlx::query(
            "UPDATE accounts
             SET password_hash = ?1, reset_token = NULL, reset_token_expires_at = NULL,
                 updated_at = ?2
             WHERE id = ?3",
        )
        .bind(&password_hash)
        .bind(now)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

        tx.commit().await.map_err(ApiError::Database)?;

        tracing::info!(account_id = %account_id, "Password reset completed");

        Ok(())
    }

    /// Location IDs embedded in a fresh token: all locations for developers,
    /// membership rows for everyone else
    async fn accessible_location_ids(&self, account: &Account) -> ApiResult<Vec<Uuid>> {
        if account.role == Role::Developer {
            let rows = sqlx::query("SELECT id FROM locations ORDER BY created_at")
                .fetch_all(&self.db)
                .await
                .map_err(ApiError::Database)?;
            return Ok(rows.iter().map(|r| r.get("id")).collect());
        }

        self.membership_location_ids(account.id).await
    }

    async fn membership_location_ids(&self, account_id: Uuid) -> ApiResult<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT location_id FROM account_locations WHERE account_id = ?1",
        )
        .bind(account_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(rows.iter().map(|r| r.get("location_id")).collect())
    }

    /// Find account by email (case-sensitive exact match)
    async fn get_account_by_email(&self, email: &str) -> ApiResult<Option<Account>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, is_active, created_by, deactivated_by,
                    deactivated_at, reset_token, reset_token_expires_at, created_at, updated_at
             FROM accounts WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?;

        match row {
            Some(row) => Ok(Some(account_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Generate a signed session token embedding identity, role and locations
    fn generate_session_token(
        &self,
        account: &Account,
        location_ids: &[Uuid],
    ) -> ApiResult<(String, DateTime<Utc>)> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.authentication.session_lifetime_hours);

        let claims = SessionClaims {
            sub: account.id,
            role: account.role,
            locations: location_ids.to_vec(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Jwt(format!("Failed to generate token: {}", e)))?;

        Ok((token, expires_at))
    }
}

/// Build an Account from a full row
pub(crate) fn account_from_row(row: &sqlx::sqlite::SqliteRow) -> ApiResult<Account> {
    Ok(Account {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: Role::from_str(row.get::<String, _>("role").as_str())?,
        is_active: row.get("is_active"),
        created_by: row.get("created_by"),
        deactivated_by: row.get("deactivated_by"),
        deactivated_at: row.get("deactivated_at"),
        reset_token: row.get("reset_token"),
        reset_token_expires_at: row.get("reset_token_expires_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AuthConfig, LoggingConfig, OperatingMode, ServiceConfig, StorageConfig,
    };
    use std::path::PathBuf;

    fn test_config() -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 4100,
                version: "0.1.0".to_string(),
                operating_mode: OperatingMode::Normal,
            },
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                database: PathBuf::from(":memory:"),
            },
            authentication: AuthConfig {
                jwt_secret: "test-secret-key-for-testing-only-0123".to_string(),
                session_lifetime_hours: 24,
                reset_token_lifetime_minutes: 60,
            },
            email: None,
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        })
    }

    async fn setup_test_db() -> SessionManager {
        let db = SqlitePool::connect(":memory:").await.unwrap();

        sqlx::query(
            r#"
            CREATE TABLE accounts (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_by TEXT,
                deactivated_by TEXT,
                deactivated_at DATETIME,
                reset_token TEXT,
                reset_token_expires_at DATETIME,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE locations (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_by TEXT,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE account_locations (
                account_id TEXT NOT NULL,
                location_id TEXT NOT NULL,
                PRIMARY KEY (account_id, location_id)
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        SessionManager::new(db, test_config())
    }

    async fn insert_account(
        manager: &SessionManager,
        email: &str,
        password: &str,
        role: Role,
        is_active: bool,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO accounts (id, email, password_hash, role, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(id)
        .bind(email)
        .bind(hash_password(password).unwrap())
        .bind(role.as_str())
        .bind(is_active)
        .bind(now)
        .bind(now)
        .execute(&manager.db)
        .await
        .unwrap();
        id
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("Secret123!").unwrap();
        assert!(verify_password("Secret123!", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_authenticate_success_and_token_claims() {
        let manager = setup_test_db().await;
        let id = insert_account(&manager, "lead@school.test", "Secret123!", Role::Lead, true).await;

        let loc = Uuid::new_v4();
        sqlx::query("INSERT INTO locations (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(loc)
            .bind("North Campus")
            .bind(Utc::now())
            .execute(&manager.db)
            .await
            .unwrap();
        sqlx::query("INSERT INTO account_locations (account_id, location_id) VALUES (?1, ?2)")
            .bind(id)
            .bind(loc)
            .execute(&manager.db)
            .await
            .unwrap();

        let (account, token, _expires) = manager
            .authenticate("lead@school.test", "Secret123!")
            .await
            .unwrap();
        assert_eq!(account.id, id);

        let claims = manager.decode_and_verify(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Lead);
        assert_eq!(claims.locations, vec![loc]);
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let manager = setup_test_db().await;
        insert_account(&manager, "office@school.test", "Secret123!", Role::Office, true).await;
        insert_account(&manager, "gone@school.test", "Secret123!", Role::Teacher, false).await;

        let wrong_password = manager
            .authenticate("office@school.test", "nope")
            .await
            .unwrap_err();
        let unknown_email = manager
            .authenticate("nobody@school.test", "Secret123!")
            .await
            .unwrap_err();
        let inactive = manager
            .authenticate("gone@school.test", "Secret123!")
            .await
            .unwrap_err();

        for err in [wrong_password, unknown_email, inactive] {
            match err {
                ApiError::Authentication(msg) => {
                    assert_eq!(msg, "Invalid email or password");
                }
                other => panic!("Expected Authentication error, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_developer_token_embeds_all_locations() {
        let manager = setup_test_db().await;
        insert_account(&manager, "dev@school.test", "Secret123!", Role::Developer, true).await;

        for name in ["North", "South"] {
            sqlx::query("INSERT INTO locations (id, name, created_at) VALUES (?1, ?2, ?3)")
                .bind(Uuid::new_v4())
                .bind(name)
                .bind(Utc::now())
                .execute(&manager.db)
                .await
                .unwrap();
        }

        let (_, token, _) = manager
            .authenticate("dev@school.test", "Secret123!")
            .await
            .unwrap();
        let claims = manager.decode_and_verify(&token).unwrap();
        assert_eq!(claims.locations.len(), 2);
    }

    #[tokio::test]
    async fn test_decode_rejects_garbage_and_foreign_signature() {
        let manager = setup_test_db().await;

        assert!(manager.decode_and_verify("not-a-token").is_err());

        // Token signed with a different secret must be rejected
        use jsonwebtoken::{encode, EncodingKey, Header};
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            role: Role::Developer,
            locations: vec![],
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
        };
        let forged = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret-entirely-0123456789"),
        )
        .unwrap();
        assert!(manager.decode_and_verify(&forged).is_err());
    }

    #[tokio::test]
    async fn test_expired_token_fails_closed() {
        let manager = setup_test_db().await;

        use jsonwebtoken::{encode, EncodingKey, Header};
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            role: Role::Teacher,
            locations: vec![],
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-key-for-testing-only-0123".as_bytes()),
        )
        .unwrap();

        match manager.decode_and_verify(&token).unwrap_err() {
            ApiError::Authentication(msg) => assert!(msg.contains("expired")),
            other => panic!("Expected Authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_identity_rejects_deactivated_account() {
        let manager = setup_test_db().await;
        let id = insert_account(&manager, "t@school.test", "Secret123!", Role::Teacher, true).await;

        assert!(manager.load_identity(id).await.is_ok());

        sqlx::query("UPDATE accounts SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&manager.db)
            .await
            .unwrap();

        assert!(manager.load_identity(id).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_token_round_trip() {
        let manager = setup_test_db().await;
        insert_account(&manager, "lead@school.test", "OldPass123!", Role::Lead, true).await;

        let (token, account) = manager
            .issue_password_reset_token("lead@school.test")
            .await
            .unwrap()
            .expect("known email should yield a token");
        assert_eq!(account.email, "lead@school.test");

        manager
            .consume_reset_token(&token, "NewPass123!")
            .await
            .unwrap();

        // New password works, old one does not
        assert!(manager
            .authenticate("lead@school.test", "NewPass123!")
            .await
            .is_ok());
        assert!(manager
            .authenticate("lead@school.test", "OldPass123!")
            .await
            .is_err());

        // Token is single-use
        let err = manager
            .consume_reset_token(&token, "AnotherPass123!")
            .await
            .unwrap_err();
        match err {
            ApiError::Authentication(msg) => assert!(msg.contains("Invalid or expired")),
            other => panic!("Expected Authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reset_token_unknown_email_yields_none() {
        let manager = setup_test_db().await;
        let result = manager
            .issue_password_reset_token("unknown@school.test")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_expired_reset_token_rejected() {
        let manager = setup_test_db().await;
        let id = insert_account(&manager, "o@school.test", "Secret123!", Role::Office, true).await;

        let (token, _) = manager
            .issue_password_reset_token("o@school.test")
            .await
            .unwrap()
            .unwrap();

        // Force the expiry into the past
        sqlx::query("UPDATE accounts SET reset_token_expires_at = ?1 WHERE id = ?2")
            .bind(Utc::now() - Duration::hours(2))
            .bind(id)
            .execute(&manager.db)
            .await
            .unwrap();

        assert!(manager
            .consume_reset_token(&token, "NewPass123!")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_reset_rejects_weak_password() {
        let manager = setup_test_db().await;
        insert_account(&manager, "w@school.test", "Secret123!", Role::Office, true).await;

        let (token, _) = manager
            .issue_password_reset_token("w@school.test")
            .await
            .unwrap()
            .unwrap();

        match manager.consume_reset_token(&token, "short").await.unwrap_err() {
            ApiError::Validation(_) => {}
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }
}
