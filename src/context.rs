/// Application context and dependency injection
use crate::{
    account::AccountManager,
    buttons::ButtonManager,
    config::ServerConfig,
    db,
    error::ApiResult,
    location::LocationManager,
    mailer::Mailer,
    notify::BulkNotifier,
    session::SessionManager,
    templates::TemplateManager,
};
use sqlx::SqlitePool;
use std::{sync::Arc, time::Duration};

const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub session_manager: Arc<SessionManager>,
    pub account_manager: Arc<AccountManager>,
    pub location_manager: Arc<LocationManager>,
    pub button_manager: Arc<ButtonManager>,
    pub template_manager: Arc<TemplateManager>,
    pub notifier: Arc<BulkNotifier>,
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        config.validate()?;

        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let config = Arc::new(config);

        let session_manager = Arc::new(SessionManager::new(db.clone(), Arc::clone(&config)));
        let account_manager = Arc::new(AccountManager::new(db.clone()));
        let location_manager = Arc::new(LocationManager::new(db.clone()));
        let button_manager = Arc::new(ButtonManager::new(db.clone()));
        let template_manager = Arc::new(TemplateManager::new(db.clone()));

        let mailer = Arc::new(Mailer::new(config.email.clone())?);

        let send_timeout = Duration::from_secs(
            config
                .email
                .as_ref()
                .map(|e| e.send_timeout_secs)
                .unwrap_or(DEFAULT_SEND_TIMEOUT_SECS),
        );
        let notifier = Arc::new(BulkNotifier::new(
            db.clone(),
            mailer.clone(),
            config.service.operating_mode,
            send_timeout,
        ));

        Ok(Self {
            config,
            db,
            session_manager,
            account_manager,
            location_manager,
            button_manager,
            template_manager,
            notifier,
            mailer,
        })
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
