pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod notification;
pub mod phone;

use std::sync::Arc;
use std::time::Duration;
use actix_web::{web, HttpResponse};
use tracing::{info, warn};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, Claims, TokenPair};
pub use db::{DbOperations, MemoryStore, User};

use config::StorageBackend;
use db::{GuestStore, UserDirectory};
use events::TracingEventSink;
use notification::{LogNotifier, Notifier, SmsNotifier};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = state.db.as_ref().map(|db| db.get_pool_status());

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "database": database,
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
    pub db: Option<Arc<DbOperations>>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let directory: Arc<dyn UserDirectory>;
        let guests: Arc<dyn GuestStore>;
        let mut db = None;

        match config.database.backend {
            StorageBackend::Postgres => {
                let ops = DbOperations::new_with_options(
                    &config.database.url,
                    config.database.max_connections,
                    Duration::from_secs(config.database.acquire_timeout_secs),
                )
                .await?;
                ops.migrate().await?;
                let ops = Arc::new(ops);
                directory = ops.clone();
                guests = ops.clone();
                db = Some(ops);
            }
            StorageBackend::Memory => {
                warn!("Using in-memory user storage; data is lost on restart");
                let store = MemoryStore::new();
                directory = Arc::new(store.clone());
                guests = Arc::new(store);
            }
        }

        let notifier: Arc<dyn Notifier> = if config.notification.enabled {
            Arc::new(SmsNotifier::new(&config.notification)?)
        } else {
            info!("SMS delivery disabled, OTP codes go to the log");
            Arc::new(LogNotifier)
        };

        let auth_service = AuthService::from_settings(
            &config,
            directory,
            guests,
            notifier,
            Arc::new(TracingEventSink),
        );

        Ok(Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
            db,
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        if let Some(db) = &self.db {
            db.close().await;
        }
        Ok(())
    }
}
