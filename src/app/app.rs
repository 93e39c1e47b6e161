use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::domain_service::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;

/// Wires the registration workflow to the configured storage backend.
pub struct App {
    pub registration_service: Arc<dyn RegistrationService>,
    pool: Option<MySqlPool>,
}

impl App {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let storage = &settings.storage;

        let (user_repo, tx_manager, pool): (Arc<dyn UserRepo>, Arc<dyn TxManager>, Option<MySqlPool>) =
            match storage.backend.as_str() {
                "memory" => {
                    let db = MemoryDb::with_constraints(&storage.unique_keys);
                    (
                        Arc::new(MemoryUserRepo::new(db.clone())),
                        Arc::new(MemoryTxManager::new(db)),
                        None,
                    )
                }
                "mysql" => {
                    let dsn = storage
                        .dsn
                        .as_deref()
                        .ok_or_else(|| anyhow!("storage.dsn is required for the mysql backend"))?;
                    let pool = MySqlPoolOptions::new()
                        .max_connections(storage.max_connections)
                        .connect(dsn)
                        .await?;
                    (
                        Arc::new(MySqlUserRepo::new(pool.clone())),
                        Arc::new(MySqlTxManager::new(pool.clone())),
                        Some(pool),
                    )
                }
                other => return Err(anyhow!("Unknown storage backend: {}", other)),
            };

        let user_factory: Arc<dyn UserFactory> = Arc::new(UuidUserFactory);
        let mut service = RealRegistrationService::new(user_factory, user_repo.clone(), tx_manager);
        if settings.registration.duplicate_check {
            let check_key = settings.registration.check_key;
            debug!(%check_key, "advisory duplicate check enabled");
            service =
                service.with_duplicate_checker(Arc::new(RepoDuplicateChecker::new(user_repo, check_key)));
        }

        info!(backend = %storage.backend, "app started");

        Ok(Self {
            registration_service: Arc::new(service),
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("app shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
