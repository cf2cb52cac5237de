use std::sync::Arc;

use color_eyre::eyre::{eyre, WrapErr as _};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{chat::ChatClient, config::AppConfig, cookies::CookieKey, storage::Storage};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cookie_key: CookieKey,
    pub config: Arc<AppConfig>,
    pub storage: Arc<Storage>,
    /// `None` when no chat API key is configured
    pub chat: Option<Arc<ChatClient>>,
}

impl AppState {
    pub async fn from_env() -> color_eyre::Result<Self> {
        let config = AppConfig::from_env()?;
        let pool = setup_db_pool(&config.database_url).await?;
        let cookie_key = CookieKey::from_env_or_generate()?;

        Self::new(config, pool, cookie_key)
    }

    pub fn new(config: AppConfig, db: PgPool, cookie_key: CookieKey) -> color_eyre::Result<Self> {
        let storage = Storage::from_config(&config.storage, config.signed_url_ttl)
            .wrap_err("Failed to set up storage")?;

        let chat = config
            .chat
            .clone()
            .map(|chat_config| ChatClient::new(chat_config, &config.site_owner))
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            db,
            cookie_key,
            config: Arc::new(config),
            storage: Arc::new(storage),
            chat,
        })
    }

    pub fn version(&self) -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }
}

#[tracing::instrument(skip_all, err)]
pub async fn setup_db_pool(database_url: &str) -> color_eyre::Result<PgPool> {
    const MIGRATION_LOCK_ID: i64 = 0xDB_DB_DB_DB_DB_DB_DB;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .wrap_err("Failed to connect to the database")?;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(&pool)
        .await?;

    sqlx::migrate!("../migrations").run(&pool).await?;

    let unlocked: Option<bool> = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_ID)
        .fetch_one(&pool)
        .await?;

    match unlocked {
        Some(true) => tracing::info!("Migration lock unlocked"),
        Some(false) => tracing::info!("Failed to unlock migration lock"),
        None => return Err(eyre!("Failed to unlock migration lock")),
    }

    Ok(pool)
}
