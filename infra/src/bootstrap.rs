//! Configuration loading and credential service wiring

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use st_core::services::{Clock, CredentialService, SystemClock, TokenServiceConfig};
use st_shared::config::{AppConfig, AuthConfig, Environment};

use crate::database::{DatabasePool, MySqlRefreshTokenStore, MySqlUserDirectory};
use crate::logging::init_tracing;
use crate::InfrastructureError;

/// Credential service backed by MySQL
pub type MySqlCredentialService = CredentialService<MySqlRefreshTokenStore, MySqlUserDirectory>;

/// Everything a host process needs to serve credentials
pub struct CredentialStack {
    pub config: AppConfig,
    pub pool: DatabasePool,
    pub credentials: Arc<MySqlCredentialService>,
}

/// Load and validate the application configuration
///
/// Sources, lowest precedence first:
/// 1. `.env` and the environment's `.env.<name>` file, then plain variables
///    such as `JWT_SECRET` and `DATABASE_URL`
/// 2. `config.<environment>.toml` in the working directory, if present
/// 3. `APP__SECTION__KEY` variables, e.g. `APP__AUTH__JWT__ISSUER`
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok();
    let environment = Environment::from_env();
    dotenvy::from_filename(environment.env_file()).ok();

    let defaults = AppConfig::from_env();
    let settings = config::Config::builder()
        .add_source(config::Config::try_from(&defaults)?)
        .add_source(config::File::with_name(environment.config_file()).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let app: AppConfig = settings.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Build the credential service over an existing pool
pub fn build_credential_service(
    auth: &AuthConfig,
    pool: &DatabasePool,
    clock: Arc<dyn Clock>,
) -> Result<MySqlCredentialService, InfrastructureError> {
    let token_config = TokenServiceConfig::try_from(auth)?;
    let store = Arc::new(MySqlRefreshTokenStore::new(pool.get_pool().clone()));
    let users = Arc::new(MySqlUserDirectory::new(pool.get_pool().clone()));

    Ok(CredentialService::new(store, users, clock, &token_config)?)
}

/// Load configuration, install logging, connect, migrate and wire the services
pub async fn initialize() -> anyhow::Result<CredentialStack> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(&config.logging);

    info!(environment = %config.environment, "Initializing credential services");

    let pool = DatabasePool::new(config.database.clone())
        .await
        .context("failed to connect to the database")?;
    pool.run_migrations()
        .await
        .context("failed to run database migrations")?;

    let credentials = build_credential_service(&config.auth, &pool, Arc::new(SystemClock))
        .context("failed to build credential service")?;

    info!(stats = %pool.get_statistics(), "Credential services initialized");

    Ok(CredentialStack {
        config,
        pool,
        credentials: Arc::new(credentials),
    })
}
