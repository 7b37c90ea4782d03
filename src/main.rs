use microblog::config::{self, auth::AuthConfig};
use microblog::migration::Migrator;
use microblog::services::{bootstrap_admin, EmailService};
use microblog::AppError;
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "microblog=debug,sea_orm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting microblog v{}...", env!("CARGO_PKG_VERSION"));

    let auth_config = AuthConfig::from_env();
    tracing::info!(bcrypt_cost = auth_config.bcrypt_cost, "Auth configured");

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    if let Some(cfg) = bootstrap_admin::BootstrapAdminConfig::from_env() {
        bootstrap_admin::ensure_bootstrap_admin(&db, cfg, auth_config)
            .await
            .map_err(AppError::logged)?;
    }

    let email_service = EmailService::from_env();
    if email_service.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, emails will be skipped");
    }

    db.close().await?;
    tracing::info!("Setup complete");
    Ok(())
}
