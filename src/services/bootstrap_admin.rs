use crate::config::auth::AuthConfig;
use crate::error::AppResult;
use crate::models::{user, User};
use crate::services::identity::NewUser;
use crate::utils::digest;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use std::env;
use validator::Validate;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        let enabled = env::var("BOOTSTRAP_ADMIN_ENABLED")
            .ok()
            .map(|v| v.trim().to_ascii_lowercase())
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "y" | "on"))
            .unwrap_or(false);

        if !enabled {
            return None;
        }

        Some(Self {
            name: env::var("BOOTSTRAP_ADMIN_NAME").ok()?,
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?,
            password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?,
        })
    }
}

/// Make sure an administrator exists:
/// - if any admin exists, do nothing
/// - else if the configured email exists, promote that user
/// - else create an activated admin
pub async fn ensure_bootstrap_admin(
    db: &DatabaseConnection,
    cfg: BootstrapAdminConfig,
    auth: AuthConfig,
) -> AppResult<()> {
    let admin_exists = User::find()
        .filter(user::Column::Admin.eq(true))
        .one(db)
        .await?
        .is_some();
    if admin_exists {
        return Ok(());
    }

    let existing = User::find()
        .filter(user::Column::Email.eq(user::normalize_email(&cfg.email)))
        .one(db)
        .await?;

    let now = chrono::Utc::now().naive_utc();

    if let Some(existing) = existing {
        let user_id = existing.id;
        let mut active: user::ActiveModel = existing.into();
        active.admin = Set(true);
        active.updated_at = Set(now);
        active.update(db).await?;
        tracing::info!(user_id, "Promoted existing user to admin");
        return Ok(());
    }

    // Same rules as registration
    let form = NewUser {
        name: cfg.name,
        email: cfg.email,
        password: cfg.password,
        password_confirmation: None,
    };
    form.validate()?;

    let new_user = user::ActiveModel {
        name: Set(form.name),
        email: Set(form.email),
        password_hash: Set(digest(&form.password, auth.bcrypt_cost)?),
        remember_hash: Set(None),
        activation_hash: Set(None),
        activated: Set(true),
        activated_at: Set(Some(now)),
        reset_hash: Set(None),
        reset_sent_at: Set(None),
        admin: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = new_user.insert(db).await?;
    tracing::info!(user_id = created.id, "Created bootstrap admin");
    Ok(())
}
