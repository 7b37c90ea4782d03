use crate::{
    config::auth::{AuthConfig, PASSWORD_RESET_WINDOW_HOURS},
    error::{AppError, AppResult},
    models::{
        micropost,
        user::{self, normalize_email},
        Micropost, TokenKind, User, UserModel,
    },
    services::{email::Mailer, social_graph::SocialGraphService},
    utils::{digest, new_token, not_blank, valid_password, verify_digest, EMAIL_REGEX},
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, TransactionTrait,
};
use validator::Validate;

/// Registration form. Goes through full validation before anything is written.
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub name: String,
    #[validate(length(max = 255), regex(path = *EMAIL_REGEX, message = "is invalid"))]
    pub email: String,
    #[validate(custom(function = "valid_password"), length(min = 6))]
    pub password: String,
    pub password_confirmation: Option<String>,
}

/// Profile edit form. `password: None` (or empty) keeps the current hash.
#[derive(Debug, Clone, Validate)]
pub struct ProfileUpdate {
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub name: String,
    #[validate(length(max = 255), regex(path = *EMAIL_REGEX, message = "is invalid"))]
    pub email: String,
    #[validate(custom(function = "valid_password"), length(min = 6))]
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

#[derive(Debug, Validate)]
struct PasswordChange {
    #[validate(custom(function = "valid_password"), length(min = 6))]
    password: String,
}

/// Credential hashing, bearer-token lifecycle and account state.
///
/// Writes come in two kinds. Form-driven writes (`register`,
/// `update_profile`, `reset_password`) validate first and leave the row
/// untouched on failure. Token rotation and activation go through
/// [`IdentityService::trusted_update`], which skips field validation.
pub struct IdentityService {
    db: DatabaseConnection,
    config: AuthConfig,
}

impl IdentityService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, AuthConfig::from_env())
    }

    pub fn with_config(db: DatabaseConnection, config: AuthConfig) -> Self {
        Self { db, config }
    }

    /// Hash a secret at the configured cost.
    pub fn hash(&self, secret: &str) -> AppResult<String> {
        Ok(digest(secret, self.config.bcrypt_cost)?)
    }

    /// Register a new, unactivated user and mail the activation token.
    /// Returns (user_model, activation_token).
    pub async fn register(
        &self,
        new_user: NewUser,
        mailer: &dyn Mailer,
    ) -> AppResult<(UserModel, String)> {
        new_user.validate()?;
        check_confirmation(&new_user.password, new_user.password_confirmation.as_deref())?;

        if self.email_taken(&new_user.email, None).await? {
            return Err(AppError::Validation(
                "Email has already been taken".to_string(),
            ));
        }

        let password_hash = self.hash(&new_user.password)?;
        // The activation digest exists before the row is first written.
        let (activation_token, activation_hash) = self.mint()?;
        let now = chrono::Utc::now().naive_utc();

        let model = user::ActiveModel {
            name: Set(new_user.name),
            email: Set(new_user.email),
            password_hash: Set(password_hash),
            remember_hash: Set(None),
            activation_hash: Set(Some(activation_hash)),
            activated: Set(false),
            activated_at: Set(None),
            reset_hash: Set(None),
            reset_sent_at: Set(None),
            admin: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let user = model.insert(&self.db).await?;
        tracing::info!(user_id = user.id, "Registered user");

        if let Err(e) = mailer
            .send_activation_email(&user, &activation_token)
            .await
        {
            tracing::warn!("Failed to send activation email: {e}");
        }

        Ok((user, activation_token))
    }

    /// Password login. `None` covers both unknown email and wrong password.
    /// Activation is not checked here; the caller gates on `user.activated`.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<Option<UserModel>> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        if verify_digest(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Issue a fresh remember token, replacing any previous one.
    /// Returns (user_model, remember_token) for the session cookie.
    pub async fn remember(&self, user: UserModel) -> AppResult<(UserModel, String)> {
        let (token, hash) = self.mint()?;
        let mut active: user::ActiveModel = user.into();
        active.remember_hash = Set(Some(hash));
        let user = self.trusted_update(active).await?;
        Ok((user, token))
    }

    /// Invalidate the remember token.
    pub async fn forget(&self, user: UserModel) -> AppResult<UserModel> {
        let mut active: user::ActiveModel = user.into();
        active.remember_hash = Set(None);
        self.trusted_update(active).await
    }

    /// Resolve a persistent-session cookie pair to its user.
    pub async fn user_from_remember(
        &self,
        user_id: i32,
        token: &str,
    ) -> AppResult<Option<UserModel>> {
        let user = User::find_by_id(user_id).one(&self.db).await?;
        Ok(user.filter(|u| authenticated(u, TokenKind::Remember, token)))
    }

    /// Mark the user active. `activated_at` is only ever set once.
    pub async fn activate(&self, user: UserModel) -> AppResult<UserModel> {
        if user.activated {
            return Ok(user);
        }

        let user_id = user.id;
        let mut active: user::ActiveModel = user.into();
        active.activated = Set(true);
        active.activated_at = Set(Some(chrono::Utc::now().naive_utc()));
        let user = self.trusted_update(active).await?;
        tracing::info!(user_id, "Activated user");
        Ok(user)
    }

    /// Activate from an emailed link. `None` when the account is unknown,
    /// already active, or the token does not match.
    pub async fn confirm_activation(
        &self,
        email: &str,
        token: &str,
    ) -> AppResult<Option<UserModel>> {
        match self.find_by_email(email).await? {
            Some(user) if !user.activated && authenticated(&user, TokenKind::Activation, token) => {
                Ok(Some(self.activate(user).await?))
            }
            _ => {
                tracing::debug!("Activation link rejected");
                Ok(None)
            }
        }
    }

    /// Issue a reset token and stamp `reset_sent_at`.
    /// Returns (user_model, reset_token).
    pub async fn create_reset_digest(&self, user: UserModel) -> AppResult<(UserModel, String)> {
        let (token, hash) = self.mint()?;
        let mut active: user::ActiveModel = user.into();
        active.reset_hash = Set(Some(hash));
        active.reset_sent_at = Set(Some(chrono::Utc::now().naive_utc()));
        let user = self.trusted_update(active).await?;
        Ok((user, token))
    }

    /// Start a password reset for the account owning `email`.
    /// Returns whether such an account exists; the caller decides
    /// whether to disclose that.
    pub async fn request_password_reset(
        &self,
        email: &str,
        mailer: &dyn Mailer,
    ) -> AppResult<bool> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(false);
        };

        let (user, token) = self.create_reset_digest(user).await?;
        tracing::info!(user_id = user.id, "Password reset requested");

        if let Err(e) = mailer.send_password_reset_email(&user, &token).await {
            tracing::warn!("Failed to send password reset email: {e}");
        }

        Ok(true)
    }

    /// Set a new password using an emailed reset token.
    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        password: &str,
        password_confirmation: Option<&str>,
    ) -> AppResult<UserModel> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.activated || !authenticated(&user, TokenKind::Reset, token) {
            return Err(AppError::Unauthorized);
        }

        if password_reset_expired(&user) {
            return Err(AppError::Validation(
                "Password reset has expired".to_string(),
            ));
        }

        if password.is_empty() {
            return Err(AppError::Validation("Password can't be empty".to_string()));
        }
        PasswordChange {
            password: password.to_string(),
        }
        .validate()?;
        check_confirmation(password, password_confirmation)?;

        let password_hash = self.hash(password)?;
        let user_id = user.id;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.reset_hash = Set(None);
        active.reset_sent_at = Set(None);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let user = active.update(&self.db).await?;

        tracing::info!(user_id, "Password reset completed");
        Ok(user)
    }

    /// Validated edit of name, email and optionally password.
    pub async fn update_profile(
        &self,
        user_id: i32,
        mut changes: ProfileUpdate,
    ) -> AppResult<UserModel> {
        changes.password = changes.password.filter(|p| !p.is_empty());
        changes.validate()?;
        if let Some(password) = &changes.password {
            check_confirmation(password, changes.password_confirmation.as_deref())?;
        }

        let existing = self.get_user_by_id(user_id).await?;

        if self.email_taken(&changes.email, Some(user_id)).await? {
            return Err(AppError::Validation(
                "Email has already been taken".to_string(),
            ));
        }

        let password_hash = match &changes.password {
            Some(password) => Some(self.hash(password)?),
            None => None,
        };

        let mut active: user::ActiveModel = existing.into();
        active.name = Set(changes.name);
        active.email = Set(changes.email);
        if let Some(hash) = password_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Remove a user together with their microposts and every follow
    /// edge that touches them, in one transaction.
    pub async fn destroy(&self, user_id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;

        User::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let edges = SocialGraphService::sever_all(&txn, user_id).await?;
        Micropost::delete_many()
            .filter(micropost::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        User::delete_by_id(user_id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(user_id, edges, "Destroyed user");
        Ok(())
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Case-insensitive email lookup.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        let user = User::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await?;
        Ok(user)
    }

    async fn email_taken(&self, email: &str, except: Option<i32>) -> AppResult<bool> {
        let mut query = User::find().filter(user::Column::Email.eq(normalize_email(email)));
        if let Some(id) = except {
            query = query.filter(user::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    /// Fresh token and its digest.
    fn mint(&self) -> AppResult<(String, String)> {
        let token = new_token()?;
        let hash = self.hash(&token)?;
        Ok((token, hash))
    }

    /// Persist a system-driven change (digest rotation, activation)
    /// without running field validation. Form input never reaches here.
    async fn trusted_update(&self, mut active: user::ActiveModel) -> AppResult<UserModel> {
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }
}

/// Check a presented bearer token against the stored digest of `kind`.
///
/// Absent or unreadable digests yield `false`. The comparison itself is
/// bcrypt's, which does not short-circuit on content.
pub fn authenticated(user: &UserModel, kind: TokenKind, token: &str) -> bool {
    let Some(stored) = user.digest_for(kind) else {
        return false;
    };

    match verify_digest(token, stored) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::debug!(user_id = user.id, ?kind, "Unreadable digest: {e}");
            false
        }
    }
}

/// True when the reset token was issued more than two hours ago.
pub fn password_reset_expired(user: &UserModel) -> bool {
    password_reset_expired_at(user, chrono::Utc::now().naive_utc())
}

/// [`password_reset_expired`] against an explicit clock.
/// A user with no reset issued counts as expired.
pub fn password_reset_expired_at(user: &UserModel, now: NaiveDateTime) -> bool {
    match user.reset_sent_at {
        Some(sent_at) => sent_at < now - chrono::Duration::hours(PASSWORD_RESET_WINDOW_HOURS),
        None => true,
    }
}

fn check_confirmation(password: &str, confirmation: Option<&str>) -> AppResult<()> {
    match confirmation {
        Some(confirmation) if confirmation != password => Err(AppError::Validation(
            "Password confirmation doesn't match Password".to_string(),
        )),
        _ => Ok(()),
    }
}
