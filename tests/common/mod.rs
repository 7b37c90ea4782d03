#![allow(dead_code)]

use anyhow::anyhow;
use microblog::config::auth::AuthConfig;
use microblog::migration::Migrator;
use microblog::models::{micropost, MicropostModel, UserModel};
use microblog::services::{IdentityService, Mailer, MicropostService, NewUser, SocialGraphService};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailKind {
    Activation,
    PasswordReset,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub kind: MailKind,
    pub to: String,
    pub token: String,
}

/// Keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<SentMail> {
        self.sent.lock().unwrap().last().cloned()
    }

    fn record(&self, kind: MailKind, user: &UserModel, token: &str) {
        self.sent.lock().unwrap().push(SentMail {
            kind,
            to: user.email.clone(),
            token: token.to_string(),
        });
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send_activation_email(&self, user: &UserModel, token: &str) -> anyhow::Result<()> {
        self.record(MailKind::Activation, user, token);
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        user: &UserModel,
        token: &str,
    ) -> anyhow::Result<()> {
        self.record(MailKind::PasswordReset, user, token);
        Ok(())
    }
}

/// Every delivery fails.
pub struct FailingMailer;

#[async_trait::async_trait]
impl Mailer for FailingMailer {
    async fn send_activation_email(&self, _user: &UserModel, _token: &str) -> anyhow::Result<()> {
        Err(anyhow!("smtp unavailable"))
    }

    async fn send_password_reset_email(
        &self,
        _user: &UserModel,
        _token: &str,
    ) -> anyhow::Result<()> {
        Err(anyhow!("smtp unavailable"))
    }
}

pub struct TestApp {
    pub db: DatabaseConnection,
    pub identity: IdentityService,
    pub graph: SocialGraphService,
    pub posts: MicropostService,
    pub mailer: RecordingMailer,
}

/// Fresh in-memory database per test, fully migrated.
pub async fn spawn_app() -> TestApp {
    // One connection: every pooled connection would otherwise get its own
    // private in-memory database.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("Failed to open in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    TestApp {
        identity: IdentityService::with_config(db.clone(), AuthConfig::minimal()),
        graph: SocialGraphService::new(db.clone()),
        posts: MicropostService::new(db.clone()),
        mailer: RecordingMailer::default(),
        db,
    }
}

pub fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: "password".to_string(),
        password_confirmation: Some("password".to_string()),
    }
}

/// Register and activate a user. Password is "password".
pub async fn create_test_user(app: &TestApp, name: &str) -> UserModel {
    let email = format!("{}@example.com", name.to_lowercase());
    let (user, _token) = app
        .identity
        .register(new_user(name, &email), &app.mailer)
        .await
        .expect("Failed to register user");
    app.identity
        .activate(user)
        .await
        .expect("Failed to activate user")
}

/// Insert a post with a creation time `minutes_ago` in the past.
pub async fn create_post_at(
    db: &DatabaseConnection,
    user_id: i32,
    content: &str,
    minutes_ago: i64,
) -> MicropostModel {
    let at = chrono::Utc::now().naive_utc() - chrono::Duration::minutes(minutes_ago);
    micropost::ActiveModel {
        user_id: Set(user_id),
        content: Set(content.to_string()),
        created_at: Set(at),
        updated_at: Set(at),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert post")
}
