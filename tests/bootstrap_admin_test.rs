mod common;

use microblog::config::auth::AuthConfig;
use microblog::models::{user, User};
use microblog::services::bootstrap_admin::{ensure_bootstrap_admin, BootstrapAdminConfig};
use microblog::AppError;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

fn config(email: &str) -> BootstrapAdminConfig {
    BootstrapAdminConfig {
        name: "Admin".to_string(),
        email: email.to_string(),
        password: "admin-password".to_string(),
    }
}

#[tokio::test]
async fn creates_admin_when_none_exists() {
    let app = common::spawn_app().await;

    ensure_bootstrap_admin(&app.db, config("Root@Example.com"), AuthConfig::minimal())
        .await
        .unwrap();

    let admin = User::find()
        .filter(user::Column::Admin.eq(true))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.email, "root@example.com");
    assert!(admin.activated);
    assert!(app
        .identity
        .authenticate("root@example.com", "admin-password")
        .await
        .unwrap()
        .is_some());

    // Second run is a no-op
    ensure_bootstrap_admin(&app.db, config("other@example.com"), AuthConfig::minimal())
        .await
        .unwrap();
    assert_eq!(User::find().count(&app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn promotes_existing_user() {
    let app = common::spawn_app().await;
    let existing = common::create_test_user(&app, "boss").await;
    assert!(!existing.admin);

    ensure_bootstrap_admin(&app.db, config("BOSS@example.com"), AuthConfig::minimal())
        .await
        .unwrap();

    let promoted = app.identity.get_user_by_id(existing.id).await.unwrap();
    assert!(promoted.admin);
    assert_eq!(User::find().count(&app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn invalid_admin_config_creates_nothing() {
    let app = common::spawn_app().await;

    let mut blank_name = config("root@example.com");
    blank_name.name = "   ".to_string();
    let mut long_name = config("root@example.com");
    long_name.name = "a".repeat(51);
    let mut short_password = config("root@example.com");
    short_password.password = "12345".to_string();
    let mut long_password = config("root@example.com");
    long_password.password = "a".repeat(73);

    for cfg in [
        config("root@example,com"),
        blank_name,
        long_name,
        short_password,
        long_password,
    ] {
        let err = ensure_bootstrap_admin(&app.db, cfg, AuthConfig::minimal())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    assert_eq!(User::find().count(&app.db).await.unwrap(), 0);
}
