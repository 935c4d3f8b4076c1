#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, time::Duration};

use maniocagri_api::{
    ai::AiGateway,
    config::{AiConfig, AppConfig, MailConfig},
    entity::users::Role,
    middleware::auth::AuthUser,
    migration::Migrator,
    notify::Notifier,
    services::auth_service::{NewAccount, insert_account},
    state::AppState,
    storage::ImageStore,
};
use sea_orm::{ConnectOptions, ConnectionTrait, Database};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;

pub struct TestEnv {
    pub state: AppState,
    // Held so the static directory outlives the test.
    pub static_dir: TempDir,
}

pub async fn setup() -> TestEnv {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(3600))
        .sqlx_logging(false);
    let orm = Database::connect(options).await.unwrap();
    orm.execute_unprepared("PRAGMA foreign_keys = ON").await.unwrap();
    Migrator::up(&orm, None).await.unwrap();

    let static_dir = TempDir::new().unwrap();
    let config = AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        token_ttl_minutes: 60,
        static_dir: PathBuf::from(static_dir.path()),
        ai: AiConfig::default(),
        mail: MailConfig::default(),
    };

    let state = AppState {
        orm,
        config: Arc::new(config),
        ai: Arc::new(AiGateway::offline()),
        notifier: Notifier::disabled(),
        images: ImageStore::new(static_dir.path()),
    };

    TestEnv { state, static_dir }
}

/// Inserts an active account and returns it as an authenticated caller.
pub async fn user_with(state: &AppState, username: &str, role: Role, approved: bool) -> AuthUser {
    let user = insert_account(
        state,
        NewAccount {
            username: username.into(),
            email: format!("{username}@maniocagri.test"),
            password: "pass".into(),
            role,
            is_active: true,
            is_approved: approved,
            first_name: None,
            last_name: None,
            phone: None,
        },
    )
    .await
    .unwrap();

    AuthUser {
        user_id: user.id,
        role: user.role,
    }
}

pub async fn user(state: &AppState, username: &str, role: Role) -> AuthUser {
    user_with(state, username, role, true).await
}
