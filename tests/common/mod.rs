#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, EntityTrait};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{DatabaseConnection, Set};
use storefront_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    entity::{
        addresses::{ActiveModel as AddressActive, Model as AddressModel},
        products::{ActiveModel as ProductActive, Model as ProductModel},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    middleware::auth::AuthUser,
    notify::{LogNotifier, Notification, Notifier, NotifyError},
    state::AppState,
};
use uuid::Uuid;

/// Captures every notification instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn last_to(&self, to: &str) -> Option<Notification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|n| n.to == to)
            .cloned()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Rejects everything, like an unreachable mail server.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected("mail server unavailable".into()))
    }
}

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            None
        }
    }
}

pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    setup_state_with(Arc::new(LogNotifier)).await
}

/// `None` when no database is configured; callers return early.
pub async fn setup_state_with(notifier: Arc<dyn Notifier>) -> anyhow::Result<Option<AppState>> {
    let Some(database_url) = database_url() else {
        return Ok(None);
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    Ok(Some(AppState::new(
        orm_from_pool(pool),
        test_config(database_url),
        notifier,
    )))
}

pub fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        mail_from: "test@storefront.local".into(),
        smtp: None,
    }
}

/// State without a database, for requests rejected before any query runs.
pub fn offline_state() -> AppState {
    AppState::new(
        DatabaseConnection::Disconnected,
        test_config(String::new()),
        Arc::new(LogNotifier),
    )
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub async fn create_user(state: &AppState) -> anyhow::Result<AuthUser> {
    let username = unique("user");
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{username}@example.com")),
        username: Set(username),
        phone: Set(None),
        password_hash: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser { user_id: user.id })
}

pub async fn create_product(
    state: &AppState,
    price: i64,
    discounted_price: Option<i64>,
) -> anyhow::Result<ProductModel> {
    Ok(ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(unique("Test Flavour")),
        price: Set(price),
        discounted_price: Set(discounted_price),
        category: Set("tubs".into()),
        image_url: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}

pub async fn create_address(state: &AppState, user: &AuthUser) -> anyhow::Result<AddressModel> {
    Ok(AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        name: Set("Test Person".into()),
        phone: Set("5550100".into()),
        pin_code: Set("560001".into()),
        state: Set("Karnataka".into()),
        district: Set("Bengaluru".into()),
        address: Set("12 Test Street".into()),
        is_default: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}

/// Remove the account behind `user` while its token stays valid.
pub async fn delete_user(state: &AppState, user: &AuthUser) -> anyhow::Result<()> {
    Users::delete_by_id(user.user_id).exec(&state.orm).await?;
    Ok(())
}
