use std::sync::Arc;

use crate::{config::AppConfig, db::OrmConn, notify::Notifier, otp::OtpStore};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn Notifier>,
    pub otp: OtpStore,
}

impl AppState {
    pub fn new(orm: OrmConn, config: AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            orm,
            config: Arc::new(config),
            notifier,
            otp: OtpStore::default(),
        }
    }
}
