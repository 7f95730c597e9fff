// Library exports for binary tools and tests
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use config::Config;
use services::cache::CacheStore;
use services::meals::MealsStore;
use services::menu::MenuStore;
use services::notifications::NotificationService;
use services::preferences::PreferencesStore;
use services::reminders::ReminderScheduler;
use services::storage::Storage;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub meals: Arc<MealsStore>,
    pub menus: Arc<MenuStore>,
    pub preferences: Arc<PreferencesStore>,
    pub notifications: Arc<NotificationService>,
    pub reminders: Arc<ReminderScheduler>,
}

impl AppState {
    /// Wires every store onto the same data directory. The stores reload
    /// their persisted state; the reminder pass and the background meal
    /// refresh are left to the caller.
    pub fn build(db: PgPool, config: Arc<Config>) -> error::Result<Self> {
        let storage = Storage::new(&config.data_dir)?;
        let cache = CacheStore::new(storage.clone());

        let meals = Arc::new(MealsStore::new(cache));
        meals.initialize();

        let notifications = Arc::new(NotificationService::new(config.notify_webhook_url.clone()));

        Ok(Self {
            db,
            meals,
            menus: Arc::new(MenuStore::new(storage.clone())),
            preferences: Arc::new(PreferencesStore::new(storage.clone())),
            reminders: Arc::new(ReminderScheduler::new(storage, Arc::clone(&notifications))),
            notifications,
            config,
        })
    }
}
