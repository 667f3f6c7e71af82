//! Application state and initialization
//!
//! Opens the database and settings under one data directory and hands the
//! presentation layer everything it calls into.

use crate::clock::{Clock, SystemClock};
use crate::config::DATABASE_FILE_NAME;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::projection::{self, ProjectedCoupon, Shelf};
use crate::services::{CouponStore, SettingsService};
use std::path::PathBuf;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub store: CouponStore,
    pub settings: SettingsService,
}

impl AppState {
    /// Open (or create) the wallet stored in `app_data_dir`
    pub async fn open(app_data_dir: PathBuf) -> Result<Self> {
        Self::open_with_clock(app_data_dir, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(app_data_dir: PathBuf, clock: Arc<dyn Clock>) -> Result<Self> {
        tracing::info!("Initializing wallet in {:?}", app_data_dir);

        std::fs::create_dir_all(&app_data_dir)?;

        let pool = create_pool(&app_data_dir.join(DATABASE_FILE_NAME)).await?;
        let store = CouponStore::new(Repository::new(pool), clock);
        let settings = SettingsService::new(app_data_dir.clone());

        // Write defaults on first run and surface a corrupt file early.
        settings.load().await?;

        tracing::info!("Wallet initialized successfully");

        Ok(Self {
            app_data_dir,
            store,
            settings,
        })
    }

    /// Project a shelf using the persisted view preferences
    pub async fn shelf(&self, shelf: Shelf) -> Result<Vec<ProjectedCoupon>> {
        let view = self.settings.get_view().await?;
        projection::load_shelf(&self.store, shelf, view.options_for(shelf)).await
    }
}
