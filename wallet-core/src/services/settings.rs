//! Settings service
//!
//! Persists view preferences as a JSON file in the app data directory.
//! Preferences are handed to projections as explicit [`ViewOptions`].

use crate::config::SETTINGS_FILE_NAME;
use crate::database::{HistoryFilter, StatusFilter};
use crate::error::{AppError, Result};
use crate::services::projection::{Shelf, ViewOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// How coupon lists are presented when a screen opens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Newest expiration first when true
    #[serde(default = "default_true")]
    pub sort_descending: bool,
    /// Sub-filter of the expired/used screen
    #[serde(default)]
    pub history_filter: HistoryFilter,
}

fn default_true() -> bool {
    true
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            sort_descending: true,
            history_filter: HistoryFilter::All,
        }
    }
}

impl ViewSettings {
    /// Options a shelf starts with
    pub fn options_for(&self, shelf: Shelf) -> ViewOptions {
        let filter = match shelf {
            Shelf::History => self.history_filter.into(),
            Shelf::Wallet | Shelf::Trash => StatusFilter::All,
        };

        ViewOptions {
            filter,
            sort_descending: self.sort_descending,
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub view: ViewSettings,
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join(SETTINGS_FILE_NAME),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Settings(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn get_view(&self) -> Result<ViewSettings> {
        let settings = self.load().await?;
        Ok(settings.view)
    }

    pub async fn update_view(&self, view: ViewSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.view = view;
        self.save(&settings).await?;
        Ok(())
    }
}
