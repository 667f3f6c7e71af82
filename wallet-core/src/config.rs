//! Application configuration constants
//!
//! Central location for file names and validation boundaries used
//! throughout the wallet.

// ===== Storage =====

/// SQLite database file created inside the app data directory
pub const DATABASE_FILE_NAME: &str = "coupons.db";

/// JSON settings file created inside the app data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Seconds a connection waits on a locked database before failing
pub const DATABASE_BUSY_TIMEOUT_SECS: u64 = 5;

/// Connections held by the application pool
pub const DATABASE_MAX_CONNECTIONS: u32 = 5;

// ===== Coupon Field Limits =====

/// Maximum length for a brand name, in characters
pub const MAX_BRAND_LENGTH: usize = 100;

/// Maximum length for a product name, in characters
pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;

/// Maximum length for a stored image path or URL
pub const MAX_IMAGE_PATH_LENGTH: usize = 2048;

// ===== Logging =====

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "couponwallet=debug,info";
