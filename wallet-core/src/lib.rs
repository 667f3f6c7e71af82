//! CouponWallet core
//!
//! Coupon lifecycle and trash engine: status derivation, the active and
//! trash partitions, and the projections a UI renders from them.

pub mod app;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod services;

pub use app::AppState;
pub use error::{AppError, Result};
