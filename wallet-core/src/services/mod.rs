//! Services module
//!
//! Business logic that sits between the presentation layer and the repository.

pub mod coupons;
pub mod projection;
pub mod settings;

pub use coupons::CouponStore;
pub use projection::{ProjectedCoupon, Shelf, ViewOptions};
pub use settings::SettingsService;
