//! Database models
//!
//! Rust structs representing stored coupons and the requests that create
//! or change them. Status is never stored; see [`CouponStatus::derive`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A redeemable voucher ("gifticon")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Coupon {
    pub id: String,
    pub brand: String,
    pub product_name: String,
    pub expiration_date: NaiveDate,
    pub is_used: bool,
    /// Empty when the coupon has no image
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    pub fn status(&self, today: NaiveDate) -> CouponStatus {
        CouponStatus::derive(self.is_used, self.expiration_date, today)
    }
}

/// Display status, computed on every read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    Available,
    Expired,
    Used,
}

impl CouponStatus {
    /// Usage wins over expiry. A coupon expires on its expiration date.
    pub fn derive(is_used: bool, expiration_date: NaiveDate, today: NaiveDate) -> Self {
        if is_used {
            CouponStatus::Used
        } else if expiration_date <= today {
            CouponStatus::Expired
        } else {
            CouponStatus::Available
        }
    }
}

/// Status filter accepted by listings and projections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Available,
    Expired,
    Used,
}

impl StatusFilter {
    pub fn matches(self, status: CouponStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Available => status == CouponStatus::Available,
            StatusFilter::Expired => status == CouponStatus::Expired,
            StatusFilter::Used => status == CouponStatus::Used,
        }
    }
}

/// Sub-filter of the expired/used screen; `All` means expired or used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFilter {
    #[default]
    All,
    Expired,
    Used,
}

impl From<HistoryFilter> for StatusFilter {
    fn from(filter: HistoryFilter) -> Self {
        match filter {
            HistoryFilter::All => StatusFilter::All,
            HistoryFilter::Expired => StatusFilter::Expired,
            HistoryFilter::Used => StatusFilter::Used,
        }
    }
}

/// Create coupon request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCouponRequest {
    pub brand: String,
    pub product_name: String,
    pub expiration_date: NaiveDate,
    #[serde(default)]
    pub image_path: String,
}

/// Partial edit of an active coupon; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponPatch {
    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub expiration_date: Option<NaiveDate>,
}

impl CouponPatch {
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none() && self.brand.is_none() && self.expiration_date.is_none()
    }
}

/// Which partition currently holds an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Active,
    Trashed,
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_used_takes_precedence_over_expiry() {
        let today = date(2025, 3, 10);

        assert_eq!(CouponStatus::derive(true, date(2025, 1, 1), today), CouponStatus::Used);
        assert_eq!(CouponStatus::derive(true, date(2026, 1, 1), today), CouponStatus::Used);
        assert_eq!(CouponStatus::derive(true, today, today), CouponStatus::Used);
    }

    #[test]
    fn test_single_expiry_threshold() {
        let expiry = date(2025, 3, 10);

        assert_eq!(
            CouponStatus::derive(false, expiry, date(2025, 3, 9)),
            CouponStatus::Available
        );
        assert_eq!(CouponStatus::derive(false, expiry, expiry), CouponStatus::Expired);
        assert_eq!(
            CouponStatus::derive(false, expiry, date(2025, 3, 11)),
            CouponStatus::Expired
        );
        assert_eq!(
            CouponStatus::derive(false, expiry, date(2024, 12, 31)),
            CouponStatus::Available
        );
    }

    #[test]
    fn test_status_filter_matches() {
        assert!(StatusFilter::All.matches(CouponStatus::Used));
        assert!(StatusFilter::Expired.matches(CouponStatus::Expired));
        assert!(!StatusFilter::Expired.matches(CouponStatus::Used));
        assert!(!StatusFilter::Available.matches(CouponStatus::Expired));
    }

    #[test]
    fn test_status_filter_serde_names() {
        let filter: StatusFilter = serde_json::from_str("\"expired\"").unwrap();
        assert_eq!(filter, StatusFilter::Expired);
        assert_eq!(serde_json::to_string(&CouponStatus::Available).unwrap(), "\"available\"");
    }
}
