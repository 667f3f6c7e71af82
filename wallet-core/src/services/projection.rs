//! View projection
//!
//! Stateless transforms from a snapshot of coupons to the ordered list a
//! screen renders. Nothing here is cached; call it after every mutation.

use crate::database::{Coupon, CouponStatus, StatusFilter};
use crate::error::Result;
use crate::services::CouponStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A coupon paired with the status it had when projected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedCoupon {
    #[serde(flatten)]
    pub coupon: Coupon,
    pub status: CouponStatus,
}

/// Filter and sort direction chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewOptions {
    pub filter: StatusFilter,
    pub sort_descending: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            filter: StatusFilter::All,
            sort_descending: true,
        }
    }
}

/// The screens that list coupons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shelf {
    /// Active coupons that can still be redeemed
    Wallet,
    /// Active coupons that are expired or used
    History,
    Trash,
}

impl Shelf {
    pub fn admits(self, status: CouponStatus) -> bool {
        match self {
            Shelf::Wallet => status == CouponStatus::Available,
            Shelf::History => matches!(status, CouponStatus::Expired | CouponStatus::Used),
            Shelf::Trash => true,
        }
    }
}

/// Filter by status, then order by expiration date.
///
/// Equal expiration dates keep their input order in both directions.
pub fn project<I>(records: I, options: ViewOptions, today: NaiveDate) -> Vec<ProjectedCoupon>
where
    I: IntoIterator<Item = Coupon>,
{
    project_where(records, options, today, |_| true)
}

/// Same as [`project`], restricted to the statuses a shelf shows
pub fn project_shelf<I>(
    records: I,
    shelf: Shelf,
    options: ViewOptions,
    today: NaiveDate,
) -> Vec<ProjectedCoupon>
where
    I: IntoIterator<Item = Coupon>,
{
    project_where(records, options, today, |status| shelf.admits(status))
}

fn project_where<I, F>(
    records: I,
    options: ViewOptions,
    today: NaiveDate,
    admit: F,
) -> Vec<ProjectedCoupon>
where
    I: IntoIterator<Item = Coupon>,
    F: Fn(CouponStatus) -> bool,
{
    let mut projected: Vec<ProjectedCoupon> = records
        .into_iter()
        .map(|coupon| {
            let status = coupon.status(today);
            ProjectedCoupon { coupon, status }
        })
        .filter(|p| admit(p.status) && options.filter.matches(p.status))
        .collect();

    // sort_by is stable
    if options.sort_descending {
        projected.sort_by(|a, b| b.coupon.expiration_date.cmp(&a.coupon.expiration_date));
    } else {
        projected.sort_by(|a, b| a.coupon.expiration_date.cmp(&b.coupon.expiration_date));
    }

    projected
}

/// Pull the partition behind `shelf` from the store and project it
pub async fn load_shelf(
    store: &CouponStore,
    shelf: Shelf,
    options: ViewOptions,
) -> Result<Vec<ProjectedCoupon>> {
    let records = match shelf {
        Shelf::Wallet | Shelf::History => store.list_active(StatusFilter::All).await?,
        Shelf::Trash => store.list_trash().await?,
    };

    Ok(project_shelf(records, shelf, options, store.today()))
}
