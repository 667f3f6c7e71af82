//! Coupon store
//!
//! Single source of truth for the active collection and the trash.
//! Validates input, derives status against the injected clock and logs
//! every mutation; persistence and atomicity live in the repository.

use crate::clock::{Clock, SystemClock};
use crate::config::{MAX_BRAND_LENGTH, MAX_IMAGE_PATH_LENGTH, MAX_PRODUCT_NAME_LENGTH};
use crate::database::{
    Coupon, CouponPatch, CouponStatus, CreateCouponRequest, Location, Repository, StatusFilter,
};
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Service owning both coupon partitions
#[derive(Clone)]
pub struct CouponStore {
    repo: Repository,
    clock: Arc<dyn Clock>,
}

impl CouponStore {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub fn with_system_clock(repo: Repository) -> Self {
        Self::new(repo, Arc::new(SystemClock))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Pure status derivation against an explicit date
    pub fn derive_status(coupon: &Coupon, today: NaiveDate) -> CouponStatus {
        coupon.status(today)
    }

    /// Status of a coupon as of the store's clock
    pub fn status_of(&self, coupon: &Coupon) -> CouponStatus {
        Self::derive_status(coupon, self.today())
    }

    /// Add a new, unused coupon to the active collection
    pub async fn create(&self, mut req: CreateCouponRequest) -> Result<Coupon> {
        req.brand = validate_text("brand", req.brand, MAX_BRAND_LENGTH)?;
        req.product_name = validate_text("product name", req.product_name, MAX_PRODUCT_NAME_LENGTH)?;
        if req.image_path.chars().count() > MAX_IMAGE_PATH_LENGTH {
            return Err(AppError::Validation(format!(
                "image path exceeds {} characters",
                MAX_IMAGE_PATH_LENGTH
            )));
        }

        tracing::info!("Creating coupon: {} / {}", req.brand, req.product_name);

        let coupon = self.repo.create_coupon(req).await?;

        tracing::info!("Coupon created successfully: {}", coupon.id);

        Ok(coupon)
    }

    /// Get an active coupon by ID
    pub async fn get(&self, id: &str) -> Result<Coupon> {
        match self.repo.locate(id).await? {
            Location::Active => self
                .repo
                .get_active(id)
                .await?
                .ok_or_else(|| AppError::NotFound(id.to_string())),
            Location::Trashed => Err(AppError::InvalidState(format!(
                "coupon {} is in trash",
                id
            ))),
            Location::Missing => Err(AppError::NotFound(id.to_string())),
        }
    }

    /// Active coupons whose current status matches `filter`, unsorted
    pub async fn list_active(&self, filter: StatusFilter) -> Result<Vec<Coupon>> {
        let today = self.today();
        let coupons = self.repo.list_active().await?;

        Ok(coupons
            .into_iter()
            .filter(|coupon| filter.matches(coupon.status(today)))
            .collect())
    }

    /// Every coupon currently in trash
    pub async fn list_trash(&self) -> Result<Vec<Coupon>> {
        self.repo.list_trashed().await
    }

    pub async fn count_trash(&self) -> Result<i64> {
        self.repo.count_trashed().await
    }

    /// Edit brand, product name or expiration date of an active coupon
    pub async fn edit(&self, id: &str, mut patch: CouponPatch) -> Result<Coupon> {
        if let Some(brand) = patch.brand.take() {
            patch.brand = Some(validate_text("brand", brand, MAX_BRAND_LENGTH)?);
        }
        if let Some(product_name) = patch.product_name.take() {
            patch.product_name = Some(validate_text(
                "product name",
                product_name,
                MAX_PRODUCT_NAME_LENGTH,
            )?);
        }

        tracing::debug!("Editing coupon: {}", id);

        let coupon = self.repo.update_coupon(id, &patch).await.map_err(|e| {
            if e.is_user_facing() {
                tracing::warn!("Rejected edit of coupon {}: {}", id, e);
            }
            e
        })?;

        tracing::debug!("Coupon edited successfully: {}", coupon.id);

        Ok(coupon)
    }

    /// Mark an active coupon as used. Calling it twice is a no-op.
    pub async fn mark_used(&self, id: &str) -> Result<Coupon> {
        tracing::info!("Marking coupon as used: {}", id);

        self.repo.mark_used(id).await
    }

    /// Move the listed active coupons to trash; returns how many moved
    pub async fn move_to_trash<I, S>(&self, ids: I) -> Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(0);
        }

        tracing::info!("Moving {} selected coupon(s) to trash", ids.len());

        let moved = self.repo.move_to_trash(&ids).await?;

        if moved < ids.len() as u64 {
            tracing::debug!("{} selected id(s) were not active", ids.len() as u64 - moved);
        }
        tracing::info!("Moved {} coupon(s) to trash", moved);

        Ok(moved)
    }

    /// Restore one coupon from trash with its fields and identifier intact
    pub async fn recover(&self, id: &str) -> Result<Coupon> {
        tracing::info!("Recovering coupon: {}", id);

        let coupon = self.repo.recover(id).await?;

        tracing::info!("Coupon {} ({}) recovered", coupon.id, coupon.product_name);

        Ok(coupon)
    }

    /// Restore the entire trash in one step; returns how many were recovered
    pub async fn recover_all(&self) -> Result<u64> {
        tracing::info!("Recovering all coupons from trash");

        let recovered = self.repo.recover_all().await.map_err(|e| {
            tracing::error!("Bulk recovery aborted, trash left unchanged: {}", e);
            e
        })?;

        tracing::info!("Recovered {} coupon(s)", recovered);

        Ok(recovered)
    }

    /// Permanently delete one coupon from trash
    pub async fn purge(&self, id: &str) -> Result<()> {
        tracing::info!("Purging coupon: {}", id);

        self.repo.purge(id).await?;

        tracing::info!("Coupon purged: {}", id);

        Ok(())
    }

    /// Permanently delete everything in trash
    pub async fn empty_trash(&self) -> Result<u64> {
        tracing::info!("Emptying trash");

        let purged = self.repo.purge_all().await?;

        tracing::info!("Purged {} coupon(s) from trash", purged);

        Ok(purged)
    }
}

fn validate_text(field: &str, value: String, max_len: usize) -> Result<String> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    if value.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{} exceeds {} characters",
            field, max_len
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::create_memory_pool;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn create_test_store(today: NaiveDate) -> (CouponStore, FixedClock) {
        let pool = create_memory_pool().await.unwrap();
        let clock = FixedClock::new(today);
        let store = CouponStore::new(Repository::new(pool), Arc::new(clock.clone()));
        (store, clock)
    }

    async fn add(store: &CouponStore, brand: &str, expires: NaiveDate) -> Coupon {
        store
            .create(CreateCouponRequest {
                brand: brand.to_string(),
                product_name: format!("{} voucher", brand),
                expiration_date: expires,
                image_path: String::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_blank_brand() {
        let (store, _clock) = create_test_store(date(2025, 3, 10)).await;

        let result = store
            .create(CreateCouponRequest {
                brand: "   ".to_string(),
                product_name: "Latte".to_string(),
                expiration_date: date(2025, 4, 1),
                image_path: String::new(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_overlong_fields() {
        let (store, _clock) = create_test_store(date(2025, 3, 10)).await;

        let long_image = store
            .create(CreateCouponRequest {
                brand: "Starbucks".to_string(),
                product_name: "Latte".to_string(),
                expiration_date: date(2025, 4, 1),
                image_path: "a".repeat(MAX_IMAGE_PATH_LENGTH + 1),
            })
            .await;
        assert!(matches!(long_image, Err(AppError::Validation(_))));

        let long_brand = store
            .create(CreateCouponRequest {
                brand: "b".repeat(MAX_BRAND_LENGTH + 1),
                product_name: "Latte".to_string(),
                expiration_date: date(2025, 4, 1),
                image_path: String::new(),
            })
            .await;
        assert!(matches!(long_brand, Err(AppError::Validation(_))));

        let at_limit = store
            .create(CreateCouponRequest {
                brand: "b".repeat(MAX_BRAND_LENGTH),
                product_name: "Latte".to_string(),
                expiration_date: date(2025, 4, 1),
                image_path: "a".repeat(MAX_IMAGE_PATH_LENGTH),
            })
            .await;
        assert!(at_limit.is_ok());
        assert_eq!(store.list_active(StatusFilter::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_active_filters_by_derived_status() {
        let (store, _clock) = create_test_store(date(2025, 3, 10)).await;
        let available = add(&store, "Starbucks", date(2025, 4, 1)).await;
        let expired = add(&store, "Olive Young", date(2025, 3, 1)).await;
        let used = add(&store, "CU", date(2025, 2, 1)).await;
        store.mark_used(&used.id).await.unwrap();

        let ids = |coupons: Vec<Coupon>| coupons.into_iter().map(|c| c.id).collect::<Vec<_>>();

        assert_eq!(
            ids(store.list_active(StatusFilter::Expired).await.unwrap()),
            vec![expired.id.clone()]
        );
        assert_eq!(
            ids(store.list_active(StatusFilter::Used).await.unwrap()),
            vec![used.id.clone()]
        );
        assert_eq!(
            ids(store.list_active(StatusFilter::Available).await.unwrap()),
            vec![available.id.clone()]
        );
        assert_eq!(store.list_active(StatusFilter::All).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_status_changes_as_clock_advances() {
        let (store, clock) = create_test_store(date(2025, 3, 10)).await;
        let coupon = add(&store, "Baskin", date(2025, 3, 12)).await;

        assert_eq!(store.status_of(&coupon), CouponStatus::Available);

        clock.set(date(2025, 3, 12));
        assert_eq!(store.status_of(&coupon), CouponStatus::Expired);
        assert_eq!(store.list_active(StatusFilter::Available).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_mark_used_is_idempotent() {
        let (store, _clock) = create_test_store(date(2025, 3, 10)).await;
        let coupon = add(&store, "GS25", date(2025, 5, 1)).await;

        let first = store.mark_used(&coupon.id).await.unwrap();
        let second = store.mark_used(&coupon.id).await.unwrap();

        assert!(first.is_used);
        assert_eq!(first, second);
        assert!(matches!(
            store.mark_used("unknown").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_move_and_recover_round_trip() {
        let (store, _clock) = create_test_store(date(2025, 3, 10)).await;
        let coupon = add(&store, "Twosome", date(2025, 1, 5)).await;

        assert_eq!(store.move_to_trash([coupon.id.clone()]).await.unwrap(), 1);
        assert!(store.list_active(StatusFilter::All).await.unwrap().is_empty());
        assert!(matches!(store.get(&coupon.id).await, Err(AppError::InvalidState(_))));

        let recovered = store.recover(&coupon.id).await.unwrap();

        assert_eq!(recovered, coupon);
        assert!(store.list_trash().await.unwrap().is_empty());
        assert_eq!(store.get(&coupon.id).await.unwrap(), coupon);
    }

    #[tokio::test]
    async fn test_edit_rules() {
        let (store, _clock) = create_test_store(date(2025, 3, 10)).await;
        let coupon = add(&store, "Ediya", date(2025, 6, 1)).await;

        let edited = store
            .edit(
                &coupon.id,
                CouponPatch {
                    expiration_date: Some(date(2025, 7, 1)),
                    ..CouponPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.expiration_date, date(2025, 7, 1));
        assert_eq!(edited.brand, "Ediya");

        let blank = CouponPatch {
            product_name: Some(String::new()),
            ..CouponPatch::default()
        };
        assert!(matches!(
            store.edit(&coupon.id, blank).await,
            Err(AppError::Validation(_))
        ));

        store.move_to_trash(vec![coupon.id.as_str()]).await.unwrap();
        assert!(matches!(
            store.edit(&coupon.id, CouponPatch::default()).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_recover_all_and_empty_trash() {
        let (store, _clock) = create_test_store(date(2025, 3, 10)).await;
        let a = add(&store, "A", date(2025, 1, 1)).await;
        let b = add(&store, "B", date(2025, 2, 1)).await;
        let c = add(&store, "C", date(2025, 5, 1)).await;

        store.move_to_trash([a.id.clone(), b.id.clone()]).await.unwrap();
        assert_eq!(store.count_trash().await.unwrap(), 2);

        assert_eq!(store.recover_all().await.unwrap(), 2);
        assert_eq!(store.count_trash().await.unwrap(), 0);
        assert_eq!(store.list_active(StatusFilter::All).await.unwrap().len(), 3);

        store.move_to_trash([c.id.clone()]).await.unwrap();
        assert_eq!(store.empty_trash().await.unwrap(), 1);
        assert!(matches!(store.recover(&c.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_purge_requires_trashed_coupon() {
        let (store, _clock) = create_test_store(date(2025, 3, 10)).await;
        let coupon = add(&store, "Mega", date(2025, 3, 1)).await;

        assert!(matches!(store.purge(&coupon.id).await, Err(AppError::NotFound(_))));

        store.move_to_trash([coupon.id.clone()]).await.unwrap();
        store.purge(&coupon.id).await.unwrap();

        assert!(matches!(store.get(&coupon.id).await, Err(AppError::NotFound(_))));
    }
}
