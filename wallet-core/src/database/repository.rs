//! Repository layer for database operations
//!
//! The active collection lives in `coupons`, the trash in `trashed_coupons`.
//! Every mutation runs in one transaction so an identifier is never
//! observable in both tables or in neither.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::BTreeSet;
use uuid::Uuid;

const COUPON_COLUMNS: &str =
    "id, brand, product_name, expiration_date, is_used, image_path, created_at, updated_at";

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new, unused coupon into the active collection
    pub async fn create_coupon(&self, req: CreateCouponRequest) -> Result<Coupon> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            INSERT INTO coupons (id, brand, product_name, expiration_date, is_used, image_path, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.brand)
        .bind(&req.product_name)
        .bind(req.expiration_date)
        .bind(&req.image_path)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created coupon: {}", id);
        Ok(coupon)
    }

    /// Find which partition holds an identifier
    pub async fn locate(&self, id: &str) -> Result<Location> {
        let mut conn = self.pool.acquire().await?;
        locate_in(&mut *conn, id).await
    }

    /// Get an active coupon by ID
    pub async fn get_active(&self, id: &str) -> Result<Option<Coupon>> {
        let mut conn = self.pool.acquire().await?;
        fetch_active(&mut *conn, id).await
    }

    /// Get a trashed coupon by ID
    pub async fn get_trashed(&self, id: &str) -> Result<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM trashed_coupons WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// List the active collection in creation order
    pub async fn list_active(&self) -> Result<Vec<Coupon>> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    /// List the trash, most recently trashed first
    pub async fn list_trashed(&self) -> Result<Vec<Coupon>> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM trashed_coupons ORDER BY trashed_at DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    pub async fn count_trashed(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trashed_coupons")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Apply the supplied fields to an active coupon
    pub async fn update_coupon(&self, id: &str, patch: &CouponPatch) -> Result<Coupon> {
        let mut tx = self.pool.begin().await?;

        let current = require_active(&mut *tx, id, "edit").await?;
        if patch.is_empty() {
            return Ok(current);
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE coupons SET updated_at = ");
        query.push_bind(Utc::now());

        if let Some(product_name) = &patch.product_name {
            query.push(", product_name = ").push_bind(product_name);
        }

        if let Some(brand) = &patch.brand {
            query.push(", brand = ").push_bind(brand);
        }

        if let Some(expiration_date) = patch.expiration_date {
            query.push(", expiration_date = ").push_bind(expiration_date);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.build().execute(&mut *tx).await?;

        let coupon = fetch_active(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        tx.commit().await?;

        tracing::debug!("Updated coupon: {}", id);
        Ok(coupon)
    }

    /// Flag an active coupon as used; already-used coupons are left alone
    pub async fn mark_used(&self, id: &str) -> Result<Coupon> {
        let mut tx = self.pool.begin().await?;

        let coupon = require_active(&mut *tx, id, "mark as used").await?;
        if coupon.is_used {
            return Ok(coupon);
        }

        sqlx::query("UPDATE coupons SET is_used = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let coupon = fetch_active(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        tx.commit().await?;

        tracing::debug!("Marked coupon as used: {}", id);
        Ok(coupon)
    }

    /// Transfer every active coupon in `ids` to the trash; unknown ids are skipped
    pub async fn move_to_trash(&self, ids: &BTreeSet<String>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let trashed_at = Utc::now();
        let mut moved = 0;

        for id in ids {
            if locate_in(&mut *tx, id).await? != Location::Active {
                continue;
            }

            sqlx::query(&format!(
                r#"
                INSERT INTO trashed_coupons ({COUPON_COLUMNS}, trashed_at)
                SELECT {COUPON_COLUMNS}, ? FROM coupons WHERE id = ?
                "#
            ))
            .bind(trashed_at)
            .bind(id)
            .execute(&mut *tx)
            .await?;

            moved += sqlx::query("DELETE FROM coupons WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;

        tracing::debug!("Moved {} coupon(s) to trash", moved);
        Ok(moved)
    }

    /// Transfer one trashed coupon back to the active collection
    pub async fn recover(&self, id: &str) -> Result<Coupon> {
        let mut tx = self.pool.begin().await?;

        if locate_in(&mut *tx, id).await? != Location::Trashed {
            return Err(AppError::NotFound(format!("{} is not in trash", id)));
        }

        sqlx::query(&format!(
            r#"
            INSERT INTO coupons ({COUPON_COLUMNS})
            SELECT {COUPON_COLUMNS} FROM trashed_coupons WHERE id = ?
            "#
        ))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM trashed_coupons WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let coupon = fetch_active(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        tx.commit().await?;

        tracing::debug!("Recovered coupon: {}", id);
        Ok(coupon)
    }

    /// Transfer the whole trash back to the active collection, or nothing at all
    pub async fn recover_all(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let collisions: Vec<String> = sqlx::query_scalar(
            "SELECT t.id FROM trashed_coupons t INNER JOIN coupons c ON c.id = t.id",
        )
        .fetch_all(&mut *tx)
        .await?;

        if !collisions.is_empty() {
            // Dropping the transaction rolls it back; trash stays as it was.
            return Err(AppError::InvariantViolation(format!(
                "ids present in both partitions: {}",
                collisions.join(", ")
            )));
        }

        let recovered = sqlx::query(&format!(
            r#"
            INSERT INTO coupons ({COUPON_COLUMNS})
            SELECT {COUPON_COLUMNS} FROM trashed_coupons
            "#
        ))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM trashed_coupons")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Recovered {} coupon(s) from trash", recovered);
        Ok(recovered)
    }

    /// Permanently delete one trashed coupon
    pub async fn purge(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM trashed_coupons WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound(format!("{} is not in trash", id)));
        }

        tracing::debug!("Purged coupon: {}", id);
        Ok(())
    }

    /// Permanently delete everything in the trash
    pub async fn purge_all(&self) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM trashed_coupons")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Purged {} coupon(s) from trash", rows);
        Ok(rows)
    }
}

async fn fetch_active(conn: &mut SqliteConnection, id: &str) -> Result<Option<Coupon>> {
    let coupon = sqlx::query_as::<_, Coupon>(&format!(
        "SELECT {COUPON_COLUMNS} FROM coupons WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(coupon)
}

async fn locate_in(conn: &mut SqliteConnection, id: &str) -> Result<Location> {
    let active: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    let trashed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trashed_coupons WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    match (active > 0, trashed > 0) {
        (true, true) => {
            tracing::error!("Coupon {} found in both active collection and trash", id);
            Err(AppError::InvariantViolation(format!(
                "{} is both active and trashed",
                id
            )))
        }
        (true, false) => Ok(Location::Active),
        (false, true) => Ok(Location::Trashed),
        (false, false) => Ok(Location::Missing),
    }
}

/// Fetch an active coupon, distinguishing "in trash" from "unknown"
async fn require_active(conn: &mut SqliteConnection, id: &str, action: &str) -> Result<Coupon> {
    match locate_in(conn, id).await? {
        Location::Active => fetch_active(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string())),
        Location::Trashed => Err(AppError::InvalidState(format!(
            "cannot {} coupon {} while it is in trash",
            action, id
        ))),
        Location::Missing => Err(AppError::NotFound(id.to_string())),
    }
}
