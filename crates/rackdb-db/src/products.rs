//! Postgres-backed [`CatalogStore`] over the `product` table and its
//! size/color/image child tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use rackdb_core::{CanonicalProduct, CatalogStore, Gender, StoreError, StoredProduct};

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `product` table. Child rows (sizes, colors, images) are
/// loaded separately and stitched in by [`PgCatalogStore`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub uid: Uuid,
    pub time_scraped: DateTime<Utc>,
    pub product_name: String,
    pub brand: String,
    /// `'M'`, `'F'`, or `'U'`; the application writes nothing else.
    pub gender: String,
    pub main_image_url: String,
    pub product_url: String,
    pub price: Decimal,
    pub on_sale: bool,
    pub store_product_id: String,
    pub category: Option<String>,
    pub active: bool,
}

const PRODUCT_COLUMNS: &str = "uid, time_scraped, product_name, brand, gender, main_image_url, \
     product_url, price, on_sale, store_product_id, category, active";

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Maps a driver error onto the store taxonomy the engine reacts to.
///
/// The distinction that matters most is unique-violation vs. everything
/// else: the engine's insert-then-update fallback keys off it. Pool and
/// connection failures become [`StoreError::Transport`] so the engine can
/// tag per-record transport failures; all remaining database-side errors
/// are non-uniqueness constraint failures.
#[must_use]
pub fn map_store_error(err: sqlx::Error, store_product_id: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                StoreError::UniqueViolation {
                    store_product_id: store_product_id.to_string(),
                }
            } else {
                StoreError::Constraint(db_err.message().to_string())
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Transport(err.to_string()),
        _ => StoreError::Other(err.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Store implementation
// ---------------------------------------------------------------------------

/// Durable catalog storage in Postgres.
///
/// Each trait method is one transaction (or one atomic statement), so a
/// failure inside any call rolls back that call alone; the engine depends
/// on this to bound the blast radius of a bad record to that record.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_children(
        tx: &mut Transaction<'_, Postgres>,
        uid: Uuid,
        product: &CanonicalProduct,
    ) -> Result<(), sqlx::Error> {
        for (position, size) in product.sizes.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_size (size, position, product_uid) VALUES ($1, $2, $3)",
            )
            .bind(size)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(uid)
            .execute(&mut **tx)
            .await?;
        }
        for (position, color) in product.colors.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_color (color, position, product_uid) VALUES ($1, $2, $3)",
            )
            .bind(color)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(uid)
            .execute(&mut **tx)
            .await?;
        }
        for (position, image_url) in product.images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_image (image_url, position, product_uid) VALUES ($1, $2, $3)",
            )
            .bind(image_url)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(uid)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn delete_children(
        tx: &mut Transaction<'_, Postgres>,
        uid: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM product_size WHERE product_uid = $1")
            .bind(uid)
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM product_color WHERE product_uid = $1")
            .bind(uid)
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM product_image WHERE product_uid = $1")
            .bind(uid)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn load_children(
        &self,
        uid: Uuid,
    ) -> Result<(Vec<String>, Vec<String>, Vec<String>), sqlx::Error> {
        let sizes = sqlx::query_scalar::<_, String>(
            "SELECT size FROM product_size WHERE product_uid = $1 ORDER BY position",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        let colors = sqlx::query_scalar::<_, String>(
            "SELECT color FROM product_color WHERE product_uid = $1 ORDER BY position",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        let images = sqlx::query_scalar::<_, String>(
            "SELECT image_url FROM product_image WHERE product_uid = $1 ORDER BY position",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        Ok((sizes, colors, images))
    }
}

fn row_to_stored(
    row: ProductRow,
    sizes: Vec<String>,
    colors: Vec<String>,
    images: Vec<String>,
) -> Result<StoredProduct, StoreError> {
    let gender = row
        .gender
        .parse::<Gender>()
        .map_err(|e| StoreError::Other(format!("bad gender column for {}: {e}", row.uid)))?;

    Ok(StoredProduct {
        uid: row.uid,
        time_scraped: row.time_scraped,
        active: row.active,
        product: CanonicalProduct {
            store_product_id: row.store_product_id,
            brand: row.brand,
            product_name: row.product_name,
            category: row.category.unwrap_or_default(),
            gender,
            price: row.price,
            on_sale: row.on_sale,
            sizes,
            colors,
            images,
            main_image_url: row.main_image_url,
            product_url: row.product_url,
        },
    })
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn deactivate_brand(&self, brand: &str) -> Result<u64, StoreError> {
        // A single UPDATE statement, so the bulk flip is atomic.
        let result = sqlx::query("UPDATE product SET active = false WHERE brand = $1")
            .bind(brand)
            .execute(&self.pool)
            .await
            .map_err(|e| map_store_error(e, ""))?;

        Ok(result.rows_affected())
    }

    async fn insert_product(&self, product: &CanonicalProduct) -> Result<Uuid, StoreError> {
        let map_err = |e| map_store_error(e, &product.store_product_id);

        let mut tx = self.pool.begin().await.map_err(map_err)?;

        // Plain INSERT, no ON CONFLICT: the uniqueness violation has to
        // surface so the engine can fall back to an update.
        let uid: Uuid = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO product \
                 (product_name, brand, gender, main_image_url, product_url, \
                  price, on_sale, store_product_id, category, active, time_scraped) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULLIF($9, ''), true, NOW()) \
             RETURNING uid",
        )
        .bind(&product.product_name)
        .bind(&product.brand)
        .bind(product.gender.as_str())
        .bind(&product.main_image_url)
        .bind(&product.product_url)
        .bind(product.price)
        .bind(product.on_sale)
        .bind(&product.store_product_id)
        .bind(&product.category)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_err)?;

        Self::insert_children(&mut tx, uid, product)
            .await
            .map_err(map_err)?;

        tx.commit().await.map_err(map_err)?;
        Ok(uid)
    }

    async fn find_by_store_product_id(
        &self,
        store_product_id: &str,
    ) -> Result<Option<StoredProduct>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE store_product_id = $1"
        ))
        .bind(store_product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_store_error(e, store_product_id))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let (sizes, colors, images) = self
            .load_children(row.uid)
            .await
            .map_err(|e| map_store_error(e, store_product_id))?;

        row_to_stored(row, sizes, colors, images).map(Some)
    }

    async fn update_product(
        &self,
        uid: Uuid,
        product: &CanonicalProduct,
    ) -> Result<(), StoreError> {
        let map_err = |e| map_store_error(e, &product.store_product_id);

        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let result = sqlx::query(
            "UPDATE product SET \
                 product_name   = $1, \
                 brand          = $2, \
                 gender         = $3, \
                 main_image_url = $4, \
                 product_url    = $5, \
                 price          = $6, \
                 on_sale        = $7, \
                 category       = NULLIF($8, ''), \
                 active         = true, \
                 time_scraped   = NOW() \
             WHERE uid = $9",
        )
        .bind(&product.product_name)
        .bind(&product.brand)
        .bind(product.gender.as_str())
        .bind(&product.main_image_url)
        .bind(&product.product_url)
        .bind(product.price)
        .bind(product.on_sale)
        .bind(&product.category)
        .bind(uid)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Other(format!("no product row with uid {uid}")));
        }

        // Child lists are owned by the product with no lifecycle of their
        // own; replace wholesale rather than diffing.
        Self::delete_children(&mut tx, uid).await.map_err(map_err)?;
        Self::insert_children(&mut tx, uid, product)
            .await
            .map_err(map_err)?;

        tx.commit().await.map_err(map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_map_to_transport() {
        let err = map_store_error(sqlx::Error::PoolTimedOut, "A1");
        assert!(matches!(err, StoreError::Transport(_)));

        let err = map_store_error(sqlx::Error::PoolClosed, "A1");
        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[test]
    fn non_database_errors_map_to_other() {
        let err = map_store_error(sqlx::Error::RowNotFound, "A1");
        assert!(matches!(err, StoreError::Other(_)));
    }
}
