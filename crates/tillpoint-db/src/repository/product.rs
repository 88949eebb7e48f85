//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Filtered, paginated listing (search / category / low stock)
//! - Create with initial stock, update with stock adjustment
//! - Soft delete
//!
//! ## Stock writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every stock change is paired with an inventory log in ONE transaction  │
//! │                                                                         │
//! │  create(stock=20)      INSERT product ─┐                                │
//! │                        INSERT log +20 RESTOCK "Initial stock"  COMMIT   │
//! │                                                                         │
//! │  update(stock 20→15)   UPDATE product ─┐                                │
//! │                        INSERT log -5 ADJUSTMENT "Stock adjustment"      │
//! │                                                                         │
//! │  sale (store.rs)       conditional decrement + log -qty SALE            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::inventory::insert_log;
use tillpoint_core::{InventoryReason, PageRequest, Product, DEFAULT_REORDER_LEVEL};

pub(crate) const PRODUCT_COLUMNS: &str = "id, sku, barcode, name, category, price_cents, \
     cost_cents, stock_qty, reorder_level, is_active, created_at, updated_at";

/// List filters. All optional; combined with AND.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of name, sku or barcode.
    pub search: Option<String>,
    pub category: Option<String>,
    /// Only products at or below their reorder level.
    pub low_stock: bool,
}

/// Fields for a new product. Validated by the caller.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    /// Defaults to `PROD-<unix millis>`.
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub price_cents: i64,
    pub cost_cents: i64,
    pub stock_qty: i64,
    /// Defaults to [`DEFAULT_REORDER_LEVEL`].
    pub reorder_level: Option<i64>,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    pub stock_qty: Option<i64>,
    pub reorder_level: Option<i64>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Active products matching `filter`, newest first, plus the total
    /// matching count.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> DbResult<(Vec<Product>, i64)> {
        debug!(?filter, page = page.page, limit = page.limit, "Listing products");

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM products WHERE is_active = 1");
        push_product_filter(&mut count_qb, filter);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1"
        ));
        push_product_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

        debug!(count = products.len(), total, "Listed products");
        Ok((products, total))
    }

    /// Active products for the inventory report, lowest stock first.
    pub async fn for_inventory_report(
        &self,
        category: Option<&str>,
        low_stock_only: bool,
    ) -> DbResult<Vec<Product>> {
        let filter = ProductFilter {
            search: None,
            category: category.map(str::to_string),
            low_stock: low_stock_only,
        };
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1"
        ));
        push_product_filter(&mut qb, &filter);
        qb.push(" ORDER BY stock_qty ASC, name ASC");
        Ok(qb.build_query_as::<Product>().fetch_all(&self.pool).await?)
    }

    /// Gets an active product by its ID.
    pub async fn get_active(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Active products among `ids`. Unknown or inactive ids are skipped.
    pub async fn active_by_ids(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 AND id IN ("
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        Ok(qb.build_query_as::<Product>().fetch_all(&self.pool).await?)
    }

    /// Distinct categories of active products, sorted.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT category
            FROM products
            WHERE is_active = 1 AND category IS NOT NULL
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Active products at or below their reorder level, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        self.for_inventory_report(None, true).await
    }

    /// Inserts a product. A positive initial stock is logged as RESTOCK
    /// in the same transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU or barcode already exists
    pub async fn create(&self, input: NewProduct, user_id: &str) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: input
                .sku
                .unwrap_or_else(|| format!("PROD-{}", now.timestamp_millis())),
            barcode: input.barcode,
            name: input.name,
            category: input.category,
            price_cents: input.price_cents,
            cost_cents: input.cost_cents,
            stock_qty: input.stock_qty,
            reorder_level: input.reorder_level.unwrap_or(DEFAULT_REORDER_LEVEL),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %product.sku, stock = product.stock_qty, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, barcode, name, category,
                price_cents, cost_cents, stock_qty, reorder_level,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock_qty)
        .bind(product.reorder_level)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        if product.stock_qty > 0 {
            insert_log(
                &mut tx,
                &product.id,
                user_id,
                product.stock_qty,
                InventoryReason::Restock,
                "Initial stock",
                now,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    /// Applies `changes` to an active product. A stock change writes an
    /// ADJUSTMENT log with the delta in the same transaction.
    pub async fn update(
        &self,
        id: &str,
        changes: ProductChanges,
        user_id: &str,
    ) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Take the write lock before reading the current stock.
        let touched = sqlx::query("UPDATE products SET updated_at = ?1 WHERE id = ?2 AND is_active = 1")
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        let mut product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        let old_stock = product.stock_qty;

        if let Some(sku) = changes.sku {
            product.sku = sku;
        }
        if let Some(barcode) = changes.barcode {
            product.barcode = Some(barcode);
        }
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(category) = changes.category {
            product.category = Some(category);
        }
        if let Some(price) = changes.price_cents {
            product.price_cents = price;
        }
        if let Some(cost) = changes.cost_cents {
            product.cost_cents = cost;
        }
        if let Some(stock) = changes.stock_qty {
            product.stock_qty = stock;
        }
        if let Some(level) = changes.reorder_level {
            product.reorder_level = level;
        }

        sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                barcode = ?3,
                name = ?4,
                category = ?5,
                price_cents = ?6,
                cost_cents = ?7,
                stock_qty = ?8,
                reorder_level = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock_qty)
        .bind(product.reorder_level)
        .execute(&mut *tx)
        .await?;

        let delta = product.stock_qty - old_stock;
        if delta != 0 {
            insert_log(
                &mut tx,
                &product.id,
                user_id,
                delta,
                InventoryReason::Adjustment,
                "Stock adjustment",
                now,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sales still reference the row, so it is never removed.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts active products at or below their reorder level.
    pub async fn count_low_stock(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE is_active = 1 AND stock_qty <= reorder_level",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

fn push_product_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(sku) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(COALESCE(barcode, '')) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
    if filter.low_stock {
        qb.push(" AND stock_qty <= reorder_level");
    }
}

/// `%term%` in lower case with LIKE wildcards escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::user::NewUser;
    use tillpoint_core::Role;

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = db
            .users()
            .create(NewUser {
                name: "Stock Clerk".into(),
                email: "inventory@pos.com".into(),
                password: "inventory123".into(),
                role: Role::InventoryManager,
            })
            .await
            .unwrap();
        (db, user.id)
    }

    fn new_product(sku: &str, name: &str, category: &str, stock: i64) -> NewProduct {
        NewProduct {
            sku: Some(sku.into()),
            name: name.into(),
            category: Some(category.into()),
            price_cents: 1999,
            cost_cents: 1000,
            stock_qty: stock,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_logs_initial_stock() {
        let (db, user_id) = setup().await;
        let repo = db.products();

        let product = repo
            .create(new_product("KB-01", "Keyboard", "Peripherals", 20), &user_id)
            .await
            .unwrap();
        assert_eq!(product.reorder_level, DEFAULT_REORDER_LEVEL);

        let logs = db.inventory_logs().for_product(&product.id, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].change_qty, 20);
        assert_eq!(logs[0].reason, InventoryReason::Restock);
        assert_eq!(logs[0].notes.as_deref(), Some("Initial stock"));

        let empty = repo
            .create(new_product("KB-02", "Keyboard Mini", "Peripherals", 0), &user_id)
            .await
            .unwrap();
        assert!(db.inventory_logs().for_product(&empty.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_default_sku() {
        let (db, user_id) = setup().await;
        let product = db
            .products()
            .create(
                NewProduct {
                    name: "Mystery Box".into(),
                    price_cents: 500,
                    ..Default::default()
                },
                &user_id,
            )
            .await
            .unwrap();
        assert!(product.sku.starts_with("PROD-"));
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_unique_violation() {
        let (db, user_id) = setup().await;
        let repo = db.products();
        repo.create(new_product("DUP-1", "First", "A", 1), &user_id)
            .await
            .unwrap();

        let err = repo
            .create(new_product("DUP-1", "Second", "A", 1), &user_id)
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("products.sku"));
        // The failed insert's RESTOCK log must not survive either.
        let (all, _) = repo
            .list(&ProductFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_update_logs_adjustment() {
        let (db, user_id) = setup().await;
        let repo = db.products();
        let product = repo
            .create(new_product("MUG-1", "Mug", "Kitchen", 20), &user_id)
            .await
            .unwrap();

        let updated = repo
            .update(
                &product.id,
                ProductChanges {
                    stock_qty: Some(15),
                    price_cents: Some(2499),
                    ..Default::default()
                },
                &user_id,
            )
            .await
            .unwrap();
        assert_eq!(updated.stock_qty, 15);
        assert_eq!(updated.price_cents, 2499);
        assert_eq!(updated.name, "Mug");

        let logs = db.inventory_logs().for_product(&product.id, 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        let adjustment = logs
            .iter()
            .find(|l| l.reason == InventoryReason::Adjustment)
            .unwrap();
        assert_eq!(adjustment.change_qty, -5);
        assert_eq!(adjustment.notes.as_deref(), Some("Stock adjustment"));

        // No stock change, no log.
        repo.update(
            &product.id,
            ProductChanges {
                name: Some("Big Mug".into()),
                ..Default::default()
            },
            &user_id,
        )
        .await
        .unwrap();
        assert_eq!(db.inventory_logs().for_product(&product.id, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_by_check() {
        let (db, user_id) = setup().await;
        let repo = db.products();
        let product = repo
            .create(new_product("NEG-1", "Neg", "A", 1), &user_id)
            .await
            .unwrap();

        let err = repo
            .update(
                &product.id,
                ProductChanges {
                    stock_qty: Some(-1),
                    ..Default::default()
                },
                &user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
        assert_eq!(repo.get_active(&product.id).await.unwrap().unwrap().stock_qty, 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_soft_delete() {
        let (db, user_id) = setup().await;
        let repo = db.products();
        let mouse = repo
            .create(new_product("MS-100", "Wireless Mouse", "Peripherals", 5), &user_id)
            .await
            .unwrap();
        repo.create(new_product("MUG-100", "Coffee Mug", "Kitchen", 50), &user_id)
            .await
            .unwrap();
        repo.create(new_product("PEN_1", "Gel Pen 100%", "Stationery", 200), &user_id)
            .await
            .unwrap();

        let search = ProductFilter {
            search: Some("MOUSE".into()),
            ..Default::default()
        };
        let (found, total) = repo.list(&search, PageRequest::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].id, mouse.id);

        let literal = ProductFilter {
            search: Some("100%".into()),
            ..Default::default()
        };
        let (found, _) = repo.list(&literal, PageRequest::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sku, "PEN_1");

        let low = ProductFilter {
            low_stock: true,
            ..Default::default()
        };
        let (found, _) = repo.list(&low, PageRequest::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(repo.count_low_stock().await.unwrap(), 1);

        assert_eq!(
            repo.categories().await.unwrap(),
            vec!["Kitchen", "Peripherals", "Stationery"]
        );

        let (page, total) = repo
            .list(&ProductFilter::default(), PageRequest::new(Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);

        repo.soft_delete(&mouse.id).await.unwrap();
        assert!(repo.get_active(&mouse.id).await.unwrap().is_none());
        assert_eq!(repo.count_active().await.unwrap(), 2);
        assert!(matches!(
            repo.soft_delete(&mouse.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("Mouse"), "%mouse%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
