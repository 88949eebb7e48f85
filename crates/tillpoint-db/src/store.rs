//! # SQLite Sale Store
//!
//! The live [`SaleStore`] behind the sale engine.
//!
//! ## Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT sales            ← takes the write lock; UNIQUE(receipt)      │
//! │    for each line, in order:                                             │
//! │      UPDATE products SET stock_qty = stock_qty - q                      │
//! │        WHERE id = ? AND is_active = 1 AND stock_qty >= q                │
//! │        0 rows ─► ROLLBACK, StockConflict                                │
//! │      INSERT sale_items                                                  │
//! │      INSERT inventory_logs (-q, SALE, "Sale <receipt>")                 │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The decrement is conditional in SQL, so two terminals selling the last
//! unit cannot both succeed: the second one waits on the write lock, then
//! matches no row.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbError;
use crate::repository::customer::CustomerRepository;
use crate::repository::inventory::insert_log;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use tillpoint_core::sale::SaleDraft;
use tillpoint_core::store::SaleFilter;
use tillpoint_core::{
    Customer, InventoryReason, PageRequest, Product, SaleDetail, SaleStore, StoreError,
};

const RECEIPT_COLUMN: &str = "sales.receipt_number";

#[derive(Debug, Clone)]
pub struct SqliteSaleStore {
    pool: SqlitePool,
}

impl SqliteSaleStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteSaleStore { pool }
    }

    async fn write_sale(&self, draft: &SaleDraft) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO sales (id, receipt_number, subtotal_cents, discount_cents, tax_cents,
                               total_cents, payment_method, user_id, customer_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&draft.sale_id)
        .bind(&draft.receipt_number)
        .bind(draft.totals.subtotal.cents())
        .bind(draft.totals.discount.cents())
        .bind(draft.totals.tax.cents())
        .bind(draft.totals.total.cents())
        .bind(draft.payment_method)
        .bind(&draft.user_id)
        .bind(&draft.customer_id)
        .bind(draft.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            let err = DbError::from(e);
            if err.is_unique_violation_on(RECEIPT_COLUMN) {
                return Err(StoreError::DuplicateReceipt(draft.receipt_number.clone()));
            }
            return Err(err.into());
        }

        let note = draft.inventory_note();
        for line in &draft.lines {
            let decremented = sqlx::query(
                r#"
                UPDATE products
                SET stock_qty = stock_qty - ?1, updated_at = ?2
                WHERE id = ?3 AND is_active = 1 AND stock_qty >= ?1
                "#,
            )
            .bind(line.quantity)
            .bind(draft.created_at)
            .bind(&line.product_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            if decremented.rows_affected() == 0 {
                let available: Option<i64> = sqlx::query_scalar(
                    "SELECT stock_qty FROM products WHERE id = ?1 AND is_active = 1",
                )
                .bind(&line.product_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::from)?;

                tx.rollback().await.map_err(DbError::from)?;
                return Err(StoreError::StockConflict {
                    product_id: line.product_id.clone(),
                    available: available.unwrap_or(0),
                });
            }

            sqlx::query(
                r#"
                INSERT INTO sale_items (id, sale_id, product_id, line_no, quantity,
                                        unit_price_cents, subtotal_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&line.id)
            .bind(&draft.sale_id)
            .bind(&line.product_id)
            .bind(line.line_no)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(line.subtotal.cents())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            insert_log(
                &mut tx,
                &line.product_id,
                &draft.user_id,
                -line.quantity,
                InventoryReason::Sale,
                &note,
                draft.created_at,
            )
            .await?;
        }

        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }
}

#[async_trait]
impl SaleStore for SqliteSaleStore {
    async fn active_products(&self, ids: &[String]) -> Result<Vec<Product>, StoreError> {
        Ok(ProductRepository::new(self.pool.clone())
            .active_by_ids(ids)
            .await?)
    }

    async fn find_customer(&self, id: &str) -> Result<Option<Customer>, StoreError> {
        Ok(CustomerRepository::new(self.pool.clone()).get(id).await?)
    }

    async fn commit_sale(&self, draft: &SaleDraft) -> Result<SaleDetail, StoreError> {
        debug!(
            sale_id = %draft.sale_id,
            receipt = %draft.receipt_number,
            lines = draft.lines.len(),
            "Committing sale"
        );

        if let Err(err) = self.write_sale(draft).await {
            if let StoreError::Backend(msg) = &err {
                warn!(sale_id = %draft.sale_id, error = %msg, "Sale transaction failed");
            }
            return Err(err);
        }

        SaleRepository::new(self.pool.clone())
            .get_detail(&draft.sale_id)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("sale {} vanished after commit", draft.sale_id)))
    }

    async fn get_sale(&self, id: &str) -> Result<Option<SaleDetail>, StoreError> {
        Ok(SaleRepository::new(self.pool.clone()).get_detail(id).await?)
    }

    async fn list_sales(
        &self,
        filter: &SaleFilter,
        page: PageRequest,
    ) -> Result<(Vec<SaleDetail>, i64), StoreError> {
        Ok(SaleRepository::new(self.pool.clone())
            .list(filter, page)
            .await?)
    }

    async fn sales_matching(&self, filter: &SaleFilter) -> Result<Vec<SaleDetail>, StoreError> {
        Ok(SaleRepository::new(self.pool.clone())
            .matching(filter)
            .await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::CustomerFields;
    use crate::repository::product::NewProduct;
    use crate::repository::user::NewUser;
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use tillpoint_core::sale::{DraftLine, SaleLineRequest, SaleRequest, SaleTotals};
    use tillpoint_core::{Actor, CoreError, Money, PaymentMethod, Role, SaleEngine};

    struct Fixture {
        db: Database,
        cashier: Actor,
        headphones: String,
        mug: String,
    }

    async fn fixture(config: DbConfig) -> Fixture {
        let db = Database::new(config).await.unwrap();
        let user = db
            .users()
            .create(NewUser {
                name: "Demo Cashier".into(),
                email: "cashier@pos.com".into(),
                password: "cashier123".into(),
                role: Role::Cashier,
            })
            .await
            .unwrap();
        let headphones = db
            .products()
            .create(product("ELEC-001", "Wireless Bluetooth Headphones", 9999, 50), &user.id)
            .await
            .unwrap();
        let mug = db
            .products()
            .create(product("KIT-001", "Coffee Mug - Ceramic", 1299, 100), &user.id)
            .await
            .unwrap();

        Fixture {
            db,
            cashier: Actor {
                user_id: user.id,
                role: Role::Cashier,
            },
            headphones: headphones.id,
            mug: mug.id,
        }
    }

    fn product(sku: &str, name: &str, price_cents: i64, stock: i64) -> NewProduct {
        NewProduct {
            sku: Some(sku.into()),
            name: name.into(),
            category: Some("Demo".into()),
            price_cents,
            cost_cents: price_cents / 2,
            stock_qty: stock,
            ..Default::default()
        }
    }

    fn request(lines: &[(&str, i64)], method: PaymentMethod) -> SaleRequest {
        SaleRequest {
            customer_id: None,
            items: lines
                .iter()
                .map(|(id, qty)| SaleLineRequest {
                    product_id: id.to_string(),
                    quantity: *qty,
                })
                .collect(),
            payment_method: method,
            discount: Money::zero(),
            tax: Money::zero(),
        }
    }

    fn draft(f: &Fixture, receipt: &str, lines: &[(&str, i64, i64)]) -> SaleDraft {
        let lines: Vec<DraftLine> = lines
            .iter()
            .enumerate()
            .map(|(i, (id, qty, price))| DraftLine {
                id: uuid::Uuid::new_v4().to_string(),
                line_no: i as i64,
                product_id: id.to_string(),
                product_name: id.to_string(),
                quantity: *qty,
                unit_price: Money::from_cents(*price),
                subtotal: Money::from_cents(price * qty),
            })
            .collect();
        let totals = SaleTotals::compute(lines.iter().map(|l| l.subtotal), Money::zero(), Money::zero())
            .unwrap();
        SaleDraft {
            sale_id: uuid::Uuid::new_v4().to_string(),
            receipt_number: receipt.into(),
            user_id: f.cashier.user_id.clone(),
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            lines,
            totals,
            created_at: Utc::now(),
        }
    }

    async fn stock(db: &Database, id: &str) -> i64 {
        db.products().get_active(id).await.unwrap().unwrap().stock_qty
    }

    #[tokio::test]
    async fn test_commit_worked_example() {
        let f = fixture(DbConfig::in_memory()).await;
        let engine = SaleEngine::new(f.db.sale_store());

        let mut req = request(&[(f.headphones.as_str(), 1), (f.mug.as_str(), 2)], PaymentMethod::Card);
        req.discount = Money::from_cents(500);
        req.tax = Money::from_cents(1098);
        let sale = engine.create_sale(&f.cashier, req).await.unwrap();

        assert_eq!(sale.sale.subtotal_cents, 12597);
        assert_eq!(sale.sale.total_cents, 13195);
        assert_eq!(sale.user.email, "cashier@pos.com");
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.items[0].product.name, "Wireless Bluetooth Headphones");
        assert_eq!(sale.items[1].item.subtotal_cents, 2598);

        assert_eq!(stock(&f.db, &f.headphones).await, 49);
        assert_eq!(stock(&f.db, &f.mug).await, 98);

        let logs = f.db.inventory_logs().for_product(f.mug.as_str(), 1).await.unwrap();
        assert_eq!(logs[0].change_qty, -2);
        assert_eq!(logs[0].reason, InventoryReason::Sale);
        assert_eq!(
            logs[0].notes.as_deref(),
            Some(format!("Sale {}", sale.sale.receipt_number).as_str())
        );
        assert_eq!(f.db.inventory_logs().net_change(&f.mug).await.unwrap(), 98);

        let fetched = engine.get_sale(&sale.sale.id).await.unwrap();
        assert_eq!(fetched, sale);
    }

    #[tokio::test]
    async fn test_stock_conflict_rolls_back_earlier_lines() {
        let f = fixture(DbConfig::in_memory()).await;
        let store = f.db.sale_store();

        let d = draft(&f, "RCP-1-AAAAA", &[(f.mug.as_str(), 5, 1299), (f.headphones.as_str(), 51, 9999)]);
        let err = store.commit_sale(&d).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::StockConflict { ref product_id, available: 50 } if product_id == &f.headphones
        ));
        assert_eq!(stock(&f.db, &f.mug).await, 100);
        assert!(store.get_sale(&d.sale_id).await.unwrap().is_none());
        assert_eq!(f.db.inventory_logs().net_change(&f.mug).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_duplicate_receipt_is_reported() {
        let f = fixture(DbConfig::in_memory()).await;
        let store = f.db.sale_store();

        store
            .commit_sale(&draft(&f, "RCP-1-AAAAA", &[(f.mug.as_str(), 1, 1299)]))
            .await
            .unwrap();
        let err = store
            .commit_sale(&draft(&f, "RCP-1-AAAAA", &[(f.mug.as_str(), 1, 1299)]))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateReceipt(r) if r == "RCP-1-AAAAA"));
        assert_eq!(stock(&f.db, &f.mug).await, 99);
    }

    #[tokio::test]
    async fn test_direct_and_engine_commits_number_lines_alike() {
        let f = fixture(DbConfig::in_memory()).await;
        let store = f.db.sale_store();
        let engine = SaleEngine::new(f.db.sale_store());

        let d = draft(&f, "RCP-1-AAAAA", &[(f.mug.as_str(), 1, 1299), (f.headphones.as_str(), 1, 9999)]);
        store.commit_sale(&d).await.unwrap();
        let direct = store.get_sale(&d.sale_id).await.unwrap().unwrap();

        let priced = engine
            .create_sale(
                &f.cashier,
                request(&[(f.mug.as_str(), 1), (f.headphones.as_str(), 1)], PaymentMethod::Cash),
            )
            .await
            .unwrap();

        let direct_lines: Vec<i64> = direct.items.iter().map(|i| i.item.line_no).collect();
        let priced_lines: Vec<i64> = priced.items.iter().map(|i| i.item.line_no).collect();
        assert_eq!(direct_lines, vec![0, 1]);
        assert_eq!(direct_lines, priced_lines);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_no_trace() {
        let f = fixture(DbConfig::in_memory()).await;
        let engine = SaleEngine::new(f.db.sale_store());

        let err = engine
            .create_sale(&f.cashier, request(&[(f.headphones.as_str(), 51)], PaymentMethod::Cash))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 50, requested: 51, .. }
        ));
        assert_eq!(stock(&f.db, &f.headphones).await, 50);
        let (sales, total) = f
            .db
            .sales()
            .list(&SaleFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert!(sales.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_customer_attached_and_listed() {
        let f = fixture(DbConfig::in_memory()).await;
        let customer = f
            .db
            .customers()
            .create(CustomerFields {
                name: Some("John Doe".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let engine = SaleEngine::new(f.db.sale_store());

        let mut req = request(&[(f.mug.as_str(), 1)], PaymentMethod::EWallet);
        req.customer_id = Some(customer.id.clone());
        let sale = engine.create_sale(&f.cashier, req).await.unwrap();
        assert_eq!(sale.customer.as_ref().map(|c| c.name.as_str()), Some("John Doe"));

        engine
            .create_sale(&f.cashier, request(&[(f.mug.as_str(), 1)], PaymentMethod::Cash))
            .await
            .unwrap();

        let recent = f.db.sales().for_customer(&customer.id, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(f.db.customers().sale_count(&customer.id).await.unwrap(), 1);
        assert!(matches!(
            f.db.customers().delete(&customer.id).await,
            Err(DbError::Conflict(_))
        ));

        let wallet_only = SaleFilter {
            payment_method: Some(PaymentMethod::EWallet),
            ..Default::default()
        };
        let (page, total) = engine
            .get_sales(&wallet_only, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total.total, 1);
        assert_eq!(page[0].sale.id, sale.sale.id);

        let future_only = SaleFilter {
            start: Some(Utc::now() + Duration::days(1)),
            ..Default::default()
        };
        assert!(engine.store().sales_matching(&future_only).await.unwrap().is_empty());

        let (today, summary) = engine.get_daily_sales(Utc::now().date_naive()).await.unwrap();
        assert_eq!(today.len(), 2);
        assert_eq!(summary.total_sales, 2);
        assert_eq!(f.db.sales().recent(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_sales_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let f = fixture(DbConfig::new(dir.path().join("pos.db")).max_connections(5)).await;
        let limited = f
            .db
            .products()
            .create(product("LTD-001", "Limited Edition Mug", 2500, 10), &f.cashier.user_id)
            .await
            .unwrap();

        let engine = Arc::new(SaleEngine::new(f.db.sale_store()));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let engine = Arc::clone(&engine);
            let actor = f.cashier.clone();
            let id = limited.id.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .create_sale(&actor, request(&[(id.as_str(), 1)], PaymentMethod::Cash))
                    .await
            }));
        }

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(CoreError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(sold, 10);
        assert_eq!(stock(&f.db, &limited.id).await, 0);
        assert_eq!(f.db.inventory_logs().net_change(&limited.id).await.unwrap(), 0);
        f.db.close().await;
    }
}
