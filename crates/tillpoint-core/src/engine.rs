//! # Sale Engine
//!
//! Orchestrates a sale from request to committed receipt over any
//! [`SaleStore`].
//!
//! ## create_sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. request.validate()              EmptyCart / CartTooLarge / ...      │
//! │  2. store.active_products(ids)      ProductNotFound                     │
//! │  3. store.find_customer(id)?        CustomerNotFound                    │
//! │  4. aggregated qty <= stock         InsufficientStock                   │
//! │  5. price lines, compute totals     (WARN if total < 0)                 │
//! │  6. store.commit_sale(draft)        StockConflict → InsufficientStock   │
//! │        └── DuplicateReceipt → new receipt number, up to 3 attempts      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 1-4 never mutate anything. Step 6 is all-or-nothing.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::report::{self, DailySummary};
use crate::sale::{generate_receipt_number, price_lines, SaleDraft, SaleRequest, SaleTotals};
use crate::store::{SaleFilter, SaleStore, StoreError};
use crate::types::{Actor, PageRequest, Pagination, Product, SaleDetail};

/// Commit attempts before giving up on finding a free receipt number.
pub const MAX_RECEIPT_ATTEMPTS: usize = 3;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::StockConflict {
                product_id,
                available,
            } => CoreError::InsufficientStock {
                product: product_id,
                available,
                requested: 0,
            },
            StoreError::DuplicateReceipt(receipt) => {
                CoreError::Storage(format!("receipt number {receipt} already exists"))
            }
            StoreError::Backend(msg) => CoreError::Storage(msg),
        }
    }
}

/// The sale transaction engine.
pub struct SaleEngine<S> {
    store: S,
}

impl<S: SaleStore> SaleEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates, prices and atomically commits a sale for `actor`.
    pub async fn create_sale(&self, actor: &Actor, request: SaleRequest) -> CoreResult<SaleDetail> {
        request.validate()?;

        let ids = request.product_ids();
        let products: HashMap<String, Product> = self
            .store
            .active_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        if let Some(missing) = ids.iter().find(|id| !products.contains_key(*id)) {
            return Err(CoreError::ProductNotFound(missing.clone()));
        }

        if let Some(customer_id) = &request.customer_id {
            if self.store.find_customer(customer_id).await?.is_none() {
                return Err(CoreError::CustomerNotFound(customer_id.clone()));
            }
        }

        let wanted = request.quantities_by_product();
        for id in &ids {
            let product = &products[id];
            let requested = wanted[id.as_str()];
            if product.stock_qty < requested {
                debug!(product_id = %id, available = product.stock_qty, requested, "stock pre-check failed");
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock_qty,
                    requested,
                });
            }
        }

        let lines = price_lines(&request, &products)?;
        let totals = SaleTotals::compute(
            lines.iter().map(|l| l.subtotal),
            request.discount,
            request.tax,
        )?;
        if totals.total.is_negative() {
            warn!(
                user_id = %actor.user_id,
                subtotal = %totals.subtotal,
                discount = %totals.discount,
                total = %totals.total,
                "discount exceeds subtotal plus tax, recording negative total"
            );
        }

        let mut draft = SaleDraft {
            sale_id: uuid::Uuid::new_v4().to_string(),
            receipt_number: new_receipt_number(),
            user_id: actor.user_id.clone(),
            customer_id: request.customer_id.clone(),
            payment_method: request.payment_method,
            lines,
            totals,
            created_at: Utc::now(),
        };

        for attempt in 1..=MAX_RECEIPT_ATTEMPTS {
            match self.store.commit_sale(&draft).await {
                Ok(sale) => {
                    info!(
                        sale_id = %sale.sale.id,
                        receipt = %sale.sale.receipt_number,
                        user_id = %actor.user_id,
                        lines = sale.items.len(),
                        total = %totals.total,
                        "sale committed"
                    );
                    return Ok(sale);
                }
                Err(StoreError::DuplicateReceipt(receipt)) => {
                    warn!(%receipt, attempt, "receipt number collision, regenerating");
                    draft.receipt_number = new_receipt_number();
                }
                Err(StoreError::StockConflict {
                    product_id,
                    available,
                }) => {
                    warn!(%product_id, available, "stock changed before commit, sale rolled back");
                    let product = products
                        .get(&product_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| product_id.clone());
                    return Err(CoreError::InsufficientStock {
                        product,
                        available,
                        requested: wanted.get(product_id.as_str()).copied().unwrap_or(0),
                    });
                }
                Err(StoreError::Backend(msg)) => return Err(CoreError::Storage(msg)),
            }
        }

        Err(CoreError::Storage(format!(
            "no free receipt number after {MAX_RECEIPT_ATTEMPTS} attempts"
        )))
    }

    pub async fn get_sale(&self, id: &str) -> CoreResult<SaleDetail> {
        self.store
            .get_sale(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))
    }

    /// One page of sales, newest first.
    pub async fn get_sales(
        &self,
        filter: &SaleFilter,
        page: PageRequest,
    ) -> CoreResult<(Vec<SaleDetail>, Pagination)> {
        let (sales, total) = self.store.list_sales(filter, page).await?;
        Ok((sales, Pagination::new(page, total)))
    }

    /// Every sale of a UTC calendar day and its summary.
    pub async fn get_daily_sales(
        &self,
        day: NaiveDate,
    ) -> CoreResult<(Vec<SaleDetail>, DailySummary)> {
        let (start, end) = report::day_bounds(day);
        let filter = SaleFilter {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        };
        let sales = self.store.sales_matching(&filter).await?;
        let summary = report::daily_summary(&sales);
        Ok((sales, summary))
    }
}

// ThreadRng is not Send; keep it out of the async state machine.
fn new_receipt_number() -> String {
    generate_receipt_number(Utc::now(), &mut rand::thread_rng())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::money::Money;
    use crate::sale::SaleLineRequest;
    use crate::types::{Customer, PaymentMethod, Role};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn cashier() -> Actor {
        Actor {
            user_id: "demo-cashier".into(),
            role: Role::Cashier,
        }
    }

    fn request(items: &[(&str, i64)], discount: i64, tax: i64) -> SaleRequest {
        SaleRequest {
            customer_id: None,
            items: items
                .iter()
                .map(|(id, qty)| SaleLineRequest {
                    product_id: id.to_string(),
                    quantity: *qty,
                })
                .collect(),
            payment_method: PaymentMethod::Cash,
            discount: Money::from_cents(discount),
            tax: Money::from_cents(tax),
        }
    }

    #[tokio::test]
    async fn test_worked_example() {
        let engine = SaleEngine::new(MemoryStore::demo());

        let sale = engine
            .create_sale(&cashier(), request(&[("1", 1), ("2", 2)], 500, 1098))
            .await
            .unwrap();

        assert_eq!(sale.sale.subtotal_cents, 12597);
        assert_eq!(sale.sale.total_cents, 13195);
        assert_eq!(sale.items[0].item.line_no, 0);
        assert_eq!(sale.items[1].item.subtotal_cents, 2598);
        assert!(sale.sale.receipt_number.starts_with("RCP-"));

        let store = engine.store();
        assert_eq!(store.product("1").unwrap().stock_qty, 49);
        assert_eq!(store.product("2").unwrap().stock_qty, 98);

        let logs = store.inventory_logs();
        let deltas: Vec<i64> = logs.iter().map(|l| l.change_qty).collect();
        assert_eq!(deltas, vec![-1, -2]);
        let note = format!("Sale {}", sale.sale.receipt_number);
        assert!(logs.iter().all(|l| l.notes.as_deref() == Some(note.as_str())));
    }

    #[tokio::test]
    async fn test_stock_is_checked_per_product_total() {
        let engine = SaleEngine::new(MemoryStore::demo());
        // Product 5 has 25 units; two lines of 13 exceed it together.
        let err = engine
            .create_sale(&cashier(), request(&[("5", 13), ("5", 13)], 0, 0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 25, requested: 26, .. }
        ));
        assert_eq!(engine.store().product("5").unwrap().stock_qty, 25);
        assert_eq!(engine.store().sale_count(), 0);
    }

    #[tokio::test]
    async fn test_failures_do_not_mutate() {
        let engine = SaleEngine::new(MemoryStore::demo());

        let empty = engine.create_sale(&cashier(), request(&[], 0, 0)).await;
        assert!(matches!(empty, Err(CoreError::EmptyCart)));

        let missing = engine
            .create_sale(&cashier(), request(&[("1", 1), ("404", 1)], 0, 0))
            .await;
        assert!(matches!(missing, Err(CoreError::ProductNotFound(id)) if id == "404"));

        let mut with_customer = request(&[("1", 1)], 0, 0);
        with_customer.customer_id = Some("nobody".into());
        let no_customer = engine.create_sale(&cashier(), with_customer).await;
        assert!(matches!(no_customer, Err(CoreError::CustomerNotFound(_))));

        assert_eq!(engine.store().product("1").unwrap().stock_qty, 50);
        assert!(engine.store().inventory_logs().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_product_is_not_for_sale() {
        let store = MemoryStore::demo();
        let mut product = store.product("3").unwrap();
        product.is_active = false;
        store.insert_product(product);

        let engine = SaleEngine::new(store);
        let err = engine
            .create_sale(&cashier(), request(&[("3", 1)], 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_negative_total_is_kept() {
        let engine = SaleEngine::new(MemoryStore::demo());
        let sale = engine
            .create_sale(&cashier(), request(&[("3", 1)], 1000, 0))
            .await
            .unwrap();
        assert_eq!(sale.sale.total_cents, -150);
    }

    #[tokio::test]
    async fn test_customer_attached() {
        let store = MemoryStore::demo();
        let now = Utc::now();
        store.insert_customer(Customer {
            id: "c-9".into(),
            name: "Walk In".into(),
            phone: None,
            email: None,
            address: None,
            created_at: now,
            updated_at: now,
        });
        let engine = SaleEngine::new(store);

        let mut req = request(&[("2", 1)], 0, 0);
        req.customer_id = Some("c-9".into());
        let sale = engine.create_sale(&cashier(), req).await.unwrap();
        assert_eq!(sale.customer.unwrap().name, "Walk In");
        assert_eq!(sale.sale.customer_id.as_deref(), Some("c-9"));
    }

    #[tokio::test]
    async fn test_receipt_collision_retries() {
        let engine = SaleEngine::new(MemoryStore::demo());
        engine.store().force_receipt_collisions(2);

        let sale = engine
            .create_sale(&cashier(), request(&[("2", 1)], 0, 0))
            .await
            .unwrap();
        assert_eq!(engine.store().sale_count(), 1);
        assert_eq!(engine.store().product("2").unwrap().stock_qty, 99);
        assert!(sale.sale.receipt_number.starts_with("RCP-"));
    }

    #[tokio::test]
    async fn test_receipt_collision_gives_up() {
        let engine = SaleEngine::new(MemoryStore::demo());
        engine.store().force_receipt_collisions(MAX_RECEIPT_ATTEMPTS);

        let err = engine
            .create_sale(&cashier(), request(&[("2", 1)], 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(engine.store().product("2").unwrap().stock_qty, 100);
    }

    /// Lets another "terminal" sell stock between the pre-check and the
    /// commit.
    struct RacingStore {
        inner: Arc<MemoryStore>,
        product_id: &'static str,
        stock_at_commit: i64,
    }

    #[async_trait]
    impl SaleStore for RacingStore {
        async fn active_products(&self, ids: &[String]) -> Result<Vec<Product>, StoreError> {
            self.inner.active_products(ids).await
        }

        async fn find_customer(&self, id: &str) -> Result<Option<Customer>, StoreError> {
            self.inner.find_customer(id).await
        }

        async fn commit_sale(&self, draft: &SaleDraft) -> Result<SaleDetail, StoreError> {
            self.inner.set_stock(self.product_id, self.stock_at_commit);
            self.inner.commit_sale(draft).await
        }

        async fn get_sale(&self, id: &str) -> Result<Option<SaleDetail>, StoreError> {
            self.inner.get_sale(id).await
        }

        async fn list_sales(
            &self,
            filter: &SaleFilter,
            page: PageRequest,
        ) -> Result<(Vec<SaleDetail>, i64), StoreError> {
            self.inner.list_sales(filter, page).await
        }

        async fn sales_matching(
            &self,
            filter: &SaleFilter,
        ) -> Result<Vec<SaleDetail>, StoreError> {
            self.inner.sales_matching(filter).await
        }
    }

    #[tokio::test]
    async fn test_commit_time_shortage_reads_as_insufficient_stock() {
        let inner = Arc::new(MemoryStore::demo());
        let engine = SaleEngine::new(RacingStore {
            inner: Arc::clone(&inner),
            product_id: "4",
            stock_at_commit: 1,
        });

        let err = engine
            .create_sale(&cashier(), request(&[("1", 1), ("4", 2)], 0, 0))
            .await
            .unwrap_err();

        match err {
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => {
                assert_eq!(product, "USB-C Cable - 6ft");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(inner.product("1").unwrap().stock_qty, 50);
        assert!(inner.inventory_logs().is_empty());
    }

    #[tokio::test]
    async fn test_read_paths() {
        let engine = SaleEngine::new(MemoryStore::demo());
        let first = engine
            .create_sale(&cashier(), request(&[("1", 1)], 0, 0))
            .await
            .unwrap();
        engine
            .create_sale(&cashier(), request(&[("2", 3)], 0, 0))
            .await
            .unwrap();

        let fetched = engine.get_sale(&first.sale.id).await.unwrap();
        assert_eq!(fetched.sale.receipt_number, first.sale.receipt_number);
        assert!(matches!(
            engine.get_sale("missing").await,
            Err(CoreError::SaleNotFound(_))
        ));

        let (page, pagination) = engine
            .get_sales(&SaleFilter::default(), PageRequest::new(Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(pagination.total, 2);
        assert_eq!(pagination.pages, 2);

        let (today, summary) = engine
            .get_daily_sales(Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(today.len(), 2);
        assert_eq!(summary.total_sales, 2);
        assert_eq!(summary.top_products["Coffee Mug - Ceramic"], 3);
    }
}
