//! # In-Memory Store
//!
//! A [`SaleStore`] over plain collections behind a mutex. Used by the
//! engine's tests and as the fixture data source for demos without a
//! database.
//!
//! `commit_sale` checks every line against current stock before applying
//! anything, so a failed commit leaves no trace, same as the SQLite store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::sale::SaleDraft;
use crate::store::{SaleFilter, SaleStore, StoreError};
use crate::types::{
    Customer, InventoryLog, InventoryReason, PageRequest, Product, ProductSummary, Sale,
    SaleDetail, SaleItem, SaleItemDetail, UserSummary,
};

#[derive(Default)]
struct State {
    products: HashMap<String, Product>,
    customers: HashMap<String, Customer>,
    users: HashMap<String, UserSummary>,
    /// Oldest first.
    sales: Vec<SaleDetail>,
    logs: Vec<InventoryLog>,
    /// Commits left that should fail as receipt collisions.
    forced_receipt_collisions: usize,
}

/// Fixture store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the demo catalog: five products, two
    /// customers and one cashier (`demo-cashier`).
    pub fn demo() -> Self {
        let store = Self::new();
        let now = Utc::now();
        let catalog = [
            ("1", "PROD-001", "Wireless Bluetooth Headphones", "Electronics", 9999, 50),
            ("2", "PROD-002", "Coffee Mug - Ceramic", "Kitchen", 1299, 100),
            ("3", "PROD-003", "Notebook - A5 Lined", "Stationery", 850, 75),
            ("4", "PROD-004", "USB-C Cable - 6ft", "Electronics", 1599, 30),
            ("5", "PROD-005", "Water Bottle - Stainless Steel", "Kitchen", 2499, 25),
        ];
        for (id, sku, name, category, price_cents, stock_qty) in catalog {
            store.insert_product(Product {
                id: id.to_string(),
                sku: sku.to_string(),
                barcode: None,
                name: name.to_string(),
                category: Some(category.to_string()),
                price_cents,
                cost_cents: price_cents / 2,
                stock_qty,
                reorder_level: crate::DEFAULT_REORDER_LEVEL,
                is_active: true,
                created_at: now,
                updated_at: now,
            });
        }
        for (id, name) in [("1", "John Doe"), ("2", "Jane Smith")] {
            store.insert_customer(Customer {
                id: id.to_string(),
                name: name.to_string(),
                phone: None,
                email: None,
                address: None,
                created_at: now,
                updated_at: now,
            });
        }
        store.insert_user(
            "demo-cashier",
            UserSummary {
                name: "Demo Cashier".to_string(),
                email: "cashier@pos.com".to_string(),
            },
        );
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_product(&self, product: Product) {
        self.lock().products.insert(product.id.clone(), product);
    }

    pub fn insert_customer(&self, customer: Customer) {
        self.lock().customers.insert(customer.id.clone(), customer);
    }

    pub fn insert_user(&self, id: &str, user: UserSummary) {
        self.lock().users.insert(id.to_string(), user);
    }

    /// Overwrites a product's stock, bypassing the log. Test hook.
    pub fn set_stock(&self, product_id: &str, stock_qty: i64) {
        if let Some(p) = self.lock().products.get_mut(product_id) {
            p.stock_qty = stock_qty;
        }
    }

    /// Makes the next `n` commits fail with `DuplicateReceipt`.
    pub fn force_receipt_collisions(&self, n: usize) {
        self.lock().forced_receipt_collisions = n;
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        self.lock().products.get(id).cloned()
    }

    pub fn inventory_logs(&self) -> Vec<InventoryLog> {
        self.lock().logs.clone()
    }

    pub fn sale_count(&self) -> usize {
        self.lock().sales.len()
    }

    fn newest_first(state: &State, filter: &SaleFilter) -> Vec<SaleDetail> {
        state
            .sales
            .iter()
            .rev()
            .filter(|s| filter.matches(&s.sale))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn active_products(&self, ids: &[String]) -> Result<Vec<Product>, StoreError> {
        let state = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id))
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn find_customer(&self, id: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self.lock().customers.get(id).cloned())
    }

    async fn commit_sale(&self, draft: &SaleDraft) -> Result<SaleDetail, StoreError> {
        let mut state = self.lock();

        if state.forced_receipt_collisions > 0 {
            state.forced_receipt_collisions -= 1;
            return Err(StoreError::DuplicateReceipt(draft.receipt_number.clone()));
        }
        if state
            .sales
            .iter()
            .any(|s| s.sale.receipt_number == draft.receipt_number)
        {
            return Err(StoreError::DuplicateReceipt(draft.receipt_number.clone()));
        }

        // Walk the lines in order against a scratch copy of stock so the
        // first short line is reported and nothing is applied.
        let mut remaining: HashMap<&str, i64> = HashMap::new();
        for line in &draft.lines {
            let product = state
                .products
                .get(&line.product_id)
                .filter(|p| p.is_active)
                .ok_or_else(|| StoreError::StockConflict {
                    product_id: line.product_id.clone(),
                    available: 0,
                })?;
            let left = remaining
                .entry(line.product_id.as_str())
                .or_insert(product.stock_qty);
            if *left < line.quantity {
                return Err(StoreError::StockConflict {
                    product_id: line.product_id.clone(),
                    available: product.stock_qty,
                });
            }
            *left -= line.quantity;
        }

        let user = state
            .users
            .get(&draft.user_id)
            .cloned()
            .ok_or_else(|| StoreError::Backend(format!("unknown user {}", draft.user_id)))?;
        let customer = match &draft.customer_id {
            Some(id) => Some(
                state
                    .customers
                    .get(id)
                    .cloned()
                    .ok_or_else(|| StoreError::Backend(format!("unknown customer {id}")))?,
            ),
            None => None,
        };

        let note = draft.inventory_note();
        let mut items = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let summary = match state.products.get_mut(&line.product_id) {
                Some(product) => {
                    product.stock_qty -= line.quantity;
                    product.updated_at = draft.created_at;
                    ProductSummary::from(&*product)
                }
                None => return Err(StoreError::Backend("product vanished".to_string())),
            };
            state.logs.push(InventoryLog {
                id: uuid::Uuid::new_v4().to_string(),
                product_id: line.product_id.clone(),
                user_id: draft.user_id.clone(),
                change_qty: -line.quantity,
                reason: InventoryReason::Sale,
                notes: Some(note.clone()),
                created_at: draft.created_at,
            });
            items.push(SaleItemDetail {
                item: SaleItem {
                    id: line.id.clone(),
                    sale_id: draft.sale_id.clone(),
                    product_id: line.product_id.clone(),
                    line_no: line.line_no,
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                    subtotal_cents: line.subtotal.cents(),
                },
                product: summary,
            });
        }

        let detail = SaleDetail {
            sale: Sale {
                id: draft.sale_id.clone(),
                receipt_number: draft.receipt_number.clone(),
                subtotal_cents: draft.totals.subtotal.cents(),
                discount_cents: draft.totals.discount.cents(),
                tax_cents: draft.totals.tax.cents(),
                total_cents: draft.totals.total.cents(),
                payment_method: draft.payment_method,
                user_id: draft.user_id.clone(),
                customer_id: draft.customer_id.clone(),
                created_at: draft.created_at,
            },
            items,
            customer,
            user,
        };
        state.sales.push(detail.clone());
        Ok(detail)
    }

    async fn get_sale(&self, id: &str) -> Result<Option<SaleDetail>, StoreError> {
        Ok(self.lock().sales.iter().find(|s| s.sale.id == id).cloned())
    }

    async fn list_sales(
        &self,
        filter: &SaleFilter,
        page: PageRequest,
    ) -> Result<(Vec<SaleDetail>, i64), StoreError> {
        let state = self.lock();
        let all = Self::newest_first(&state, filter);
        let total = all.len() as i64;
        let rows = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((rows, total))
    }

    async fn sales_matching(&self, filter: &SaleFilter) -> Result<Vec<SaleDetail>, StoreError> {
        Ok(Self::newest_first(&self.lock(), filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::sale::{DraftLine, SaleTotals};
    use crate::types::PaymentMethod;

    fn draft(receipt: &str, lines: &[(&str, i64, i64)]) -> SaleDraft {
        let lines: Vec<DraftLine> = lines
            .iter()
            .enumerate()
            .map(|(i, (pid, qty, price))| DraftLine {
                id: format!("line-{i}"),
                line_no: i as i64,
                product_id: pid.to_string(),
                product_name: pid.to_string(),
                quantity: *qty,
                unit_price: Money::from_cents(*price),
                subtotal: Money::from_cents(price * qty),
            })
            .collect();
        SaleDraft {
            sale_id: format!("sale-{receipt}"),
            receipt_number: receipt.to_string(),
            user_id: "demo-cashier".into(),
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            totals: SaleTotals::compute(
                lines.iter().map(|l| l.subtotal),
                Money::zero(),
                Money::zero(),
            )
            .unwrap(),
            lines,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_demo_catalog() {
        let store = MemoryStore::demo();
        let found = store
            .active_products(&["1".into(), "2".into(), "99".into()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(store.find_customer("2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_commit_applies_everything() {
        let store = MemoryStore::demo();
        let sale = store
            .commit_sale(&draft("RCP-1-AAAAA", &[("1", 1, 9999), ("2", 2, 1299)]))
            .await
            .unwrap();

        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.user.email, "cashier@pos.com");
        assert_eq!(store.product("1").unwrap().stock_qty, 49);
        assert_eq!(store.product("2").unwrap().stock_qty, 98);

        let logs = store.inventory_logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].change_qty, -2);
        assert_eq!(logs[1].notes.as_deref(), Some("Sale RCP-1-AAAAA"));
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_no_trace() {
        let store = MemoryStore::demo();
        // Second line overdraws product 4 (stock 30) once combined with the first.
        let result = store
            .commit_sale(&draft("RCP-1-BBBBB", &[("4", 20, 1599), ("4", 11, 1599)]))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::StockConflict { available: 30, .. })
        ));
        assert_eq!(store.product("4").unwrap().stock_qty, 30);
        assert!(store.inventory_logs().is_empty());
        assert_eq!(store.sale_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_receipt_rejected() {
        let store = MemoryStore::demo();
        store
            .commit_sale(&draft("RCP-1-CCCCC", &[("3", 1, 850)]))
            .await
            .unwrap();
        let again = store.commit_sale(&draft("RCP-1-CCCCC", &[("3", 1, 850)])).await;
        assert!(matches!(again, Err(StoreError::DuplicateReceipt(_))));
        assert_eq!(store.product("3").unwrap().stock_qty, 74);
    }

    #[tokio::test]
    async fn test_list_sales_pages_newest_first() {
        let store = MemoryStore::demo();
        for i in 0..3 {
            store
                .commit_sale(&draft(&format!("RCP-{i}-DDDDD"), &[("2", 1, 1299)]))
                .await
                .unwrap();
        }

        let (rows, total) = store
            .list_sales(&SaleFilter::default(), PageRequest::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sale.receipt_number, "RCP-2-DDDDD");
    }
}
