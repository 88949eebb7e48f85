//! # Sale Store
//!
//! The storage seam consumed by [`SaleEngine`](crate::engine::SaleEngine).
//!
//! ```text
//!                 SaleEngine
//!                     │ &S: SaleStore
//!        ┌────────────┴────────────┐
//!        ▼                         ▼
//!  SqliteSaleStore            MemoryStore
//!  (tillpoint-db, live)       (memory.rs, fixtures)
//! ```
//!
//! Implementations must make `commit_sale` all-or-nothing and must
//! decrement stock conditionally (never below zero) inside it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::sale::SaleDraft;
use crate::types::{Customer, PageRequest, PaymentMethod, Product, SaleDetail};

/// Errors a store may report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The conditional decrement for a line matched no row. Everything
    /// written so far has been rolled back.
    #[error("Insufficient stock for product {product_id}: available {available}")]
    StockConflict { product_id: String, available: i64 },

    /// The generated receipt number is already taken.
    #[error("Receipt number {0} already exists")]
    DuplicateReceipt(String),

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

/// Sale list filters. `start` is inclusive, `end` exclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaleFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub user_id: Option<String>,
}

impl SaleFilter {
    /// Whether a sale header passes this filter.
    pub fn matches(&self, sale: &crate::types::Sale) -> bool {
        self.start.map_or(true, |s| sale.created_at >= s)
            && self.end.map_or(true, |e| sale.created_at < e)
            && self.payment_method.map_or(true, |m| sale.payment_method == m)
            && self
                .user_id
                .as_deref()
                .map_or(true, |u| sale.user_id == u)
    }
}

/// Data access for the sale workflow and its read paths.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Active products among `ids`. Missing or inactive ids are simply
    /// absent from the result.
    async fn active_products(&self, ids: &[String]) -> Result<Vec<Product>, StoreError>;

    async fn find_customer(&self, id: &str) -> Result<Option<Customer>, StoreError>;

    /// Persists header, lines, stock decrements and SALE logs atomically
    /// and returns the stored sale.
    async fn commit_sale(&self, draft: &SaleDraft) -> Result<SaleDetail, StoreError>;

    async fn get_sale(&self, id: &str) -> Result<Option<SaleDetail>, StoreError>;

    /// One page of sales, newest first, plus the total matching count.
    async fn list_sales(
        &self,
        filter: &SaleFilter,
        page: PageRequest,
    ) -> Result<(Vec<SaleDetail>, i64), StoreError>;

    /// Every sale matching `filter`, newest first.
    async fn sales_matching(&self, filter: &SaleFilter) -> Result<Vec<SaleDetail>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sale;
    use chrono::{Duration, TimeZone};

    fn sale_at(created_at: DateTime<Utc>, method: PaymentMethod) -> Sale {
        Sale {
            id: "s1".into(),
            receipt_number: "RCP-1-AAAAA".into(),
            subtotal_cents: 100,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: 100,
            payment_method: method,
            user_id: "u1".into(),
            customer_id: None,
            created_at,
        }
    }

    #[test]
    fn test_filter_bounds() {
        let day = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let filter = SaleFilter {
            start: Some(day),
            end: Some(day + Duration::days(1)),
            ..Default::default()
        };

        assert!(filter.matches(&sale_at(day, PaymentMethod::Cash)));
        assert!(!filter.matches(&sale_at(day + Duration::days(1), PaymentMethod::Cash)));
        assert!(!filter.matches(&sale_at(day - Duration::seconds(1), PaymentMethod::Cash)));
    }

    #[test]
    fn test_filter_method_and_user() {
        let now = Utc::now();
        let filter = SaleFilter {
            payment_method: Some(PaymentMethod::Card),
            user_id: Some("u1".into()),
            ..Default::default()
        };
        assert!(filter.matches(&sale_at(now, PaymentMethod::Card)));
        assert!(!filter.matches(&sale_at(now, PaymentMethod::Cash)));

        let other_user = SaleFilter {
            user_id: Some("u2".into()),
            ..Default::default()
        };
        assert!(!other_user.matches(&sale_at(now, PaymentMethod::Card)));
    }
}
