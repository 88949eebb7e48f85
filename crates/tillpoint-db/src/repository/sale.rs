//! # Sale Repository
//!
//! Read side of sales. Sales are only written by
//! [`SqliteSaleStore::commit_sale`](crate::store::SqliteSaleStore).
//!
//! ## Loading details
//! ```text
//!   SELECT sales ... LIMIT n          (1 query)
//!        │
//!        ├── sale_items ⋈ products    WHERE sale_id IN (...)      (1 query)
//!        ├── customers                WHERE id IN (...)           (1 query)
//!        └── users (name, email)      WHERE id IN (...)           (1 query)
//! ```
//! A page of sales costs four queries however many rows it holds.

use std::collections::HashMap;

use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tillpoint_core::store::SaleFilter;
use tillpoint_core::{
    Customer, PageRequest, ProductSummary, Sale, SaleDetail, SaleItem, SaleItemDetail,
    UserSummary,
};

const SALE_COLUMNS: &str = "id, receipt_number, subtotal_cents, discount_cents, tax_cents, \
     total_cents, payment_method, user_id, customer_id, created_at";

#[derive(FromRow)]
struct ItemRow {
    #[sqlx(flatten)]
    item: SaleItem,
    product_sku: String,
    product_name: String,
    product_category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// One sale with its lines, customer and cashier.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<SaleDetail>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match sale {
            Some(sale) => Ok(self.hydrate(vec![sale]).await?.pop()),
            None => Ok(None),
        }
    }

    /// A page of sales matching `filter`, newest first, plus the total
    /// matching count.
    pub async fn list(
        &self,
        filter: &SaleFilter,
        page: PageRequest,
    ) -> DbResult<(Vec<SaleDetail>, i64)> {
        debug!(?filter, page = page.page, limit = page.limit, "Listing sales");

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM sales WHERE 1 = 1");
        push_sale_filter(&mut count_qb, filter);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sales WHERE 1 = 1"));
        push_sale_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;

        Ok((self.hydrate(sales).await?, total))
    }

    /// Every sale matching `filter`, newest first.
    pub async fn matching(&self, filter: &SaleFilter) -> DbResult<Vec<SaleDetail>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sales WHERE 1 = 1"));
        push_sale_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, rowid DESC");
        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;

        self.hydrate(sales).await
    }

    /// The `limit` most recent sales.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<SaleDetail>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(sales).await
    }

    /// The `limit` most recent sales of one customer.
    pub async fn for_customer(&self, customer_id: &str, limit: u32) -> DbResult<Vec<SaleDetail>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE customer_id = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))
        .bind(customer_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(sales).await
    }

    /// Attaches lines, customers and cashiers to `sales`, keeping order.
    async fn hydrate(&self, sales: Vec<Sale>) -> DbResult<Vec<SaleDetail>> {
        if sales.is_empty() {
            return Ok(Vec::new());
        }

        let sale_ids: Vec<&str> = sales.iter().map(|s| s.id.as_str()).collect();
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT si.id, si.sale_id, si.product_id, si.line_no, si.quantity, \
             si.unit_price_cents, si.subtotal_cents, \
             p.sku AS product_sku, p.name AS product_name, p.category AS product_category \
             FROM sale_items si JOIN products p ON p.id = si.product_id \
             WHERE si.sale_id IN (",
        );
        push_id_list(&mut qb, &sale_ids);
        qb.push(" ORDER BY si.sale_id, si.line_no");
        let item_rows = qb.build_query_as::<ItemRow>().fetch_all(&self.pool).await?;

        let mut items: HashMap<String, Vec<SaleItemDetail>> = HashMap::new();
        for row in item_rows {
            let product = ProductSummary {
                id: row.item.product_id.clone(),
                sku: row.product_sku,
                name: row.product_name,
                category: row.product_category,
            };
            items
                .entry(row.item.sale_id.clone())
                .or_default()
                .push(SaleItemDetail {
                    item: row.item,
                    product,
                });
        }

        let customer_ids: Vec<&str> = sales
            .iter()
            .filter_map(|s| s.customer_id.as_deref())
            .collect();
        let mut customers: HashMap<String, Customer> = HashMap::new();
        if !customer_ids.is_empty() {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT c.id, c.name, c.phone, c.email, c.address, c.created_at, c.updated_at \
                 FROM customers c WHERE c.id IN (",
            );
            push_id_list(&mut qb, &customer_ids);
            for customer in qb.build_query_as::<Customer>().fetch_all(&self.pool).await? {
                customers.insert(customer.id.clone(), customer);
            }
        }

        let user_ids: Vec<&str> = sales.iter().map(|s| s.user_id.as_str()).collect();
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, name, email FROM users WHERE id IN (");
        push_id_list(&mut qb, &user_ids);
        let users: HashMap<String, UserSummary> = qb
            .build_query_as::<(String, String, String)>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|(id, name, email)| (id, UserSummary { name, email }))
            .collect();

        sales
            .into_iter()
            .map(|sale| {
                let user = users.get(&sale.user_id).cloned().ok_or_else(|| {
                    DbError::Internal(format!("sale {} references missing user", sale.id))
                })?;
                let customer = sale
                    .customer_id
                    .as_ref()
                    .and_then(|id| customers.get(id).cloned());
                let items = items.remove(&sale.id).unwrap_or_default();
                Ok(SaleDetail {
                    sale,
                    items,
                    customer,
                    user,
                })
            })
            .collect()
    }
}

/// Appends `?, ?, ...)` binding each id. Duplicates are harmless.
fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[&str]) {
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.to_string());
    }
    separated.push_unseparated(")");
}

// Timestamps are RFC 3339 text in UTC, so string order is time order.
fn push_sale_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &SaleFilter) {
    if let Some(start) = filter.start {
        qb.push(" AND created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        qb.push(" AND created_at < ").push_bind(end);
    }
    if let Some(method) = filter.payment_method {
        qb.push(" AND payment_method = ").push_bind(method);
    }
    if let Some(user_id) = filter.user_id.as_deref() {
        qb.push(" AND user_id = ").push_bind(user_id.to_string());
    }
}
