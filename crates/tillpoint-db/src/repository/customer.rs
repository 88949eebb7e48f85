//! # Customer Repository
//!
//! Customer CRUD. A customer with sales cannot be deleted.

use chrono::Utc;
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::like_pattern;
use tillpoint_core::{Customer, PageRequest};

const CUSTOMER_COLUMNS: &str = "c.id, c.name, c.phone, c.email, c.address, c.created_at, c.updated_at";

/// Contact fields, for create and for partial update.
#[derive(Debug, Clone, Default)]
pub struct CustomerFields {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// A customer plus how many sales reference it.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerWithSales {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub customer: Customer,
    pub sale_count: i64,
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Customers matching `search` (name, email or phone), newest first.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> DbResult<(Vec<CustomerWithSales>, i64)> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM customers c WHERE 1 = 1");
        push_search(&mut count_qb, search);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {CUSTOMER_COLUMNS}, \
             (SELECT COUNT(*) FROM sales s WHERE s.customer_id = c.id) AS sale_count \
             FROM customers c WHERE 1 = 1"
        ));
        push_search(&mut qb, search);
        qb.push(" ORDER BY c.created_at DESC, c.rowid DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb
            .build_query_as::<CustomerWithSales>()
            .fetch_all(&self.pool)
            .await?;
        Ok((rows, total))
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers c WHERE c.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Creates a customer. `fields.name` is required by the caller.
    pub async fn create(&self, fields: CustomerFields) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: fields.name.unwrap_or_default(),
            phone: fields.phone,
            email: fields.email,
            address: fields.address,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, email, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Applies the `Some` fields of `changes`.
    pub async fn update(&self, id: &str, changes: CustomerFields) -> DbResult<Customer> {
        let mut customer = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        if let Some(name) = changes.name {
            customer.name = name;
        }
        if let Some(phone) = changes.phone {
            customer.phone = Some(phone);
        }
        if let Some(email) = changes.email {
            customer.email = Some(email);
        }
        if let Some(address) = changes.address {
            customer.address = Some(address);
        }
        customer.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = ?2, phone = ?3, email = ?4, address = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(customer)
    }

    /// Deletes a customer that has no sales.
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - the customer has sales
    /// * `Err(DbError::NotFound)` - no such customer
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let sales = self.sale_count(id).await?;
        if sales > 0 {
            return Err(DbError::Conflict(format!(
                "Cannot delete customer with {sales} existing sales"
            )));
        }

        // The foreign key still guards a sale sneaking in between the
        // count and the delete.
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }

    pub async fn sale_count(&self, id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE customer_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn push_search(qb: &mut QueryBuilder<'_, Sqlite>, search: Option<&str>) {
    if let Some(term) = search {
        let pattern = like_pattern(term);
        qb.push(" AND (LOWER(c.name) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(COALESCE(c.email, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(COALESCE(c.phone, '')) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}
