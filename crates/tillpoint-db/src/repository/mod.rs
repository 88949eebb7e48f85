//! # Repository Module
//!
//! One repository per table family, each a thin handle around the pool.
//!
//! ```text
//!  Handler ──► db.products()        ProductRepository       products (+ logs)
//!          ──► db.customers()       CustomerRepository      customers
//!          ──► db.users()           UserRepository          users
//!          ──► db.sales()           SaleRepository          sales, sale_items (read)
//!          ──► db.inventory_logs()  InventoryLogRepository  inventory_logs (read)
//! ```
//!
//! Sales are written only through [`crate::store::SqliteSaleStore`].

pub mod customer;
pub mod inventory;
pub mod product;
pub mod sale;
pub mod user;
