//! # tillpoint-db: Database Layer for Tillpoint POS
//!
//! SQLite persistence for the POS backend, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tillpoint Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleEngine<SqliteSaleStore>   (tillpoint-core)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tillpoint-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ product, sale │    │  (embedded)  │  │   │
//! │  │   │               │◄───│ customer, ... │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │    ├───────────────┤    └──────────────┘  │   │
//! │  │   │ WAL + busy    │◄───│ SqliteSaleStore│                     │   │
//! │  │   └───────────────┘    └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tillpoint_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/tillpoint.db")).await?;
//! let engine = SaleEngine::new(db.sale_store());
//! let low = db.products().low_stock().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::SqliteSaleStore;

pub use repository::customer::{CustomerFields, CustomerRepository, CustomerWithSales};
pub use repository::inventory::InventoryLogRepository;
pub use repository::product::{NewProduct, ProductChanges, ProductFilter, ProductRepository};
pub use repository::sale::SaleRepository;
pub use repository::user::{NewUser, UserRepository};
