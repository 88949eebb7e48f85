//! # tillpoint-core: Pure Business Logic for Tillpoint POS
//!
//! This crate is the **heart** of Tillpoint POS. It contains the domain
//! types, money arithmetic, validation rules, the sale transaction engine
//! and the report reductions, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Tillpoint POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard (React SPA)                        │   │
//! │  │    Products ──► Customers ──► New Sale ──► Reports              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tillpoint-api (axum)                         │   │
//! │  │    routes, bearer auth, request DTOs, response envelope         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ tillpoint-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐ │   │
//! │  │   │  types  │ │  money  │ │  engine  │ │  sale   │ │ report │ │   │
//! │  │   │ Product │ │  Money  │ │SaleEngine│ │ pricing │ │ daily  │ │   │
//! │  │   │  Sale   │ │ Decimal │ │SaleStore │ │ totals  │ │ stock  │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ SaleStore trait                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        tillpoint-db (SqliteSaleStore)  |  memory::MemoryStore   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, InventoryLog, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`sale`] - Sale requests, line pricing, totals, receipt numbers
//! - [`store`] - The storage seam consumed by the engine
//! - [`memory`] - In-memory fixture implementation of the store
//! - [`engine`] - The sale transaction engine
//! - [`report`] - In-memory report reductions
//!
//! ## Example Usage
//!
//! ```rust
//! use tillpoint_core::money::Money;
//!
//! let price = Money::from_cents(9999); // $99.99
//! let line = price.multiply_quantity(2);
//! assert_eq!(line.cents(), 19998);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod memory;
pub mod money;
pub mod report;
pub mod sale;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use engine::SaleEngine;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use store::{SaleStore, StoreError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway carts and keeps the commit transaction short.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Reorder level assigned to products created without one.
pub const DEFAULT_REORDER_LEVEL: i64 = 10;
