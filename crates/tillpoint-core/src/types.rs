//! # Domain Types
//!
//! Core domain types used throughout Tillpoint POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  InventoryLog   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  product_id     │       │
//! │  │  sku (business) │   │  receipt_number │   │  user_id        │       │
//! │  │  price_cents    │   │  total_cents    │   │  change_qty     │       │
//! │  │  stock_qty      │◄──│  SaleItem[]     │──►│  reason         │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │                                       │
//! │  ┌─────────────────┐   ┌────────┴────────┐   ┌─────────────────┐       │
//! │  │    Customer     │◄──│ customer_id?    │   │ PaymentMethod   │       │
//! │  │  (optional)     │   │ user_id ────────┼──►│ CASH | CARD |   │       │
//! │  └─────────────────┘   └─────────────────┘   │ E_WALLET        │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, receipt_number, email) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Enumerations
// =============================================================================

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentMethod {
    #[serde(rename = "CASH")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "CASH"))]
    Cash,
    #[serde(rename = "CARD")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "CARD"))]
    Card,
    #[serde(rename = "E_WALLET")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "E_WALLET"))]
    EWallet,
}

impl PaymentMethod {
    /// All accepted methods, in wire form.
    pub const ALL: [&'static str; 3] = ["CASH", "CARD", "E_WALLET"];

    /// Wire name (`CASH`, `CARD`, `E_WALLET`).
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::EWallet => "E_WALLET",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(PaymentMethod::Cash),
            "CARD" => Ok(PaymentMethod::Card),
            "E_WALLET" => Ok(PaymentMethod::EWallet),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "paymentMethod".to_string(),
                allowed: Self::ALL.iter().map(|m| m.to_string()).collect(),
            }),
        }
    }
}

/// Why a product's stock changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum InventoryReason {
    /// Stock left the shelf through a completed sale.
    Sale,
    /// Stock arrived (including the initial stock of a new product).
    Restock,
    /// Manual correction by inventory staff.
    Adjustment,
}

/// Staff role, as carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ADMIN"))]
    Admin,
    #[serde(rename = "CASHIER")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "CASHIER"))]
    Cashier,
    #[serde(rename = "INVENTORY_MANAGER")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "INVENTORY_MANAGER"))]
    InventoryManager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Cashier => "CASHIER",
            Role::InventoryManager => "INVENTORY_MANAGER",
        }
    }

    /// Whether this role may create, update or delete products.
    pub fn can_manage_inventory(&self) -> bool {
        matches!(self, Role::Admin | Role::InventoryManager)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Optional barcode, unique when present.
    pub barcode: Option<String>,

    /// Display name.
    pub name: String,

    /// Free-form category used by reports and filters.
    pub category: Option<String>,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Purchase cost in cents (for stock valuation).
    pub cost_cents: i64,

    /// Units on hand. Never negative.
    pub stock_qty: i64,

    /// Threshold at or below which the product counts as low stock.
    pub reorder_level: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the unit cost as a Money type.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Stock at or below the reorder level.
    pub fn is_low_stock(&self) -> bool {
        self.stock_qty <= self.reorder_level
    }

    /// Checks if the product can be sold in the given quantity right now.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && self.stock_qty >= quantity
    }

    /// Value of the stock on hand at cost.
    pub fn stock_value(&self) -> Money {
        self.cost().multiply_quantity(self.stock_qty)
    }
}

/// The part of a product embedded in sale line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSummary {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        ProductSummary {
            id: p.id.clone(),
            sku: p.sku.clone(),
            name: p.name.clone(),
            category: p.category.clone(),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer optionally attached to sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Users & Session
// =============================================================================

/// A staff account. The password hash never leaves tillpoint-db.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Name and email of the user who rang up a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserSummary {
    pub name: String,
    pub email: String,
}

/// The authenticated caller of an operation.
///
/// Built per request from verified token claims and passed explicitly;
/// there is no ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale header. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub receipt_number: String,
    /// Σ line subtotals.
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    /// subtotal − discount + tax; may be negative.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub user_id: String,
    pub customer_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale.
/// Captures the price at the time of sale; later price changes do not
/// touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Position in the submitted cart, starting at 0.
    pub line_no: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub subtotal_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A line item with its product attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItemDetail {
    #[serde(flatten)]
    pub item: SaleItem,
    pub product: ProductSummary,
}

/// A sale with everything the dashboard shows on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItemDetail>,
    pub customer: Option<Customer>,
    pub user: UserSummary,
}

// =============================================================================
// Inventory Log
// =============================================================================

/// One stock movement. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryLog {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    /// Signed: negative for sales, positive for restocks.
    pub change_qty: i64,
    pub reason: InventoryReason,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Pagination
// =============================================================================

/// Page request, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Builds a page request, clamping page to >= 1 and limit to 1..=100.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Rows to skip.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

/// Pagination metadata returned with list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let limit = request.limit as i64;
        Pagination {
            total,
            page: request.page,
            limit: request.limit,
            pages: (total + limit - 1) / limit,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, reorder: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".into(),
            sku: "KB-01".into(),
            barcode: None,
            name: "Keyboard".into(),
            category: Some("Peripherals".into()),
            price_cents: 4999,
            cost_cents: 3000,
            stock_qty: stock,
            reorder_level: reorder,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::EWallet).unwrap(), "\"E_WALLET\"");
        assert_eq!("CARD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("BITCOIN".parse::<PaymentMethod>().is_err());
        assert_eq!(PaymentMethod::Cash.as_str(), "CASH");
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_manage_inventory());
        assert!(Role::InventoryManager.can_manage_inventory());
        assert!(!Role::Cashier.can_manage_inventory());
        assert_eq!(
            serde_json::to_string(&Role::InventoryManager).unwrap(),
            "\"INVENTORY_MANAGER\""
        );
        assert_eq!(Role::InventoryManager.as_str(), "INVENTORY_MANAGER");
    }

    #[test]
    fn test_product_stock_helpers() {
        let p = product(5, 10);
        assert!(p.is_low_stock());
        assert!(p.can_sell(5));
        assert!(!p.can_sell(6));
        assert_eq!(p.stock_value().cents(), 15000);

        let mut inactive = product(50, 10);
        inactive.is_active = false;
        assert!(!inactive.can_sell(1));
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 100);

        let req = PageRequest::new(Some(3), Some(10));
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_pagination_pages() {
        let req = PageRequest::new(Some(1), Some(10));
        assert_eq!(Pagination::new(req, 0).pages, 0);
        assert_eq!(Pagination::new(req, 10).pages, 1);
        assert_eq!(Pagination::new(req, 11).pages, 2);
    }
}
