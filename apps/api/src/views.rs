//! JSON shapes returned by the handlers.
//!
//! Domain types keep money in cents; these views carry decimal amounts
//! (`"131.95"`) the way the dashboards expect.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tillpoint_core::money::as_decimal;
use tillpoint_core::{
    Customer, Money, PaymentMethod, Product, ProductSummary, SaleDetail, SaleItemDetail,
    UserSummary,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub category: Option<String>,
    #[serde(with = "as_decimal")]
    pub price: Money,
    #[serde(with = "as_decimal")]
    pub cost_price: Money,
    pub stock_qty: i64,
    pub reorder_level: i64,
    pub is_active: bool,
    pub is_low_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        ProductView {
            price: p.price(),
            cost_price: p.cost(),
            is_low_stock: p.is_low_stock(),
            id: p.id,
            sku: p.sku,
            barcode: p.barcode,
            name: p.name,
            category: p.category,
            stock_qty: p.stock_qty,
            reorder_level: p.reorder_level,
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

pub fn products(list: Vec<Product>) -> Vec<ProductView> {
    list.into_iter().map(ProductView::from).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemView {
    pub id: String,
    pub product_id: String,
    pub line_no: i64,
    pub quantity: i64,
    #[serde(with = "as_decimal")]
    pub unit_price: Money,
    #[serde(with = "as_decimal")]
    pub subtotal: Money,
    pub product: ProductSummary,
}

impl From<SaleItemDetail> for SaleItemView {
    fn from(detail: SaleItemDetail) -> Self {
        let item = detail.item;
        SaleItemView {
            unit_price: Money::from_cents(item.unit_price_cents),
            subtotal: item.subtotal(),
            id: item.id,
            product_id: item.product_id,
            line_no: item.line_no,
            quantity: item.quantity,
            product: detail.product,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleView {
    pub id: String,
    pub receipt_number: String,
    #[serde(with = "as_decimal")]
    pub subtotal: Money,
    #[serde(with = "as_decimal")]
    pub discount: Money,
    #[serde(with = "as_decimal")]
    pub tax: Money,
    #[serde(with = "as_decimal")]
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub user_id: String,
    pub customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItemView>,
    pub customer: Option<Customer>,
    pub user: UserSummary,
}

impl From<SaleDetail> for SaleView {
    fn from(detail: SaleDetail) -> Self {
        let sale = detail.sale;
        SaleView {
            subtotal: Money::from_cents(sale.subtotal_cents),
            discount: Money::from_cents(sale.discount_cents),
            tax: Money::from_cents(sale.tax_cents),
            total_amount: sale.total(),
            id: sale.id,
            receipt_number: sale.receipt_number,
            payment_method: sale.payment_method,
            user_id: sale.user_id,
            customer_id: sale.customer_id,
            created_at: sale.created_at,
            items: detail.items.into_iter().map(SaleItemView::from).collect(),
            customer: detail.customer,
            user: detail.user,
        }
    }
}

pub fn sales(list: Vec<SaleDetail>) -> Vec<SaleView> {
    list.into_iter().map(SaleView::from).collect()
}

/// A customer with its purchase history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetailView {
    #[serde(flatten)]
    pub customer: Customer,
    pub sale_count: i64,
    pub recent_sales: Vec<SaleView>,
}
