//! # Reports
//!
//! Reductions over rows that were already loaded by a store or
//! repository. Nothing here queries anything.
//!
//! ```text
//! Vec<SaleDetail> ──► daily_summary()   ──► DailySummary
//!                 └─► sales_summary()   ──► SalesSummary
//! Vec<Product>    ──► inventory_summary() ─► InventorySummary
//! (today, yesterday revenue) ─► revenue_change_percent()
//! ```
//!
//! Map-shaped results use `BTreeMap` so JSON output is stable.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::money::{as_decimal, Money};
use crate::types::{Product, SaleDetail};

/// Category label for products without one.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// How many products the sales report ranks.
pub const TOP_PRODUCTS_LIMIT: usize = 10;

// =============================================================================
// Daily
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub total_sales: usize,
    #[serde(with = "as_decimal")]
    pub total_revenue: Money,
    /// Sale count per payment method.
    pub payment_methods: BTreeMap<String, i64>,
    /// Units sold per product name.
    pub top_products: BTreeMap<String, i64>,
}

pub fn daily_summary(sales: &[SaleDetail]) -> DailySummary {
    let mut payment_methods = BTreeMap::new();
    let mut top_products = BTreeMap::new();

    for sale in sales {
        *payment_methods
            .entry(sale.sale.payment_method.as_str().to_string())
            .or_insert(0) += 1;
        for line in &sale.items {
            *top_products.entry(line.product.name.clone()).or_insert(0) += line.item.quantity;
        }
    }

    DailySummary {
        total_sales: sales.len(),
        total_revenue: sales.iter().map(|s| s.sale.total()).sum(),
        payment_methods,
        top_products,
    }
}

// =============================================================================
// Sales report
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountAndAmount {
    pub count: i64,
    #[serde(with = "as_decimal")]
    pub amount: Money,
}

/// Units sold and line revenue for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountAndRevenue {
    pub count: i64,
    #[serde(with = "as_decimal")]
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub name: String,
    pub quantity: i64,
    #[serde(with = "as_decimal")]
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_sales: usize,
    #[serde(with = "as_decimal")]
    pub total_revenue: Money,
    #[serde(with = "as_decimal")]
    pub total_discount: Money,
    #[serde(with = "as_decimal")]
    pub total_tax: Money,
    /// Revenue / sale count, rounded half away from zero to the cent.
    #[serde(with = "as_decimal")]
    pub average_order_value: Money,
    pub payment_method_breakdown: BTreeMap<String, CountAndAmount>,
    pub category_breakdown: BTreeMap<String, CountAndRevenue>,
    pub top_products: Vec<TopProduct>,
    /// Keyed by `YYYY-MM-DD` (UTC).
    pub sales_by_day: BTreeMap<String, CountAndAmount>,
}

pub fn sales_summary(sales: &[SaleDetail]) -> SalesSummary {
    let total_revenue: Money = sales.iter().map(|s| s.sale.total()).sum();
    let mut payment_method_breakdown: BTreeMap<String, CountAndAmount> = BTreeMap::new();
    let mut category_breakdown: BTreeMap<String, CountAndRevenue> = BTreeMap::new();
    let mut sales_by_day: BTreeMap<String, CountAndAmount> = BTreeMap::new();
    let mut products: HashMap<String, (i64, Money)> = HashMap::new();

    for sale in sales {
        let method = payment_method_breakdown
            .entry(sale.sale.payment_method.as_str().to_string())
            .or_default();
        method.count += 1;
        method.amount += sale.sale.total();

        let day = sales_by_day
            .entry(sale.sale.created_at.format("%Y-%m-%d").to_string())
            .or_default();
        day.count += 1;
        day.amount += sale.sale.total();

        for line in &sale.items {
            let category = line
                .product
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            let entry = category_breakdown.entry(category).or_default();
            entry.count += line.item.quantity;
            entry.revenue += line.item.subtotal();

            let product = products
                .entry(line.product.name.clone())
                .or_insert((0, Money::zero()));
            product.0 += line.item.quantity;
            product.1 += line.item.subtotal();
        }
    }

    let mut top_products: Vec<TopProduct> = products
        .into_iter()
        .map(|(name, (quantity, revenue))| TopProduct {
            name,
            quantity,
            revenue,
        })
        .collect();
    // Name as tiebreaker keeps the ranking deterministic.
    top_products.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    top_products.truncate(TOP_PRODUCTS_LIMIT);

    SalesSummary {
        total_sales: sales.len(),
        total_revenue,
        total_discount: sales.iter().map(|s| Money::from_cents(s.sale.discount_cents)).sum(),
        total_tax: sales.iter().map(|s| Money::from_cents(s.sale.tax_cents)).sum(),
        average_order_value: average(total_revenue, sales.len()),
        payment_method_breakdown,
        category_breakdown,
        top_products,
        sales_by_day,
    }
}

fn average(total: Money, count: usize) -> Money {
    if count == 0 {
        return Money::zero();
    }
    let avg = (Decimal::from(total.cents()) / Decimal::from(count as i64))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    Money::from_cents(avg.to_i64().unwrap_or_default())
}

// =============================================================================
// Inventory report
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStock {
    pub count: i64,
    #[serde(with = "as_decimal")]
    pub value: Money,
    pub low_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_products: usize,
    /// Stock on hand valued at cost.
    #[serde(with = "as_decimal")]
    pub total_value: Money,
    pub low_stock_count: usize,
    pub categories: BTreeMap<String, CategoryStock>,
}

pub fn inventory_summary(products: &[Product]) -> InventorySummary {
    let mut categories: BTreeMap<String, CategoryStock> = BTreeMap::new();
    for product in products {
        let entry = categories
            .entry(
                product
                    .category
                    .clone()
                    .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            )
            .or_default();
        entry.count += 1;
        entry.value += product.stock_value();
        if product.is_low_stock() {
            entry.low_stock += 1;
        }
    }

    InventorySummary {
        total_products: products.len(),
        total_value: products.iter().map(Product::stock_value).sum(),
        low_stock_count: products.iter().filter(|p| p.is_low_stock()).count(),
        categories,
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Percent change from `yesterday` to `today`, two decimal places.
/// Zero when yesterday had no revenue.
///
/// ```rust
/// use tillpoint_core::money::Money;
/// use tillpoint_core::report::revenue_change_percent;
///
/// let change = revenue_change_percent(Money::from_cents(15000), Money::from_cents(10000));
/// assert_eq!(change.to_string(), "50.00");
/// ```
pub fn revenue_change_percent(today: Money, yesterday: Money) -> Decimal {
    if !yesterday.is_positive() {
        return Decimal::ZERO;
    }
    let mut change = (Decimal::from(today.cents()) - Decimal::from(yesterday.cents()))
        * Decimal::ONE_HUNDRED
        / Decimal::from(yesterday.cents());
    change = change.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    change.rescale(2);
    change
}

/// UTC `[start, end)` bounds of a calendar day.
pub fn day_bounds(day: NaiveDate) -> (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>) {
    let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + chrono::Duration::days(1))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        PaymentMethod, ProductSummary, Sale, SaleItem, SaleItemDetail, UserSummary,
    };
    use chrono::{TimeZone, Utc};

    fn line(name: &str, category: Option<&str>, qty: i64, price: i64) -> SaleItemDetail {
        SaleItemDetail {
            item: SaleItem {
                id: format!("li-{name}"),
                sale_id: "s".into(),
                product_id: format!("p-{name}"),
                line_no: 0,
                quantity: qty,
                unit_price_cents: price,
                subtotal_cents: price * qty,
            },
            product: ProductSummary {
                id: format!("p-{name}"),
                sku: format!("SKU-{name}"),
                name: name.into(),
                category: category.map(str::to_string),
            },
        }
    }

    fn sale(
        day: u32,
        method: PaymentMethod,
        discount: i64,
        tax: i64,
        items: Vec<SaleItemDetail>,
    ) -> SaleDetail {
        let subtotal: i64 = items.iter().map(|i| i.item.subtotal_cents).sum();
        SaleDetail {
            sale: Sale {
                id: format!("s-{day}-{subtotal}"),
                receipt_number: format!("RCP-{day}-{subtotal}"),
                subtotal_cents: subtotal,
                discount_cents: discount,
                tax_cents: tax,
                total_cents: subtotal - discount + tax,
                payment_method: method,
                user_id: "u".into(),
                customer_id: None,
                created_at: Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap(),
            },
            items,
            customer: None,
            user: UserSummary {
                name: "Cashier".into(),
                email: "cashier@pos.com".into(),
            },
        }
    }

    fn fixture() -> Vec<SaleDetail> {
        vec![
            sale(
                1,
                PaymentMethod::Cash,
                500,
                1098,
                vec![
                    line("Headphones", Some("Electronics"), 1, 9999),
                    line("Mug", Some("Kitchen"), 2, 1299),
                ],
            ),
            sale(
                2,
                PaymentMethod::Card,
                0,
                0,
                vec![line("Mug", Some("Kitchen"), 3, 1299), line("Pen", None, 1, 100)],
            ),
        ]
    }

    #[test]
    fn test_daily_summary() {
        let summary = daily_summary(&fixture());
        assert_eq!(summary.total_sales, 2);
        assert_eq!(summary.total_revenue.cents(), 13195 + 3997);
        assert_eq!(summary.payment_methods["CASH"], 1);
        assert_eq!(summary.payment_methods["CARD"], 1);
        assert_eq!(summary.top_products["Mug"], 5);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totalRevenue"], "171.92");
    }

    #[test]
    fn test_daily_summary_empty() {
        let summary = daily_summary(&[]);
        assert_eq!(summary.total_sales, 0);
        assert!(summary.total_revenue.is_zero());
    }

    #[test]
    fn test_sales_summary() {
        let summary = sales_summary(&fixture());
        assert_eq!(summary.total_discount.cents(), 500);
        assert_eq!(summary.total_tax.cents(), 1098);
        assert_eq!(summary.average_order_value.cents(), 8596);
        assert_eq!(summary.payment_method_breakdown["CARD"].amount.cents(), 3997);
        assert_eq!(summary.category_breakdown["Kitchen"].count, 5);
        assert_eq!(summary.category_breakdown[UNCATEGORIZED].revenue.cents(), 100);
        assert_eq!(summary.top_products[0].name, "Mug");
        assert_eq!(summary.top_products[0].quantity, 5);
        assert_eq!(summary.sales_by_day["2024-06-02"].count, 1);

        let json = serde_json::to_value(&summary).unwrap();
        let other = &json["categoryBreakdown"][UNCATEGORIZED];
        assert_eq!(other["revenue"], "1.00");
        assert!(other.get("amount").is_none());
        assert!(json["paymentMethodBreakdown"]["CARD"].get("amount").is_some());
    }

    #[test]
    fn test_revenue_change() {
        assert_eq!(
            revenue_change_percent(Money::from_cents(5000), Money::zero()),
            Decimal::ZERO
        );
        assert_eq!(
            revenue_change_percent(Money::from_cents(5000), Money::from_cents(10000)).to_string(),
            "-50.00"
        );
        assert_eq!(
            revenue_change_percent(Money::from_cents(100), Money::from_cents(300)).to_string(),
            "-66.67"
        );
    }

    #[test]
    fn test_inventory_summary() {
        let now = Utc::now();
        let mk = |id: &str, category: Option<&str>, cost: i64, stock: i64| Product {
            id: id.into(),
            sku: id.into(),
            barcode: None,
            name: id.into(),
            category: category.map(str::to_string),
            price_cents: cost * 2,
            cost_cents: cost,
            stock_qty: stock,
            reorder_level: 10,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let summary = inventory_summary(&[
            mk("a", Some("Kitchen"), 500, 20),
            mk("b", Some("Kitchen"), 100, 5),
            mk("c", None, 1000, 0),
        ]);

        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.total_value.cents(), 10000 + 500);
        assert_eq!(summary.low_stock_count, 2);
        assert_eq!(summary.categories["Kitchen"].low_stock, 1);
        assert_eq!(summary.categories[UNCATEGORIZED].count, 1);
    }

    #[test]
    fn test_day_bounds() {
        let (start, end) = day_bounds(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap());
    }
}
