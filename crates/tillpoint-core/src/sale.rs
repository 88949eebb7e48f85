//! # Sale Module
//!
//! Sale requests, line pricing, totals and receipt numbers.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Sale Pipeline                                  │
//! │                                                                         │
//! │  SaleRequest ──validate()──► quantities_by_product()                    │
//! │       │                              │                                  │
//! │       │                              ▼  (stock pre-check in engine)     │
//! │       ▼                                                                 │
//! │  price_lines(products) ──► SaleTotals::compute(lines, discount, tax)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleDraft { receipt_number, lines, totals } ──► SaleStore::commit_sale │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure. Prices always come from the products handed
//! in by the store, never from the request.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, Product};
use crate::validation::{validate_non_negative, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Request
// =============================================================================

/// One requested line: which product and how many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// A validated-at-the-boundary request to complete a sale.
///
/// Amounts are already in cents; the API converts the decimal JSON
/// fields before building this.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRequest {
    pub customer_id: Option<String>,
    pub items: Vec<SaleLineRequest>,
    pub payment_method: PaymentMethod,
    pub discount: Money,
    pub tax: Money,
}

impl SaleRequest {
    /// Checks the request shape before anything touches the store.
    ///
    /// ## Rules
    /// - At least one line, at most [`MAX_CART_ITEMS`]
    /// - Every quantity in `1..=MAX_ITEM_QUANTITY`
    /// - Discount and tax non-negative
    pub fn validate(&self) -> CoreResult<()> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        if self.items.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        for line in &self.items {
            if line.product_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "productId".to_string(),
                }
                .into());
            }
            if line.quantity > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: line.quantity,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            validate_quantity(line.quantity)?;
        }

        validate_non_negative("discount", self.discount.cents())?;
        validate_non_negative("tax", self.tax.cents())?;

        Ok(())
    }

    /// Distinct product ids in first-seen order.
    pub fn product_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.items.len());
        for line in &self.items {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id.clone());
            }
        }
        ids
    }

    /// Total requested quantity per product.
    ///
    /// The same product may appear on several lines; stock has to cover
    /// the sum, not each line alone.
    pub fn quantities_by_product(&self) -> HashMap<&str, i64> {
        let mut totals: HashMap<&str, i64> = HashMap::new();
        for line in &self.items {
            *totals.entry(line.product_id.as_str()).or_insert(0) += line.quantity;
        }
        totals
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// A priced line, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftLine {
    pub id: String,
    pub line_no: i64,
    pub product_id: String,
    /// Carried for error messages raised at commit time.
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Prices every requested line from the store's products, in request
/// order.
///
/// Returns `ProductNotFound` for an id missing from `products`.
pub fn price_lines(
    request: &SaleRequest,
    products: &HashMap<String, Product>,
) -> CoreResult<Vec<DraftLine>> {
    request
        .items
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            let unit_price = product.price();
            let subtotal = unit_price
                .checked_multiply_quantity(line.quantity)
                .ok_or(CoreError::AmountOutOfRange)?;
            Ok(DraftLine {
                id: uuid::Uuid::new_v4().to_string(),
                line_no: idx as i64,
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                quantity: line.quantity,
                unit_price,
                subtotal,
            })
        })
        .collect()
}

/// Sale-level amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl SaleTotals {
    /// `total = Σ line subtotals − discount + tax`, unclamped.
    ///
    /// Fails with [`CoreError::AmountOutOfRange`] if any step overflows.
    ///
    /// ```rust
    /// use tillpoint_core::money::Money;
    /// use tillpoint_core::sale::SaleTotals;
    ///
    /// let t = SaleTotals::compute(
    ///     [Money::from_cents(9999), Money::from_cents(2598)],
    ///     Money::from_cents(500),
    ///     Money::from_cents(1098),
    /// )
    /// .unwrap();
    /// assert_eq!(t.subtotal.cents(), 12597);
    /// assert_eq!(t.total.cents(), 13195);
    /// ```
    pub fn compute(
        line_subtotals: impl IntoIterator<Item = Money>,
        discount: Money,
        tax: Money,
    ) -> CoreResult<Self> {
        let subtotal = line_subtotals
            .into_iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line))
            .ok_or(CoreError::AmountOutOfRange)?;
        let total = subtotal
            .checked_sub(discount)
            .and_then(|t| t.checked_add(tax))
            .ok_or(CoreError::AmountOutOfRange)?;
        Ok(SaleTotals {
            subtotal,
            discount,
            tax,
            total,
        })
    }
}

// =============================================================================
// Receipt Numbers
// =============================================================================

const RECEIPT_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RECEIPT_SUFFIX_LEN: usize = 5;

/// Builds `RCP-<unix millis>-<5 uppercase base36 chars>`.
///
/// Uniqueness is not guaranteed here; the store's UNIQUE constraint
/// catches collisions and the engine regenerates.
pub fn generate_receipt_number<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: String = (0..RECEIPT_SUFFIX_LEN)
        .map(|_| RECEIPT_ALPHABET[rng.gen_range(0..RECEIPT_ALPHABET.len())] as char)
        .collect();
    format!("RCP-{}-{}", now.timestamp_millis(), suffix)
}

// =============================================================================
// Draft
// =============================================================================

/// Everything the store needs to commit a sale in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub sale_id: String,
    pub receipt_number: String,
    pub user_id: String,
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<DraftLine>,
    pub totals: SaleTotals,
    pub created_at: DateTime<Utc>,
}

impl SaleDraft {
    /// Note written on every SALE inventory log of this sale.
    pub fn inventory_note(&self) -> String {
        format!("Sale {}", self.receipt_number)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn product(id: &str, name: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.into(),
            sku: format!("SKU-{id}"),
            barcode: None,
            name: name.into(),
            category: None,
            price_cents,
            cost_cents: 0,
            stock_qty: stock,
            reorder_level: 10,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(items: &[(&str, i64)]) -> SaleRequest {
        SaleRequest {
            customer_id: None,
            items: items
                .iter()
                .map(|(id, qty)| SaleLineRequest {
                    product_id: id.to_string(),
                    quantity: *qty,
                })
                .collect(),
            payment_method: PaymentMethod::Cash,
            discount: Money::zero(),
            tax: Money::zero(),
        }
    }

    #[test]
    fn test_validate_rejects_bad_requests() {
        assert!(matches!(request(&[]).validate(), Err(CoreError::EmptyCart)));
        assert!(matches!(
            request(&[("p1", 0)]).validate(),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            request(&[("p1", 1000)]).validate(),
            Err(CoreError::QuantityTooLarge { requested: 1000, .. })
        ));

        let many: Vec<(&str, i64)> = (0..101).map(|_| ("p1", 1)).collect();
        assert!(matches!(
            request(&many).validate(),
            Err(CoreError::CartTooLarge { max: 100 })
        ));

        let mut negative = request(&[("p1", 1)]);
        negative.discount = Money::from_cents(-1);
        assert!(matches!(negative.validate(), Err(CoreError::Validation(_))));

        assert!(request(&[("p1", 1), ("p2", 999)]).validate().is_ok());
    }

    #[test]
    fn test_quantities_aggregate_per_product() {
        let req = request(&[("p1", 2), ("p2", 1), ("p1", 3)]);
        let totals = req.quantities_by_product();
        assert_eq!(totals["p1"], 5);
        assert_eq!(totals["p2"], 1);
        assert_eq!(req.product_ids(), vec!["p1".to_string(), "p2".to_string()]);
    }

    #[test]
    fn test_price_lines_keeps_request_order() {
        let products: HashMap<String, Product> = [
            product("p1", "Keyboard", 9999, 50),
            product("p2", "Mouse", 1299, 100),
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

        let lines = price_lines(&request(&[("p2", 2), ("p1", 1)]), &products).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, "p2");
        assert_eq!(lines[0].line_no, 0);
        assert_eq!(lines[0].subtotal.cents(), 2598);
        assert_eq!(lines[1].product_id, "p1");
        assert_eq!(lines[1].unit_price.cents(), 9999);

        let missing = price_lines(&request(&[("nope", 1)]), &products);
        assert!(matches!(missing, Err(CoreError::ProductNotFound(id)) if id == "nope"));
    }

    #[test]
    fn test_price_lines_reject_line_overflow() {
        let products: HashMap<String, Product> = [product("p1", "Yacht", i64::MAX / 2, 5)]
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let priced = price_lines(&request(&[("p1", 3)]), &products);
        assert!(matches!(priced, Err(CoreError::AmountOutOfRange)));
    }

    #[test]
    fn test_totals_allow_negative() {
        let t = SaleTotals::compute(
            [Money::from_cents(1000)],
            Money::from_cents(1500),
            Money::zero(),
        )
        .unwrap();
        assert_eq!(t.total.cents(), -500);
    }

    #[test]
    fn test_totals_reject_overflow() {
        let huge = Money::from_cents(i64::MAX - 10);
        let summed = SaleTotals::compute([huge, huge], Money::zero(), Money::zero());
        assert!(matches!(summed, Err(CoreError::AmountOutOfRange)));

        let taxed = SaleTotals::compute([huge], Money::zero(), Money::from_cents(100));
        assert!(matches!(taxed, Err(CoreError::AmountOutOfRange)));

        let discounted = SaleTotals::compute(
            [Money::from_cents(i64::MIN + 10)],
            Money::from_cents(100),
            Money::zero(),
        );
        assert!(matches!(discounted, Err(CoreError::AmountOutOfRange)));
    }

    #[test]
    fn test_receipt_number_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();
        let receipt = generate_receipt_number(now, &mut rng);

        let parts: Vec<&str> = receipt.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "RCP");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 5);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
