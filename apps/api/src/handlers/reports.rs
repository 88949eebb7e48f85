//! `/api/reports`: sales, inventory and dashboard reports.
//!
//! Rows are loaded through the repositories and reduced by the pure
//! functions in [`tillpoint_core::report`].

use axum::extract::State;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tillpoint_core::report::{self, InventorySummary, SalesSummary};
use tillpoint_core::store::SaleFilter;
use tillpoint_core::{money::as_decimal, Money, PaymentMethod, ValidationError};

use crate::auth::CurrentActor;
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::handlers::{non_blank, parse_date_bound};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::views::{self, ProductView, SaleView};

/// Default look-back of the sales report.
const DEFAULT_REPORT_DAYS: i64 = 30;
/// Sales attached to the sales report.
const REPORT_SALES_LIMIT: usize = 100;
/// Sales shown on the dashboard.
const DASHBOARD_RECENT_SALES: u32 = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_id: Option<String>,
    pub payment_method: Option<String>,
}

impl SalesReportQuery {
    fn filter(self) -> Result<SaleFilter, ValidationError> {
        let start = match non_blank(self.start_date) {
            Some(raw) => parse_date_bound("startDate", &raw, false)?,
            None => Utc::now() - Duration::days(DEFAULT_REPORT_DAYS),
        };
        let end = match non_blank(self.end_date) {
            Some(raw) => Some(parse_date_bound("endDate", &raw, true)?),
            None => None,
        };
        let payment_method = match non_blank(self.payment_method) {
            Some(raw) => Some(raw.parse::<PaymentMethod>()?),
            None => None,
        };
        Ok(SaleFilter {
            start: Some(start),
            end,
            payment_method,
            user_id: non_blank(self.user_id),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReportQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
}

#[derive(Debug, Serialize)]
pub struct SalesReport {
    pub summary: SalesSummary,
    pub sales: Vec<SaleView>,
}

#[derive(Debug, Serialize)]
pub struct InventoryReport {
    pub summary: InventorySummary,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub todays_sales: usize,
    #[serde(with = "as_decimal")]
    pub todays_revenue: Money,
    /// Percent change of today's revenue over yesterday's.
    pub revenue_change: Decimal,
    pub total_products: i64,
    pub total_customers: i64,
    pub low_stock_products: i64,
    pub recent_sales: Vec<SaleView>,
}

pub async fn sales(
    State(state): State<AppState>,
    _actor: CurrentActor,
    ApiQuery(query): ApiQuery<SalesReportQuery>,
) -> ApiResult<ApiResponse<SalesReport>> {
    let filter = query.filter()?;
    let mut sales = state.db.sales().matching(&filter).await?;
    let summary = report::sales_summary(&sales);
    sales.truncate(REPORT_SALES_LIMIT);

    Ok(ApiResponse::ok(SalesReport {
        summary,
        sales: views::sales(sales),
    }))
}

pub async fn inventory(
    State(state): State<AppState>,
    _actor: CurrentActor,
    ApiQuery(query): ApiQuery<InventoryReportQuery>,
) -> ApiResult<ApiResponse<InventoryReport>> {
    let category = non_blank(query.category);
    let products = state
        .db
        .products()
        .for_inventory_report(category.as_deref(), query.low_stock)
        .await?;
    let summary = report::inventory_summary(&products);

    Ok(ApiResponse::ok(InventoryReport {
        summary,
        products: views::products(products),
    }))
}

pub async fn dashboard(
    State(state): State<AppState>,
    _actor: CurrentActor,
) -> ApiResult<ApiResponse<Dashboard>> {
    let today = Utc::now().date_naive();
    let (today_start, today_end) = report::day_bounds(today);
    let yesterday = SaleFilter {
        start: Some(today_start - Duration::days(1)),
        end: Some(today_start),
        ..Default::default()
    };
    let todays = SaleFilter {
        start: Some(today_start),
        end: Some(today_end),
        ..Default::default()
    };

    let sales = state.db.sales();
    let todays_sales = sales.matching(&todays).await?;
    let yesterdays_sales = sales.matching(&yesterday).await?;
    let todays_revenue: Money = todays_sales.iter().map(|s| s.sale.total()).sum();
    let yesterdays_revenue: Money = yesterdays_sales.iter().map(|s| s.sale.total()).sum();

    let products = state.db.products();
    let dashboard = Dashboard {
        todays_sales: todays_sales.len(),
        todays_revenue,
        revenue_change: report::revenue_change_percent(todays_revenue, yesterdays_revenue),
        total_products: products.count_active().await?,
        total_customers: state.db.customers().count().await?,
        low_stock_products: products.count_low_stock().await?,
        recent_sales: views::sales(sales.recent(DASHBOARD_RECENT_SALES).await?),
    };
    Ok(ApiResponse::ok(dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_report_defaults_to_last_thirty_days() {
        let filter = SalesReportQuery::default().filter().unwrap();
        let start = filter.start.unwrap();
        let age = Utc::now() - start;
        assert!(age >= Duration::days(DEFAULT_REPORT_DAYS));
        assert!(age < Duration::days(DEFAULT_REPORT_DAYS) + Duration::minutes(1));
        assert!(filter.end.is_none());
    }

    #[test]
    fn test_sales_report_rejects_unknown_payment_method() {
        let query = SalesReportQuery {
            payment_method: Some("BARTER".into()),
            ..Default::default()
        };
        assert!(query.filter().is_err());
    }
}
