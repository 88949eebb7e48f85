//! `/api/sales`: completing sales and reading them back.

use axum::extract::State;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tillpoint_core::report::DailySummary;
use tillpoint_core::sale::{SaleLineRequest, SaleRequest};
use tillpoint_core::store::SaleFilter;
use tillpoint_core::{Money, PageRequest, Pagination, PaymentMethod, ValidationError};
use tracing::{error, info};

use crate::auth::CurrentActor;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::{non_blank, non_negative_money, parse_date_bound};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::views::{self, SaleView};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineBody {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleBody {
    pub customer_id: Option<String>,
    #[serde(default)]
    pub items: Vec<SaleLineBody>,
    pub payment_method: Option<String>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
}

impl CreateSaleBody {
    fn into_request(self) -> Result<SaleRequest, ValidationError> {
        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse::<PaymentMethod>()?,
            _ => {
                return Err(ValidationError::Required {
                    field: "paymentMethod".to_string(),
                })
            }
        };
        let discount = match self.discount {
            Some(amount) => non_negative_money("discount", amount)?,
            None => Money::zero(),
        };
        let tax = match self.tax {
            Some(amount) => non_negative_money("tax", amount)?,
            None => Money::zero(),
        };

        Ok(SaleRequest {
            customer_id: non_blank(self.customer_id),
            items: self
                .items
                .into_iter()
                .map(|line| SaleLineRequest {
                    product_id: line.product_id.trim().to_string(),
                    quantity: line.quantity,
                })
                .collect(),
            payment_method,
            discount,
            tax,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub payment_method: Option<String>,
    pub user_id: Option<String>,
}

impl ListQuery {
    pub(crate) fn filter(&self) -> Result<SaleFilter, ValidationError> {
        let start = match self.start_date.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(parse_date_bound("startDate", raw, false)?),
            None => None,
        };
        let end = match self.end_date.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(parse_date_bound("endDate", raw, true)?),
            None => None,
        };
        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(raw.parse::<PaymentMethod>()?),
            _ => None,
        };
        Ok(SaleFilter {
            start,
            end,
            payment_method,
            user_id: non_blank(self.user_id.clone()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaleData {
    pub sale: SaleView,
}

#[derive(Debug, Serialize)]
pub struct SalePage {
    pub sales: Vec<SaleView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct DailySales {
    pub sales: Vec<SaleView>,
    pub summary: DailySummary,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(body): ApiJson<CreateSaleBody>,
) -> ApiResult<ApiResponse<SaleData>> {
    let request = body.into_request()?;

    let sale = match tokio::time::timeout(state.sale_timeout, state.engine.create_sale(&actor, request))
        .await
    {
        Ok(result) => result?,
        Err(_) => {
            error!(user_id = %actor.user_id, timeout = ?state.sale_timeout, "Sale timed out");
            return Err(ApiError::internal("sale transaction timed out"));
        }
    };

    info!(
        sale_id = %sale.sale.id,
        receipt = %sale.sale.receipt_number,
        total_cents = sale.sale.total_cents,
        user_id = %actor.user_id,
        "Sale completed"
    );
    Ok(ApiResponse::created(
        "Sale completed successfully",
        SaleData { sale: sale.into() },
    ))
}

pub async fn list(
    State(state): State<AppState>,
    _actor: CurrentActor,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<ApiResponse<SalePage>> {
    let filter = query.filter()?;
    let page = PageRequest::new(query.page, query.limit);

    let (sales, pagination) = state.engine.get_sales(&filter, page).await?;
    Ok(ApiResponse::ok(SalePage {
        sales: views::sales(sales),
        pagination,
    }))
}

pub async fn daily(
    State(state): State<AppState>,
    _actor: CurrentActor,
    ApiQuery(query): ApiQuery<DailyQuery>,
) -> ApiResult<ApiResponse<DailySales>> {
    let day = match non_blank(query.date) {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            ValidationError::InvalidFormat {
                field: "date".to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            }
        })?,
        None => Utc::now().date_naive(),
    };

    let (sales, summary) = state.engine.get_daily_sales(day).await?;
    Ok(ApiResponse::ok(DailySales {
        sales: views::sales(sales),
        summary,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    _actor: CurrentActor,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<SaleData>> {
    let sale = state.engine.get_sale(&id).await?;
    Ok(ApiResponse::ok(SaleData { sale: sale.into() }))
}
