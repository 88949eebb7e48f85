//! `/api/customers`

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tillpoint_core::validation::{validate_email, validate_name, validate_search_query};
use tillpoint_core::{Customer, PageRequest, Pagination};
use tillpoint_db::{CustomerFields, CustomerWithSales};
use tracing::info;

use crate::auth::CurrentActor;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::non_blank;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::views::{self, CustomerDetailView};

/// Sales shown on a customer's detail page.
const RECENT_SALES: u32 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerBody {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CustomerBody {
    /// Trims every field and checks the ones that are present.
    fn into_fields(self) -> Result<CustomerFields, ApiError> {
        let fields = CustomerFields {
            name: non_blank(self.name),
            phone: non_blank(self.phone),
            email: non_blank(self.email),
            address: non_blank(self.address),
        };
        if let Some(name) = &fields.name {
            validate_name("name", name)?;
        }
        if let Some(email) = &fields.email {
            validate_email(email)?;
        }
        Ok(fields)
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerPage {
    pub customers: Vec<CustomerWithSales>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct CustomerData<T> {
    pub customer: T,
}

pub async fn list(
    State(state): State<AppState>,
    _actor: CurrentActor,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<ApiResponse<CustomerPage>> {
    let search = match non_blank(query.search) {
        Some(term) => Some(validate_search_query(&term)?),
        None => None,
    };
    let page = PageRequest::new(query.page, query.limit);

    let (customers, total) = state.db.customers().list(search.as_deref(), page).await?;
    Ok(ApiResponse::ok(CustomerPage {
        customers,
        pagination: Pagination::new(page, total),
    }))
}

pub async fn get(
    State(state): State<AppState>,
    _actor: CurrentActor,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<CustomerData<CustomerDetailView>>> {
    let customers = state.db.customers();
    let customer = customers
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;
    let sale_count = customers.sale_count(&id).await?;
    let recent_sales = state.db.sales().for_customer(&id, RECENT_SALES).await?;

    Ok(ApiResponse::ok(CustomerData {
        customer: CustomerDetailView {
            customer,
            sale_count,
            recent_sales: views::sales(recent_sales),
        },
    }))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(body): ApiJson<CustomerBody>,
) -> ApiResult<ApiResponse<CustomerData<Customer>>> {
    let fields = body.into_fields()?;
    if fields.name.is_none() {
        return Err(ApiError::invalid("name is required"));
    }

    let customer = state.db.customers().create(fields).await?;
    info!(customer_id = %customer.id, user_id = %actor.user_id, "Customer created");
    Ok(ApiResponse::created(
        "Customer created successfully",
        CustomerData { customer },
    ))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<CustomerBody>,
) -> ApiResult<ApiResponse<CustomerData<Customer>>> {
    let fields = body.into_fields()?;
    let customer = state.db.customers().update(&id, fields).await?;

    info!(customer_id = %customer.id, user_id = %actor.user_id, "Customer updated");
    Ok(ApiResponse::ok(CustomerData { customer }).with_message("Customer updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<()>> {
    state.db.customers().delete(&id).await?;

    info!(customer_id = %id, user_id = %actor.user_id, "Customer deleted");
    Ok(ApiResponse::message("Customer deleted successfully"))
}
