//! `/api/products`: catalog listing and management.

use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tillpoint_core::validation::{
    validate_barcode, validate_name, validate_non_negative, validate_search_query, validate_sku,
};
use tillpoint_core::{PageRequest, Pagination};
use tillpoint_db::{NewProduct, ProductChanges, ProductFilter};
use tracing::info;

use crate::auth::{require_inventory_role, CurrentActor};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::{non_blank, non_negative_money};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::views::{self, ProductView};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductBody {
    pub sku: Option<String>,
    pub barcode: Option<String>,
    #[serde(default)]
    pub name: String,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub stock_qty: Option<i64>,
    pub reorder_level: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductBody {
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub stock_qty: Option<i64>,
    pub reorder_level: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<ProductView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ProductData {
    pub product: ProductView,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize)]
pub struct CategoryList {
    pub categories: Vec<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _actor: CurrentActor,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<ApiResponse<ProductPage>> {
    let search = match non_blank(query.search) {
        Some(term) => Some(validate_search_query(&term)?),
        None => None,
    };
    let filter = ProductFilter {
        search,
        category: non_blank(query.category),
        low_stock: query.low_stock,
    };
    let page = PageRequest::new(query.page, query.limit);

    let (products, total) = state.db.products().list(&filter, page).await?;
    Ok(ApiResponse::ok(ProductPage {
        products: views::products(products),
        pagination: Pagination::new(page, total),
    }))
}

pub async fn get(
    State(state): State<AppState>,
    _actor: CurrentActor,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<ProductData>> {
    let product = state
        .db
        .products()
        .get_active(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(ApiResponse::ok(ProductData {
        product: product.into(),
    }))
}

pub async fn categories(
    State(state): State<AppState>,
    _actor: CurrentActor,
) -> ApiResult<ApiResponse<CategoryList>> {
    let categories = state.db.products().categories().await?;
    Ok(ApiResponse::ok(CategoryList { categories }))
}

pub async fn low_stock(
    State(state): State<AppState>,
    _actor: CurrentActor,
) -> ApiResult<ApiResponse<ProductList>> {
    let products = state.db.products().low_stock().await?;
    Ok(ApiResponse::ok(ProductList {
        products: views::products(products),
    }))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(body): ApiJson<CreateProductBody>,
) -> ApiResult<ApiResponse<ProductData>> {
    require_inventory_role(&actor)?;

    let name = body.name.trim().to_string();
    validate_name("name", &name)?;
    let sku = non_blank(body.sku);
    if let Some(sku) = &sku {
        validate_sku(sku)?;
    }
    let barcode = non_blank(body.barcode);
    if let Some(barcode) = &barcode {
        validate_barcode(barcode)?;
    }
    let price = body
        .price
        .ok_or_else(|| ApiError::invalid("price is required"))?;
    let price = non_negative_money("price", price)?;
    let cost = non_negative_money("costPrice", body.cost_price.unwrap_or_default())?;
    let stock_qty = body.stock_qty.unwrap_or(0);
    validate_non_negative("stockQty", stock_qty)?;
    if let Some(level) = body.reorder_level {
        validate_non_negative("reorderLevel", level)?;
    }

    let product = state
        .db
        .products()
        .create(
            NewProduct {
                sku,
                barcode,
                name,
                category: non_blank(body.category),
                price_cents: price.cents(),
                cost_cents: cost.cents(),
                stock_qty,
                reorder_level: body.reorder_level,
            },
            &actor.user_id,
        )
        .await?;

    info!(product_id = %product.id, sku = %product.sku, user_id = %actor.user_id, "Product created");
    Ok(ApiResponse::created(
        "Product created successfully",
        ProductData {
            product: product.into(),
        },
    ))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<UpdateProductBody>,
) -> ApiResult<ApiResponse<ProductData>> {
    require_inventory_role(&actor)?;

    let mut changes = ProductChanges::default();
    if let Some(sku) = body.sku {
        let sku = sku.trim().to_string();
        validate_sku(&sku)?;
        changes.sku = Some(sku);
    }
    if let Some(barcode) = non_blank(body.barcode) {
        validate_barcode(&barcode)?;
        changes.barcode = Some(barcode);
    }
    if let Some(name) = body.name {
        let name = name.trim().to_string();
        validate_name("name", &name)?;
        changes.name = Some(name);
    }
    changes.category = non_blank(body.category);
    if let Some(price) = body.price {
        changes.price_cents = Some(non_negative_money("price", price)?.cents());
    }
    if let Some(cost) = body.cost_price {
        changes.cost_cents = Some(non_negative_money("costPrice", cost)?.cents());
    }
    if let Some(stock) = body.stock_qty {
        validate_non_negative("stockQty", stock)?;
        changes.stock_qty = Some(stock);
    }
    if let Some(level) = body.reorder_level {
        validate_non_negative("reorderLevel", level)?;
        changes.reorder_level = Some(level);
    }

    let product = state
        .db
        .products()
        .update(&id, changes, &actor.user_id)
        .await?;

    info!(product_id = %product.id, user_id = %actor.user_id, "Product updated");
    Ok(ApiResponse::ok(ProductData {
        product: product.into(),
    })
    .with_message("Product updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<()>> {
    require_inventory_role(&actor)?;
    state.db.products().soft_delete(&id).await?;

    info!(product_id = %id, user_id = %actor.user_id, "Product deleted");
    Ok(ApiResponse::message("Product deleted successfully"))
}
