// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Inventory endpoints: product catalog, restocking and the stock ledger.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::Auth,
    error::{ApiError, Envelope},
    money::{format_minor, parse_decimal_to_minor},
    state::AppState,
    storage::{AuditEventType, StockEntry, StockReason, StoredProduct},
};

/// Request body for creating a product.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    /// Stock-keeping unit (unique)
    pub sku: String,
    /// Display name
    pub name: String,
    /// Unit price, decimal string
    pub price: String,
    /// Opening stock
    #[serde(default)]
    pub stock: u64,
    /// Unit of measure
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "pcs".to_string()
}

/// Request body for updating a product. Absent fields stay unchanged.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    /// New display name
    #[serde(default)]
    pub name: Option<String>,
    /// New SKU
    #[serde(default)]
    pub sku: Option<String>,
    /// New unit price, decimal string
    #[serde(default)]
    pub price: Option<String>,
    /// Activate/deactivate the product
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Request body for restocking.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RestockRequest {
    /// Units received (positive)
    pub quantity: u64,
    /// Free-form note
    #[serde(default)]
    pub note: Option<String>,
}

/// Product view returned to API clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductResponse {
    /// Unique product identifier
    pub product_id: String,
    /// Stock-keeping unit
    pub sku: String,
    /// Display name
    pub name: String,
    /// Unit price, decimal string
    pub price: String,
    /// Units in stock
    pub stock: u64,
    /// Unit of measure
    pub unit: String,
    /// Whether the product is sellable
    pub is_active: bool,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl From<StoredProduct> for ProductResponse {
    fn from(p: StoredProduct) -> Self {
        Self {
            product_id: p.product_id,
            sku: p.sku,
            name: p.name,
            price: format_minor(p.price_minor),
            stock: p.stock,
            unit: p.unit,
            is_active: p.is_active,
            updated_at: p.updated_at,
        }
    }
}

/// Query params for ledger listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LedgerQuery {
    /// Cursor from the previous page
    pub cursor: Option<String>,
    /// Page size (default 50)
    pub limit: Option<usize>,
}

/// One page of ledger entries.
#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerPage {
    /// Entries, newest first
    pub entries: Vec<StockEntry>,
    /// Cursor for the next page, when more entries exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/products",
    tag = "Inventory",
    responses((status = 200, body = [ProductResponse]))
)]
pub async fn list_products(
    Auth(_caller): Auth,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<ProductResponse>>>, ApiError> {
    let products = state.ops.list_products()?;
    Ok(Json(Envelope::new(
        products.into_iter().map(ProductResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/v1/products/{product_id}",
    params(("product_id" = String, Path, description = "Product to fetch")),
    tag = "Inventory",
    responses((status = 200, body = ProductResponse), (status = 404))
)]
pub async fn get_product(
    Auth(_caller): Auth,
    Path(product_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<ProductResponse>>, ApiError> {
    let product = state
        .ops
        .get_product(&product_id)?
        .ok_or_else(|| ApiError::not_found(format!("Product {product_id}")))?;
    Ok(Json(Envelope::new(product.into())))
}

#[utoipa::path(
    post,
    path = "/v1/products",
    request_body = CreateProductRequest,
    tag = "Inventory",
    responses((status = 201, body = ProductResponse), (status = 409))
)]
pub async fn create_product(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Envelope<ProductResponse>>), ApiError> {
    if request.sku.trim().is_empty() || request.name.trim().is_empty() {
        return Err(ApiError::bad_request("sku and name must not be empty"));
    }
    let price_minor = parse_decimal_to_minor(&request.price).map_err(ApiError::bad_request)?;

    let product = StoredProduct::new(
        request.sku.trim().to_string(),
        request.name.trim().to_string(),
        price_minor,
        request.stock,
        request.unit,
    );
    state.ops.insert_product(&product)?;

    audit_log!(
        &state.datastore,
        AuditEventType::ProductCreated,
        &caller,
        "product",
        &product.product_id
    );

    Ok((StatusCode::CREATED, Json(Envelope::new(product.into()))))
}

#[utoipa::path(
    put,
    path = "/v1/products/{product_id}",
    params(("product_id" = String, Path, description = "Product to update")),
    request_body = UpdateProductRequest,
    tag = "Inventory",
    responses((status = 200, body = ProductResponse), (status = 404))
)]
pub async fn update_product(
    Auth(caller): Auth,
    Path(product_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Envelope<ProductResponse>>, ApiError> {
    let mut product = state
        .ops
        .get_product(&product_id)?
        .ok_or_else(|| ApiError::not_found(format!("Product {product_id}")))?;

    if let Some(name) = request.name {
        product.name = name;
    }
    if let Some(sku) = request.sku {
        product.sku = sku;
    }
    if let Some(price) = request.price {
        product.price_minor = parse_decimal_to_minor(&price).map_err(ApiError::bad_request)?;
    }
    if let Some(is_active) = request.is_active {
        product.is_active = is_active;
    }
    product.updated_at = Utc::now();

    state.ops.update_product(&product)?;
    audit_log!(
        &state.datastore,
        AuditEventType::ProductUpdated,
        &caller,
        "product",
        &product_id
    );

    Ok(Json(Envelope::new(product.into())))
}

#[utoipa::path(
    post,
    path = "/v1/products/{product_id}/restock",
    params(("product_id" = String, Path, description = "Product to restock")),
    request_body = RestockRequest,
    tag = "Inventory",
    responses((status = 200, body = ProductResponse), (status = 404))
)]
pub async fn restock_product(
    Auth(caller): Auth,
    Path(product_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<RestockRequest>,
) -> Result<Json<Envelope<ProductResponse>>, ApiError> {
    if request.quantity == 0 {
        return Err(ApiError::bad_request("quantity must be positive"));
    }

    let (product, _entry) = state.ops.apply_stock_delta(
        &product_id,
        request.quantity as i64,
        StockReason::Restock,
        None,
        request.note,
    )?;

    audit_log!(
        &state.datastore,
        AuditEventType::StockAdjusted,
        &caller,
        "product",
        &product_id
    );

    Ok(Json(Envelope::new(product.into())))
}

#[utoipa::path(
    get,
    path = "/v1/products/{product_id}/ledger",
    params(
        ("product_id" = String, Path, description = "Product whose ledger to list"),
        LedgerQuery
    ),
    tag = "Inventory",
    responses((status = 200, body = LedgerPage))
)]
pub async fn list_ledger(
    Auth(_caller): Auth,
    Path(product_id): Path<String>,
    State(state): State<AppState>,
    Query(params): Query<LedgerQuery>,
) -> Result<Json<Envelope<LedgerPage>>, ApiError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let (entries, next_cursor) =
        state
            .ops
            .list_ledger(&product_id, params.cursor.as_deref(), limit)?;
    Ok(Json(Envelope::new(LedgerPage {
        entries,
        next_cursor,
    })))
}
