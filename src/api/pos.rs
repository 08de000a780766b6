// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Point-of-sale endpoints.
//!
//! A sale decrements stock, appends ledger entries and records the order in
//! one transaction; insufficient stock rejects the whole sale.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::Auth,
    error::{ApiError, Envelope},
    money::format_minor,
    state::AppState,
    storage::{AuditEventType, StoredOrder},
};

/// One requested sale line.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SaleLineRequest {
    /// Product to sell
    pub product_id: String,
    /// Units to sell (positive)
    pub quantity: u64,
}

/// Request body for recording a sale.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Lines to sell
    pub lines: Vec<SaleLineRequest>,
}

/// Order view returned to API clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    /// The recorded order
    #[serde(flatten)]
    pub order: StoredOrder,
    /// Order total as a decimal string
    pub total: String,
}

impl From<StoredOrder> for OrderResponse {
    fn from(order: StoredOrder) -> Self {
        let total = format_minor(order.total_minor);
        Self { order, total }
    }
}

/// Query params for order listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct OrdersQuery {
    /// Cursor from the previous page
    pub cursor: Option<String>,
    /// Page size (default 50)
    pub limit: Option<usize>,
}

/// One page of orders.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrdersPage {
    /// Orders, newest first
    pub orders: Vec<OrderResponse>,
    /// Cursor for the next page, when more orders exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[utoipa::path(
    post,
    path = "/v1/orders",
    request_body = CreateOrderRequest,
    tag = "PointOfSale",
    responses(
        (status = 201, body = OrderResponse),
        (status = 422, description = "Insufficient stock")
    )
)]
pub async fn create_order(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Envelope<OrderResponse>>), ApiError> {
    if request.lines.is_empty() {
        return Err(ApiError::bad_request("order must have at least one line"));
    }
    if request.lines.iter().any(|l| l.quantity == 0) {
        return Err(ApiError::bad_request("line quantities must be positive"));
    }

    let items: Vec<(String, u64)> = request
        .lines
        .iter()
        .map(|l| (l.product_id.clone(), l.quantity))
        .collect();

    let order = state.ops.record_sale(&caller.user_id, &items)?;

    audit_log!(
        &state.datastore,
        AuditEventType::SaleRecorded,
        &caller,
        "order",
        &order.order_id
    );

    Ok((StatusCode::CREATED, Json(Envelope::new(order.into()))))
}

#[utoipa::path(
    get,
    path = "/v1/orders",
    params(OrdersQuery),
    tag = "PointOfSale",
    responses((status = 200, body = OrdersPage))
)]
pub async fn list_orders(
    Auth(_caller): Auth,
    State(state): State<AppState>,
    Query(params): Query<OrdersQuery>,
) -> Result<Json<Envelope<OrdersPage>>, ApiError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let (orders, next_cursor) = state.ops.list_orders(params.cursor.as_deref(), limit)?;
    Ok(Json(Envelope::new(OrdersPage {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
        next_cursor,
    })))
}

#[utoipa::path(
    get,
    path = "/v1/orders/{order_id}",
    params(("order_id" = String, Path, description = "Order to fetch")),
    tag = "PointOfSale",
    responses((status = 200, body = OrderResponse), (status = 404))
)]
pub async fn get_order(
    Auth(_caller): Auth,
    Path(order_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Envelope<OrderResponse>>, ApiError> {
    let order = state
        .ops
        .get_order(&order_id)?
        .ok_or_else(|| ApiError::not_found(format!("Order {order_id}")))?;
    Ok(Json(Envelope::new(order.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::state::test_support::test_state;
    use crate::storage::StoredProduct;

    fn cashier() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "cash-1".to_string(),
            username: "kasir".to_string(),
            role: Role::Cashier,
            expires_at: 0,
        }
    }

    fn seed_product(state: &AppState, sku: &str, stock: u64, price_minor: u64) -> StoredProduct {
        let product = StoredProduct::new(
            sku.to_string(),
            format!("Product {sku}"),
            price_minor,
            stock,
            "pcs".to_string(),
        );
        state.ops.insert_product(&product).unwrap();
        product
    }

    #[tokio::test]
    async fn sale_decrements_stock_and_totals() {
        let (state, _tmp) = test_state();
        let a = seed_product(&state, "A", 10, 1500);
        let b = seed_product(&state, "B", 5, 9900);

        let (status, Json(envelope)) = create_order(
            Auth(cashier()),
            State(state.clone()),
            Json(CreateOrderRequest {
                lines: vec![
                    SaleLineRequest {
                        product_id: a.product_id.clone(),
                        quantity: 2,
                    },
                    SaleLineRequest {
                        product_id: b.product_id.clone(),
                        quantity: 1,
                    },
                ],
            }),
        )
        .await
        .expect("sale succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(envelope.data.total, "129.00");
        assert_eq!(
            state.ops.get_product(&a.product_id).unwrap().unwrap().stock,
            8
        );
    }

    #[tokio::test]
    async fn insufficient_stock_rejects_sale() {
        let (state, _tmp) = test_state();
        let a = seed_product(&state, "A", 1, 1000);

        let result = create_order(
            Auth(cashier()),
            State(state.clone()),
            Json(CreateOrderRequest {
                lines: vec![SaleLineRequest {
                    product_id: a.product_id.clone(),
                    quantity: 2,
                }],
            }),
        )
        .await;

        let err = result.err().expect("sale must fail");
        assert_eq!(err.status, axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            state.ops.get_product(&a.product_id).unwrap().unwrap().stock,
            1
        );
    }

    #[tokio::test]
    async fn empty_and_zero_quantity_orders_are_rejected() {
        let (state, _tmp) = test_state();
        let a = seed_product(&state, "A", 5, 1000);

        let result = create_order(
            Auth(cashier()),
            State(state.clone()),
            Json(CreateOrderRequest { lines: vec![] }),
        )
        .await;
        assert!(result.is_err());

        let result = create_order(
            Auth(cashier()),
            State(state),
            Json(CreateOrderRequest {
                lines: vec![SaleLineRequest {
                    product_id: a.product_id,
                    quantity: 0,
                }],
            }),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn list_and_get_orders() {
        let (state, _tmp) = test_state();
        let a = seed_product(&state, "A", 50, 1000);

        for _ in 0..3 {
            create_order(
                Auth(cashier()),
                State(state.clone()),
                Json(CreateOrderRequest {
                    lines: vec![SaleLineRequest {
                        product_id: a.product_id.clone(),
                        quantity: 1,
                    }],
                }),
            )
            .await
            .unwrap();
        }

        let Json(page) = list_orders(
            Auth(cashier()),
            State(state.clone()),
            Query(OrdersQuery {
                cursor: None,
                limit: Some(2),
            }),
        )
        .await
        .unwrap();
        assert_eq!(page.data.orders.len(), 2);
        assert!(page.data.next_cursor.is_some());

        let order_id = page.data.orders[0].order.order_id.clone();
        let Json(envelope) = get_order(Auth(cashier()), Path(order_id), State(state))
            .await
            .unwrap();
        assert_eq!(envelope.data.order.cashier_user_id, "cash-1");
    }
}
