//! Order lifecycle.
//!
//! `Pending -> Accepted -> Ready -> Completed` on the happy path, with
//! `Pending -> Rejected` and `Pending -> Cancelled` as the terminal side
//! exits. Handlers load the order, apply the pure transition from
//! [`models::Order`], persist, and only then fan the updated order out to
//! the interested audiences. A failed push never rolls the mutation back.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{
    daily_stats, store, validate_cart, CartEntry, DailyStats, Order, OrderStatus, StatusTarget,
    UserRecord,
};

use crate::{
    auth::{AdminAuth, Auth},
    database::{all_orders, find_order, hash_all, hash_get, menu_map, save_order},
    error::AppError,
    state::AppState,
};

/// Owner display fields attached to an order representation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// The order as clients see it: the entity plus resolved owner fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<Customer>,
}

fn customer_of(user: UserRecord) -> Customer {
    Customer {
        id: user.id,
        name: user.name,
        email: user.email,
    }
}

async fn resolve_order(state: &AppState, order: Order) -> Result<OrderView, AppError> {
    let mut conn = state.redis.clone();

    let customer = hash_get::<UserRecord>(&mut conn, store::USERS, &order.owner.to_string())
        .await?
        .map(customer_of);

    Ok(OrderView { order, customer })
}

async fn resolve_orders(
    state: &AppState,
    orders: Vec<Order>,
) -> Result<Vec<OrderView>, AppError> {
    let mut conn = state.redis.clone();

    let users: Vec<UserRecord> = hash_all(&mut conn, store::USERS).await?;
    let by_id: HashMap<Uuid, UserRecord> =
        users.into_iter().map(|user| (user.id, user)).collect();

    Ok(orders
        .into_iter()
        .map(|order| {
            let customer = by_id.get(&order.owner).cloned().map(customer_of);
            OrderView { order, customer }
        })
        .collect())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub items: Vec<CartEntry>,
    pub notes: Option<String>,
    pub scheduled_time: Option<DateTime<Utc>>,
}

pub async fn place(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), AppError> {
    let mut conn = state.redis.clone();

    let menu = menu_map(&mut conn).await?;
    let (items, total_price) = validate_cart(&req.items, &menu)?;

    let order = Order::place(
        &actor,
        items,
        total_price,
        req.notes,
        req.scheduled_time,
        Utc::now(),
    );
    save_order(&mut conn, &order).await?;

    let view = resolve_order(&state, order).await?;
    state.notifier.emit_to_admin("newOrder", &view).await;

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
) -> Result<Json<Vec<OrderView>>, AppError> {
    let mut conn = state.redis.clone();

    let mut orders = all_orders(&mut conn).await?;
    orders.retain(|order| order.owner == actor.id);
    orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));

    Ok(Json(resolve_orders(&state, orders).await?))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
}

pub async fn list_all(
    State(state): State<Arc<AppState>>,
    AdminAuth(_): AdminAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderView>>, AppError> {
    let mut conn = state.redis.clone();

    let mut orders = all_orders(&mut conn).await?;
    if let Some(status) = query.status {
        orders.retain(|order| order.status == status);
    }
    orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));

    Ok(Json(resolve_orders(&state, orders).await?))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, AppError> {
    let mut conn = state.redis.clone();

    let order = find_order(&mut conn, id)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    if !order.viewable_by(&actor) {
        return Err(AppError::Forbidden("Not authorized to view this order"));
    }

    Ok(Json(resolve_order(&state, order).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptRequest {
    pub pickup_time: DateTime<Utc>,
}

pub async fn accept(
    State(state): State<Arc<AppState>>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<AcceptRequest>,
) -> Result<Json<OrderView>, AppError> {
    let mut conn = state.redis.clone();

    let mut order = find_order(&mut conn, id)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    order.accept(req.pickup_time, Utc::now())?;
    save_order(&mut conn, &order).await?;

    let owner = order.owner;
    let view = resolve_order(&state, order).await?;
    state.notifier.emit_to_owner(owner, "orderUpdate", &view).await;

    Ok(Json(view))
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<OrderView>, AppError> {
    let mut conn = state.redis.clone();

    let mut order = find_order(&mut conn, id)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    order.reject(req.reason)?;
    save_order(&mut conn, &order).await?;

    let owner = order.owner;
    let view = resolve_order(&state, order).await?;
    state.notifier.emit_to_owner(owner, "orderUpdate", &view).await;

    Ok(Json(view))
}

#[derive(Deserialize)]
pub struct AdvanceRequest {
    pub status: StatusTarget,
}

pub async fn advance(
    State(state): State<Arc<AppState>>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<AdvanceRequest>,
) -> Result<Json<OrderView>, AppError> {
    let mut conn = state.redis.clone();

    let mut order = find_order(&mut conn, id)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    order.advance(req.status, Utc::now());
    save_order(&mut conn, &order).await?;

    let owner = order.owner;
    let view = resolve_order(&state, order).await?;
    state.notifier.emit_to_owner(owner, "orderUpdate", &view).await;
    state.notifier.emit_to_admin("orderUpdate", &view).await;

    Ok(Json(view))
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, AppError> {
    let mut conn = state.redis.clone();

    let mut order = find_order(&mut conn, id)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    order.cancel(&actor)?;
    save_order(&mut conn, &order).await?;

    let view = resolve_order(&state, order).await?;
    state.notifier.emit_to_admin("orderUpdate", &view).await;

    Ok(Json(view))
}

pub async fn stats_daily(
    State(state): State<Arc<AppState>>,
    AdminAuth(_): AdminAuth,
) -> Result<Json<DailyStats>, AppError> {
    let mut conn = state.redis.clone();

    let orders = all_orders(&mut conn).await?;
    let stats = daily_stats(&orders, Local::now().date_naive());

    Ok(Json(stats))
}
