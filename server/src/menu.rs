use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use models::{store, Category, MenuItem};

use crate::{
    auth::AdminAuth,
    database::{hash_all, hash_delete, hash_get, hash_set},
    error::AppError,
    state::AppState,
};

async fn load_sorted(state: &AppState) -> Result<Vec<MenuItem>, AppError> {
    let mut conn = state.redis.clone();
    let mut items: Vec<MenuItem> = hash_all(&mut conn, store::MENU).await?;

    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<MenuItem>>, AppError> {
    Ok(Json(load_sorted(&state).await?))
}

#[derive(Deserialize)]
pub struct AvailableQuery {
    pub search: Option<String>,
}

pub async fn list_available(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    let mut items = load_sorted(&state).await?;
    items.retain(|item| item.is_available);

    if let Some(search) = query.search.filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        items.retain(|item| item.name.to_lowercase().contains(&needle));
    }

    Ok(Json(items))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MenuItem>, AppError> {
    let mut conn = state.redis.clone();

    let item: MenuItem = hash_get(&mut conn, store::MENU, &id.to_string())
        .await?
        .ok_or(AppError::NotFound("Menu item"))?;

    Ok(Json(item))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItem {
    pub name: String,
    pub description: String,
    pub price: u64,
    pub category: Category,
    pub image_url: Option<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AdminAuth(_): AdminAuth,
    Json(req): Json<CreateMenuItem>,
) -> Result<(StatusCode, Json<MenuItem>), AppError> {
    let item = MenuItem::new(
        req.name,
        req.description,
        req.price,
        req.category,
        req.image_url,
    );

    let mut conn = state.redis.clone();
    hash_set(&mut conn, store::MENU, &item.id.to_string(), &item).await?;

    Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub category: Option<Category>,
    pub image_url: Option<String>,
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMenuItem>,
) -> Result<Json<MenuItem>, AppError> {
    let mut conn = state.redis.clone();

    let mut item: MenuItem = hash_get(&mut conn, store::MENU, &id.to_string())
        .await?
        .ok_or(AppError::NotFound("Menu item"))?;

    if let Some(name) = req.name {
        item.name = name;
    }
    if let Some(description) = req.description {
        item.description = description;
    }
    if let Some(price) = req.price {
        item.price = price;
    }
    if let Some(category) = req.category {
        item.category = category;
    }
    if let Some(image_url) = req.image_url {
        item.image_url = image_url;
    }

    hash_set(&mut conn, store::MENU, &id.to_string(), &item).await?;

    Ok(Json(item))
}

pub async fn toggle_availability(
    State(state): State<Arc<AppState>>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<MenuItem>, AppError> {
    let mut conn = state.redis.clone();

    let mut item: MenuItem = hash_get(&mut conn, store::MENU, &id.to_string())
        .await?
        .ok_or(AppError::NotFound("Menu item"))?;

    item.is_available = !item.is_available;
    hash_set(&mut conn, store::MENU, &id.to_string(), &item).await?;

    Ok(Json(item))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let mut conn = state.redis.clone();

    let existing: Option<MenuItem> = hash_get(&mut conn, store::MENU, &id.to_string()).await?;
    if existing.is_none() {
        return Err(AppError::NotFound("Menu item"));
    }

    hash_delete(&mut conn, store::MENU, &[id.to_string()]).await?;

    Ok(Json(json!({ "message": "Menu item removed" })))
}
