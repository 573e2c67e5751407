//! # Redis
//!
//! Primary store for the platform: the menu catalogue, orders, identity
//! records and short-lived credentials all live in redis.
//!
//! Hashes hold one JSON document per field (see [`models::store`] for the
//! key layout), which keeps reads to a single round trip per collection and
//! makes per-order writes a single atomic `HSET`. Sessions and OTPs are
//! plain keys so they can carry a TTL.

use std::collections::HashMap;
use std::time::Duration;

use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use models::{store, MenuItem, Order, UserRecord};

use crate::error::AppError;

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).unwrap();

    client
        .get_connection_manager_with_config(config)
        .await
        .unwrap()
}

pub async fn hash_get<T: DeserializeOwned>(
    conn: &mut ConnectionManager,
    key: &str,
    field: &str,
) -> Result<Option<T>, AppError> {
    let raw: Option<String> = conn.hget(key, field).await?;

    Ok(match raw {
        Some(json) => Some(serde_json::from_str(&json)?),
        None => None,
    })
}

pub async fn hash_set<T: Serialize>(
    conn: &mut ConnectionManager,
    key: &str,
    field: &str,
    value: &T,
) -> Result<(), AppError> {
    let json = serde_json::to_string(value)?;
    let _: () = conn.hset(key, field, json).await?;

    Ok(())
}

pub async fn hash_all<T: DeserializeOwned>(
    conn: &mut ConnectionManager,
    key: &str,
) -> Result<Vec<T>, AppError> {
    let raw: HashMap<String, String> = conn.hgetall(key).await?;

    raw.into_values()
        .map(|json| serde_json::from_str(&json).map_err(AppError::from))
        .collect()
}

pub async fn hash_delete(
    conn: &mut ConnectionManager,
    key: &str,
    fields: &[String],
) -> Result<(), AppError> {
    if fields.is_empty() {
        return Ok(());
    }

    let _: () = conn.hdel(key, fields.to_vec()).await?;
    Ok(())
}

pub async fn put_with_ttl<T: Serialize>(
    conn: &mut ConnectionManager,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), AppError> {
    let json = serde_json::to_string(value)?;
    let _: () = conn.set_ex(key, json, ttl_secs).await?;

    Ok(())
}

pub async fn get_json<T: DeserializeOwned>(
    conn: &mut ConnectionManager,
    key: &str,
) -> Result<Option<T>, AppError> {
    let raw: Option<String> = conn.get(key).await?;

    Ok(match raw {
        Some(json) => Some(serde_json::from_str(&json)?),
        None => None,
    })
}

pub async fn delete(conn: &mut ConnectionManager, key: &str) -> Result<(), AppError> {
    let _: () = conn.del(key).await?;
    Ok(())
}

/// The whole catalogue keyed by id, one `HGETALL` round trip.
pub async fn menu_map(
    conn: &mut ConnectionManager,
) -> Result<HashMap<Uuid, MenuItem>, AppError> {
    let items: Vec<MenuItem> = hash_all(conn, store::MENU).await?;

    Ok(items.into_iter().map(|item| (item.id, item)).collect())
}

pub async fn all_orders(conn: &mut ConnectionManager) -> Result<Vec<Order>, AppError> {
    hash_all(conn, store::ORDERS).await
}

pub async fn find_order(
    conn: &mut ConnectionManager,
    id: Uuid,
) -> Result<Option<Order>, AppError> {
    hash_get(conn, store::ORDERS, &id.to_string()).await
}

pub async fn save_order(conn: &mut ConnectionManager, order: &Order) -> Result<(), AppError> {
    hash_set(conn, store::ORDERS, &order.id.to_string(), order).await
}

pub async fn find_user_by_email(
    conn: &mut ConnectionManager,
    email: &str,
) -> Result<Option<UserRecord>, AppError> {
    let id: Option<String> = conn.hget(store::USER_EMAILS, email).await?;

    match id {
        Some(id) => hash_get(conn, store::USERS, &id).await,
        None => Ok(None),
    }
}

pub async fn save_user(conn: &mut ConnectionManager, user: &UserRecord) -> Result<(), AppError> {
    hash_set(conn, store::USERS, &user.id.to_string(), user).await?;
    let _: () = conn
        .hset(store::USER_EMAILS, &user.email, user.id.to_string())
        .await?;

    Ok(())
}
