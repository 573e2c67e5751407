//! Periodic purge of finished orders.
//!
//! Runs once at process start and then on a fixed interval. A failed sweep
//! is logged and swallowed; the next tick re-evaluates from scratch, so an
//! order that turns terminal between sweeps survives until the pass after
//! its retention window lapses.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::time::interval;
use tracing::{error, info};

use models::store;

use crate::{
    database::{all_orders, hash_delete},
    error::AppError,
    state::AppState,
};

pub async fn run(state: Arc<AppState>) {
    let mut ticker = interval(StdDuration::from_secs(state.config.cleanup_interval_secs));

    loop {
        // First tick fires immediately.
        ticker.tick().await;

        match sweep(&state).await {
            Ok(0) => {}
            Ok(deleted) => info!("[Cleanup] Deleted {deleted} old orders"),
            Err(e) => error!("[Cleanup] {e}"),
        }
    }
}

async fn sweep(state: &AppState) -> Result<usize, AppError> {
    let mut conn = state.redis.clone();

    let orders = all_orders(&mut conn).await?;
    let now = Utc::now();
    let retention = Duration::hours(state.config.order_retention_hours);

    let expired: Vec<String> = orders
        .iter()
        .filter(|order| order.is_sweepable(now, retention))
        .map(|order| order.id.to_string())
        .collect();

    let deleted = expired.len();
    hash_delete(&mut conn, store::ORDERS, &expired).await?;

    Ok(deleted)
}
