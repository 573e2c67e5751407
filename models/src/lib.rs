//! # Canteen Models
//!
//! Shared domain types for the campus canteen ordering platform.
//!
//! Everything the server and the seed tool agree on lives here: the menu
//! catalogue entries, the order entity with its lifecycle state machine,
//! the identity records, and the redis key layout.
//!
//! The lifecycle methods on [`Order`] are pure: they validate the current
//! status, mutate the entity and stamp timestamps, but perform no IO. The
//! server loads an order, applies a transition and persists the result as
//! one unit of work, relying on per-key atomicity of the store for
//! read-modify-write safety (conflicting concurrent transitions are
//! last-write-wins).

pub mod menu;
pub mod order;
pub mod store;
pub mod user;

pub use menu::{Category, MenuItem};
pub use order::{
    daily_stats, validate_cart, CartEntry, DailyStats, LineItem, Order, OrderError, OrderStatus,
    StatusTarget,
};
pub use user::{Actor, Role, UserRecord};
