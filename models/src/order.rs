use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::menu::MenuItem;
use crate::user::{Actor, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Rejected | OrderStatus::Completed | OrderStatus::Cancelled
        )
    }
}

/// Statuses an admin may move an order to through the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusTarget {
    Ready,
    Completed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("No order items")]
    EmptyCart,
    #[error("Menu item not found: {0}")]
    ItemNotFound(Uuid),
    #[error("{0} is currently unavailable")]
    ItemUnavailable(String),
    #[error("Quantity must be at least 1")]
    BadQuantity,
    #[error("Order cannot be {0} in current status")]
    NotPending(&'static str),
    #[error("Can only cancel pending orders")]
    NotCancellable,
    #[error("Not authorized to cancel this order")]
    NotOwner,
}

/// One requested (menu item, quantity) pair from a submitted cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub menu_item: Uuid,
    pub quantity: u32,
}

/// Embedded snapshot of a menu item at order time plus the requested
/// quantity. Later catalogue edits never reach back into these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub menu_item: Uuid,
    pub name: String,
    pub quantity: u32,
    /// Unit price in minor units at order time.
    pub price: u64,
    pub image_url: String,
}

/// Resolves a submitted cart against the catalogue.
///
/// Validation is strictly sequential and fails fast on the first invalid
/// entry; partial totals are discarded with it. The caller persists nothing
/// unless the whole cart resolves.
pub fn validate_cart(
    entries: &[CartEntry],
    menu: &HashMap<Uuid, MenuItem>,
) -> Result<(Vec<LineItem>, u64), OrderError> {
    if entries.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let mut items = Vec::with_capacity(entries.len());
    let mut total: u64 = 0;

    for entry in entries {
        let item = menu
            .get(&entry.menu_item)
            .ok_or(OrderError::ItemNotFound(entry.menu_item))?;

        if !item.is_available {
            return Err(OrderError::ItemUnavailable(item.name.clone()));
        }

        if entry.quantity == 0 {
            return Err(OrderError::BadQuantity);
        }

        total += item.price * u64::from(entry.quantity);

        items.push(LineItem {
            menu_item: item.id,
            name: item.name.clone(),
            quantity: entry.quantity,
            price: item.price,
            image_url: item.image_url.clone(),
        });
    }

    Ok((items, total))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub owner: Uuid,
    pub owner_kind: Role,
    pub items: Vec<LineItem>,
    /// Sum of quantity x unit price, fixed at creation.
    pub total_price: u64,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub pickup_time: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub is_scheduled: bool,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub placed_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn place(
        actor: &Actor,
        items: Vec<LineItem>,
        total_price: u64,
        notes: Option<String>,
        scheduled_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: actor.id,
            owner_kind: actor.role,
            items,
            total_price,
            status: OrderStatus::Pending,
            notes,
            pickup_time: None,
            rejection_reason: None,
            is_scheduled: scheduled_time.is_some(),
            scheduled_time,
            placed_at: now,
            accepted_at: None,
            ready_at: None,
            completed_at: None,
        }
    }

    /// Pending -> Accepted. The pickup time is stored as supplied; computing
    /// it from prep minutes and the scheduled time is the caller's job.
    pub fn accept(
        &mut self,
        pickup_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending {
            return Err(OrderError::NotPending("accepted"));
        }

        self.status = OrderStatus::Accepted;
        self.accepted_at = Some(now);
        self.pickup_time = Some(pickup_time);
        Ok(())
    }

    /// Pending -> Rejected.
    pub fn reject(&mut self, reason: Option<String>) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending {
            return Err(OrderError::NotPending("rejected"));
        }

        self.status = OrderStatus::Rejected;
        self.rejection_reason = Some(reason.unwrap_or_else(|| "No reason provided".to_string()));
        Ok(())
    }

    /// Jump to Ready or Completed and stamp the matching timestamp. No
    /// prior-status precondition beyond target validity; an order may go
    /// straight from Pending to Completed.
    pub fn advance(&mut self, target: StatusTarget, now: DateTime<Utc>) {
        match target {
            StatusTarget::Ready => {
                self.status = OrderStatus::Ready;
                self.ready_at = Some(now);
            }
            StatusTarget::Completed => {
                self.status = OrderStatus::Completed;
                self.completed_at = Some(now);
            }
        }
    }

    /// Pending -> Cancelled, owner only. Exact ownership is required; an
    /// admin acting on another actor's order is refused.
    pub fn cancel(&mut self, actor: &Actor) -> Result<(), OrderError> {
        if actor.id != self.owner {
            return Err(OrderError::NotOwner);
        }

        if self.status != OrderStatus::Pending {
            return Err(OrderError::NotCancellable);
        }

        self.status = OrderStatus::Cancelled;
        Ok(())
    }

    pub fn viewable_by(&self, actor: &Actor) -> bool {
        self.owner == actor.id || actor.is_admin()
    }

    /// Sweep criterion: terminal status and placed before the retention
    /// cutoff. Pending orders are never swept, whatever their age.
    pub fn is_sweepable(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        self.status.is_terminal() && self.placed_at < now - retention
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub total_sales: u64,
    pub order_count: u64,
}

/// Revenue and count of orders completed on the given local calendar day.
/// Recomputed per request, never cached.
pub fn daily_stats<'a, I>(orders: I, day: NaiveDate) -> DailyStats
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut stats = DailyStats::default();

    for order in orders {
        if order.status != OrderStatus::Completed {
            continue;
        }

        let Some(completed_at) = order.completed_at else {
            continue;
        };

        if completed_at.with_timezone(&Local).date_naive() != day {
            continue;
        }

        stats.total_sales += order.total_price;
        stats.order_count += 1;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::Category;

    fn catalogue_item(name: &str, price: u64, available: bool) -> MenuItem {
        let mut item = MenuItem::new(
            name.to_string(),
            format!("{name} description"),
            price,
            Category::Snacks,
            None,
        );
        item.is_available = available;
        item
    }

    fn student() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role: Role::User,
        }
    }

    fn staff() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role: Role::Admin,
        }
    }

    fn cart(entries: &[(&MenuItem, u32)]) -> Vec<CartEntry> {
        entries
            .iter()
            .map(|(item, quantity)| CartEntry {
                menu_item: item.id,
                quantity: *quantity,
            })
            .collect()
    }

    fn menu_of(items: &[&MenuItem]) -> HashMap<Uuid, MenuItem> {
        items.iter().map(|i| (i.id, (*i).clone())).collect()
    }

    fn pending_order(actor: &Actor, total: u64) -> Order {
        let item = catalogue_item("Masala Tea", total, true);
        let menu = menu_of(&[&item]);
        let (items, total_price) = validate_cart(&cart(&[(&item, 1)]), &menu).unwrap();
        Order::place(actor, items, total_price, None, None, Utc::now())
    }

    #[test]
    fn cart_totals_sum_price_times_quantity() {
        let tea = catalogue_item("Masala Tea", 4900, true);
        let fries = catalogue_item("French Fries", 7000, true);
        let menu = menu_of(&[&tea, &fries]);

        let (items, total) = validate_cart(&cart(&[(&tea, 2), (&fries, 1)]), &menu).unwrap();

        assert_eq!(total, 4900 * 2 + 7000);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Masala Tea");
        assert_eq!(items[0].price, 4900);
    }

    #[test]
    fn cart_with_unknown_item_fails_whole_order() {
        let tea = catalogue_item("Masala Tea", 2000, true);
        let menu = menu_of(&[&tea]);
        let missing = Uuid::new_v4();

        let entries = vec![
            CartEntry {
                menu_item: tea.id,
                quantity: 1,
            },
            CartEntry {
                menu_item: missing,
                quantity: 1,
            },
        ];

        assert_eq!(
            validate_cart(&entries, &menu),
            Err(OrderError::ItemNotFound(missing))
        );
    }

    #[test]
    fn cart_with_unavailable_item_fails_whole_order() {
        let tea = catalogue_item("Masala Tea", 2000, true);
        let momo = catalogue_item("Paneer Momo", 9900, false);
        let menu = menu_of(&[&tea, &momo]);

        assert_eq!(
            validate_cart(&cart(&[(&tea, 1), (&momo, 1)]), &menu),
            Err(OrderError::ItemUnavailable("Paneer Momo".to_string()))
        );
    }

    #[test]
    fn empty_cart_is_rejected() {
        assert_eq!(
            validate_cart(&[], &HashMap::new()),
            Err(OrderError::EmptyCart)
        );
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let tea = catalogue_item("Masala Tea", 2000, true);
        let menu = menu_of(&[&tea]);

        assert_eq!(
            validate_cart(&cart(&[(&tea, 0)]), &menu),
            Err(OrderError::BadQuantity)
        );
    }

    #[test]
    fn placed_order_is_pending_and_unscheduled_by_default() {
        let item = catalogue_item("Veg Burger", 4900, true);
        let menu = menu_of(&[&item]);
        let (items, total) = validate_cart(&cart(&[(&item, 2)]), &menu).unwrap();

        let order = Order::place(&student(), items, total, None, None, Utc::now());

        assert_eq!(order.total_price, 9800);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.is_scheduled);
        assert!(order.scheduled_time.is_none());
    }

    #[test]
    fn scheduled_time_sets_the_flag_and_is_stored_verbatim() {
        let item = catalogue_item("Cold Coffee", 8000, true);
        let menu = menu_of(&[&item]);
        let (items, total) = validate_cart(&cart(&[(&item, 1)]), &menu).unwrap();
        let when = Utc::now() + Duration::hours(2);

        let order = Order::place(&student(), items, total, None, Some(when), Utc::now());

        assert!(order.is_scheduled);
        assert_eq!(order.scheduled_time, Some(when));
    }

    #[test]
    fn total_survives_later_menu_price_change() {
        let mut item = catalogue_item("Kulhad Tea", 3000, true);
        let menu = menu_of(&[&item]);
        let (items, total) = validate_cart(&cart(&[(&item, 3)]), &menu).unwrap();
        let order = Order::place(&student(), items, total, None, None, Utc::now());

        item.price = 5000;

        assert_eq!(order.total_price, 9000);
        assert_eq!(order.items[0].price, 3000);
    }

    #[test]
    fn accept_requires_pending_and_is_not_repeatable() {
        let mut order = pending_order(&student(), 2000);
        let pickup = Utc::now() + Duration::minutes(20);

        order.accept(pickup, Utc::now()).unwrap();
        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.pickup_time, Some(pickup));
        assert!(order.accepted_at.is_some());

        assert_eq!(
            order.accept(pickup, Utc::now()),
            Err(OrderError::NotPending("accepted"))
        );
    }

    #[test]
    fn reject_requires_pending_and_defaults_the_reason() {
        let mut order = pending_order(&student(), 2000);

        order.reject(None).unwrap();
        assert_eq!(order.status, OrderStatus::Rejected);
        assert_eq!(order.rejection_reason.as_deref(), Some("No reason provided"));

        assert_eq!(order.reject(None), Err(OrderError::NotPending("rejected")));
    }

    #[test]
    fn reject_keeps_a_supplied_reason() {
        let mut order = pending_order(&student(), 2000);

        order.reject(Some("Out of stock".to_string())).unwrap();

        assert_eq!(order.rejection_reason.as_deref(), Some("Out of stock"));
    }

    #[test]
    fn advance_is_permissive_from_pending() {
        let mut order = pending_order(&student(), 2000);

        order.advance(StatusTarget::Ready, Utc::now());

        assert_eq!(order.status, OrderStatus::Ready);
        assert!(order.ready_at.is_some());
        assert!(order.completed_at.is_none());
    }

    #[test]
    fn advance_to_completed_stamps_completed_at() {
        let mut order = pending_order(&student(), 2000);

        order.advance(StatusTarget::Completed, Utc::now());

        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.completed_at.is_some());
    }

    #[test]
    fn cancel_requires_exact_ownership_even_for_admins() {
        let owner = student();
        let mut order = pending_order(&owner, 2000);

        assert_eq!(order.cancel(&staff()), Err(OrderError::NotOwner));

        order.cancel(&owner).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn cancel_requires_pending() {
        let owner = student();
        let mut order = pending_order(&owner, 2000);
        order.advance(StatusTarget::Ready, Utc::now());

        assert_eq!(order.cancel(&owner), Err(OrderError::NotCancellable));
    }

    #[test]
    fn visibility_is_owner_or_admin() {
        let owner = student();
        let order = pending_order(&owner, 2000);

        assert!(order.viewable_by(&owner));
        assert!(order.viewable_by(&staff()));
        assert!(!order.viewable_by(&student()));
    }

    #[test]
    fn sweep_deletes_old_terminal_orders_only() {
        let retention = Duration::hours(24);
        let now = Utc::now();

        let mut old_completed = pending_order(&student(), 2000);
        old_completed.advance(StatusTarget::Completed, now);
        old_completed.placed_at = now - Duration::hours(25);

        let mut fresh_completed = pending_order(&student(), 2000);
        fresh_completed.advance(StatusTarget::Completed, now);
        fresh_completed.placed_at = now - Duration::hours(23);

        let mut ancient_pending = pending_order(&student(), 2000);
        ancient_pending.placed_at = now - Duration::days(30);

        assert!(old_completed.is_sweepable(now, retention));
        assert!(!fresh_completed.is_sweepable(now, retention));
        assert!(!ancient_pending.is_sweepable(now, retention));
    }

    #[test]
    fn daily_stats_counts_todays_completions_only() {
        let today_morning = Local::now()
            .date_naive()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            .and_local_timezone(Local)
            .unwrap()
            .to_utc();

        let mut today_order = pending_order(&student(), 2000);
        today_order.total_price = 10000;
        today_order.advance(StatusTarget::Completed, today_morning);

        let mut yesterday_order = pending_order(&student(), 2000);
        yesterday_order.total_price = 5000;
        yesterday_order.advance(StatusTarget::Completed, today_morning - Duration::days(1));

        let still_pending = pending_order(&student(), 2000);

        let stats = daily_stats(
            [&today_order, &yesterday_order, &still_pending],
            Local::now().date_naive(),
        );

        assert_eq!(stats.total_sales, 10000);
        assert_eq!(stats.order_count, 1);
    }

    #[test]
    fn daily_stats_of_nothing_is_zero() {
        let stats = daily_stats(std::iter::empty::<&Order>(), Local::now().date_naive());

        assert_eq!(
            stats,
            DailyStats {
                total_sales: 0,
                order_count: 0
            }
        );
    }

    #[test]
    fn order_serializes_with_the_wire_field_names() {
        let order = pending_order(&student(), 2000);
        let json = serde_json::to_value(&order).unwrap();

        assert!(json.get("totalPrice").is_some());
        assert!(json.get("isScheduled").is_some());
        assert!(json.get("placedAt").is_some());
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["ownerKind"], "user");
    }
}
