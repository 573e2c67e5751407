//! Redis key layout shared by the server and the seed tool.
//!
//! - `menu` hash: menu item id -> JSON [`MenuItem`](crate::MenuItem)
//! - `orders` hash: order id -> JSON [`Order`](crate::Order)
//! - `users` hash: user id -> JSON [`UserRecord`](crate::UserRecord)
//! - `user_emails` hash: email -> user id
//! - `session:<token>` string with TTL: JSON [`Actor`](crate::Actor)
//! - `otp:<email>` string with TTL: 6-digit code

pub const MENU: &str = "menu";
pub const ORDERS: &str = "orders";
pub const USERS: &str = "users";
pub const USER_EMAILS: &str = "user_emails";

pub fn session(token: &str) -> String {
    format!("session:{token}")
}

pub fn otp(email: &str) -> String {
    format!("otp:{email}")
}
