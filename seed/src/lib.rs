//! # Seeding
//!
//! One-shot provisioning for a fresh deployment: the menu catalogue and
//! the staff admin account. Reads `REDIS_URL` like the server does.

use std::env;

use anyhow::Result;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use uuid::Uuid;

use models::{store, Category, MenuItem, Role, UserRecord};

use models::Category::{Beverages, Desserts, Meals, Snacks};

// Prices in paise.
const MENU: &[(&str, &str, u64, Category)] = &[
    ("Masala/Ginger Tea", "Traditional Indian spiced tea", 2000, Beverages),
    ("Kulhad Tea", "Tea served in traditional clay cup", 3000, Beverages),
    ("Hot Coffee", "Freshly brewed hot coffee", 3000, Beverages),
    ("Black Hot Coffee (300ml)", "Strong black coffee", 5000, Beverages),
    ("Cold Coffee (300ml)", "Refreshing iced coffee", 8000, Beverages),
    ("Cold Coffee with Ice Cream (300ml)", "Cold coffee topped with ice cream", 8000, Beverages),
    ("Hot Chocolate (300ml)", "Rich hot chocolate drink", 7000, Beverages),
    ("Plain Milk (300ml)", "Fresh plain milk", 3000, Beverages),
    ("Banana Shake (300ml)", "Creamy banana milkshake", 9000, Beverages),
    ("Oreo Shake (300ml)", "Oreo cookie milkshake", 6000, Beverages),
    ("Aloo Tikki Burger", "Potato patty burger", 6000, Snacks),
    ("Paneer Burger", "Cottage cheese burger", 7000, Snacks),
    ("Veg Burger", "Mixed vegetable burger", 6000, Snacks),
    ("Crispy Paneer Burger", "Crispy fried paneer burger", 9900, Snacks),
    ("Aloo Tikki Sandwich", "Potato patty sandwich", 6000, Snacks),
    ("Paneer Sandwich", "Cottage cheese sandwich", 7000, Snacks),
    ("Veg Sandwich", "Mixed vegetable sandwich", 6000, Snacks),
    ("Plain/Masala Maggi", "Classic Maggi noodles", 4000, Meals),
    ("Cheese Maggi", "Maggi with cheese", 5000, Meals),
    ("Makhni Masala Maggi", "Creamy butter masala Maggi", 6000, Meals),
    ("Cheese Butter Maggi", "Maggi with cheese and butter", 7000, Meals),
    ("Chilli Garlic Wrap", "Spicy garlic wrap", 8000, Snacks),
    ("Veg Cheese Wrap", "Vegetable cheese wrap", 9000, Snacks),
    ("French Fries", "Classic french fries", 7000, Snacks),
    ("Peri Peri Fries", "Spicy peri peri fries", 9000, Snacks),
    ("Cheese Fries", "Fries with cheese sauce", 9000, Snacks),
    ("Spring Roll (6 Pcs)", "Crispy vegetable spring rolls", 7000, Snacks),
    ("Veg Fried Momo (7 Pcs)", "Fried vegetable momos", 8000, Snacks),
    ("Paneer Momo (7 Pcs)", "Paneer filled momos", 9900, Snacks),
    ("Onion Rings (7 Pcs)", "Crispy onion rings", 9000, Snacks),
    ("Gulab Jamun (2 Pcs)", "Warm syrup-soaked dumplings", 5000, Desserts),
    ("Chocolate Brownie", "Fudgy chocolate brownie", 8000, Desserts),
];

async fn connect() -> Result<MultiplexedConnection> {
    let url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let client = Client::open(url)?;

    Ok(client.get_multiplexed_async_connection().await?)
}

pub async fn seed_menu() -> Result<()> {
    let mut conn = connect().await?;

    let items: Vec<MenuItem> = MENU
        .iter()
        .map(|(name, description, price, category)| {
            MenuItem::new(
                name.to_string(),
                description.to_string(),
                *price,
                *category,
                None,
            )
        })
        .collect();

    let pairs = items
        .iter()
        .map(|item| Ok((item.id.to_string(), serde_json::to_string(item)?)))
        .collect::<Result<Vec<(String, String)>>>()?;

    let _: () = conn.del(store::MENU).await?;
    let _: () = conn.hset_multiple(store::MENU, &pairs).await?;

    println!("Seeded {} menu items", pairs.len());
    Ok(())
}

pub async fn seed_admin(name: String, email: String, password: String) -> Result<()> {
    let mut conn = connect().await?;

    let existing: Option<String> = conn.hget(store::USER_EMAILS, &email).await?;
    let id = existing
        .and_then(|raw| Uuid::parse_str(&raw).ok())
        .unwrap_or_else(Uuid::new_v4);

    let admin = UserRecord {
        id,
        name,
        email: email.clone(),
        enrollment_no: None,
        role: Role::Admin,
        password: Some(password),
        verified: true,
    };

    let _: () = conn
        .hset(store::USERS, id.to_string(), serde_json::to_string(&admin)?)
        .await?;
    let _: () = conn.hset(store::USER_EMAILS, &email, id.to_string()).await?;

    println!("Admin account ready: {email}");
    Ok(())
}
