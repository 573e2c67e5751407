use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1546069901-ba9599a7e63c?w=400";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Beverages,
    Snacks,
    Meals,
    Desserts,
    Other,
}

/// A sellable catalogue entry. Mutable by admins only; orders snapshot the
/// name and price at placement time, so later edits never touch past orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Price in minor currency units (paise).
    pub price: u64,
    pub category: Category,
    pub image_url: String,
    pub is_available: bool,
}

impl MenuItem {
    pub fn new(
        name: String,
        description: String,
        price: u64,
        category: Category,
        image_url: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            price,
            category,
            image_url: image_url.unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            is_available: true,
        }
    }
}
