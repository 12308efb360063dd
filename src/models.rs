//! # Documents
//!
//! Entities served by the marketplace directories plus the cart document
//! itself.
//!
//! Carts embed copies of the user/shop/product fields they were built from.
//! The copies are not refreshed when the source entities change; reconciliation
//! is the only path that brings a cart back in line with the catalog.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopStatus {
    Open,
    Closed,
    Inactive,
    Suspended,
}

impl ShopStatus {
    /// Statuses that forbid ordering from the shop.
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            ShopStatus::Closed | ShopStatus::Inactive | ShopStatus::Suspended
        )
    }
}

impl fmt::Display for ShopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShopStatus::Open => "open",
            ShopStatus::Closed => "closed",
            ShopStatus::Inactive => "inactive",
            ShopStatus::Suspended => "suspended",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Available,
    OutOfStock,
    Discontinued,
}

impl ProductStatus {
    pub fn is_available(self) -> bool {
        matches!(self, ProductStatus::Available)
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProductStatus::Available => "available",
            ProductStatus::OutOfStock => "out_of_stock",
            ProductStatus::Discontinued => "discontinued",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub id: String,
    pub name: String,
    pub images: Vec<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: ShopStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub images: Vec<String>,
    pub status: ProductStatus,
}

/// User fields copied into a cart at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: String,
    pub name: String,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
        }
    }
}

/// Shop fields copied into a cart at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopSnapshot {
    pub id: String,
    pub name: String,
    pub images: Vec<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Shop> for ShopSnapshot {
    fn from(shop: &Shop) -> Self {
        Self {
            id: shop.id.clone(),
            name: shop.name.clone(),
            images: shop.images.clone(),
            address: shop.address.clone(),
            latitude: shop.latitude,
            longitude: shop.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub images: Vec<String>,
    pub quantity: u32,
    #[serde(default)]
    pub note: String,
}

impl CartItem {
    /// New line item at quantity 1, priced as the catalog shows right now.
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            images: product.images.clone(),
            quantity: 1,
            note: String::new(),
        }
    }

    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// One cart per (user, shop) pair. Deleted outright once it holds no items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub user: UserSnapshot,
    pub shop: ShopSnapshot,
    pub items: Vec<CartItem>,
    pub total_item_count: u32,
    pub total_price: f64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user: &User, shop: &Shop, first_item: CartItem) -> Self {
        let now = Utc::now();

        let mut cart = Self {
            id: Uuid::new_v4().to_string(),
            user: user.into(),
            shop: shop.into(),
            items: vec![first_item],
            total_item_count: 0,
            total_price: 0.0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        cart.recompute_totals();

        cart
    }

    pub fn item_index(&self, product_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.product_id == product_id)
    }

    /// Totals are derived from the line items, never carried forward.
    pub fn recompute_totals(&mut self) {
        self.total_item_count = self.items.iter().map(|i| i.quantity).sum();
        self.total_price = self.items.iter().map(CartItem::line_total).sum();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            cart_id: self.id.clone(),
            shop_id: self.shop.id.clone(),
            shop_name: self.shop.name.clone(),
            shop_images: self.shop.images.clone(),
            shop_address: self.shop.address.clone(),
            total_item_count: self.total_item_count,
            total_price: self.total_price,
        }
    }
}

/// Shop-level rollup of a cart for the user's cart list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSummary {
    pub cart_id: String,
    pub shop_id: String,
    pub shop_name: String,
    pub shop_images: Vec<String>,
    pub shop_address: String,
    pub total_item_count: u32,
    pub total_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, price: f64, quantity: u32) -> CartItem {
        CartItem {
            product_id: product_id.to_string(),
            name: product_id.to_string(),
            price,
            images: vec![],
            quantity,
            note: String::new(),
        }
    }

    #[test]
    fn test_recompute_totals() {
        let user = User {
            id: "u1".into(),
            name: "u1".into(),
        };
        let shop = Shop {
            id: "s1".into(),
            name: "s1".into(),
            images: vec![],
            address: "addr".into(),
            latitude: 0.0,
            longitude: 0.0,
            status: ShopStatus::Open,
        };

        let mut cart = Cart::new(&user, &shop, item("p1", 50.0, 1));
        assert_eq!(cart.total_item_count, 1);
        assert_eq!(cart.total_price, 50.0);

        cart.items.push(item("p2", 10.0, 3));
        cart.recompute_totals();
        assert_eq!(cart.total_item_count, 4);
        assert_eq!(cart.total_price, 80.0);

        cart.items.clear();
        cart.recompute_totals();
        assert_eq!(cart.total_item_count, 0);
        assert_eq!(cart.total_price, 0.0);
    }

    #[test]
    fn test_blocking_statuses() {
        assert!(!ShopStatus::Open.is_blocking());
        assert!(ShopStatus::Closed.is_blocking());
        assert!(ShopStatus::Inactive.is_blocking());
        assert!(ShopStatus::Suspended.is_blocking());

        assert!(ProductStatus::Available.is_available());
        assert!(!ProductStatus::OutOfStock.is_available());
        assert!(!ProductStatus::Discontinued.is_available());
    }
}
