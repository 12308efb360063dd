//! # Cart Store
//!
//! Redis-backed persistence for cart documents.
//!
//! ## Requirements
//!
//! - One cart per (user, shop) pair while the cart has items
//! - Fast lookup by that pair on every mutation
//! - Occasional scans: all carts for a user, all carts holding a product
//!
//! ## Implementation
//!
//! - Redis hash: 1 big key, then field-value pairs
//! - Field is `{user_id}:{shop_id}`, value is the JSON cart document
//! - The field name doubles as the uniqueness constraint on (user, shop);
//!   two writers for the same pair land on the same field, last write wins
//! - Whole-document writes, no partial updates
//! - Scans walk the hash; cart counts stay small enough that HGETALL is fine
use std::{collections::HashMap, sync::RwLock, time::Duration};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use crate::{error::StorageError, models::Cart};

pub const CARTS_KEY: &str = "carts";

pub fn cart_field(user_id: &str, shop_id: &str) -> String {
    format!("{user_id}:{shop_id}")
}

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).unwrap();
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .unwrap();

    connection_manager
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find(&self, user_id: &str, shop_id: &str) -> Result<Option<Cart>, StorageError>;

    async fn find_by_id(&self, cart_id: &str) -> Result<Option<Cart>, StorageError>;

    async fn find_for_user(&self, user_id: &str) -> Result<Vec<Cart>, StorageError>;

    async fn put(&self, cart: &Cart) -> Result<(), StorageError>;

    /// Returns whether a document was actually removed.
    async fn delete(&self, user_id: &str, shop_id: &str) -> Result<bool, StorageError>;

    async fn delete_for_user(&self, user_id: &str) -> Result<usize, StorageError>;

    /// Removes every cart, for any user, holding the given product.
    async fn purge_product(&self, product_id: &str) -> Result<usize, StorageError>;
}

pub struct RedisCartStore {
    connection: ConnectionManager,
}

impl RedisCartStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    async fn all(&self) -> Result<Vec<(String, Cart)>, StorageError> {
        let mut connection = self.connection.clone();

        let entries: HashMap<String, String> = connection.hgetall(CARTS_KEY).await?;

        let mut carts = Vec::with_capacity(entries.len());
        for (field, raw) in entries {
            carts.push((field, serde_json::from_str(&raw)?));
        }

        Ok(carts)
    }

    async fn remove_fields(&self, fields: Vec<String>) -> Result<usize, StorageError> {
        if fields.is_empty() {
            return Ok(0);
        }

        let mut connection = self.connection.clone();
        let removed: usize = connection.hdel(CARTS_KEY, fields).await?;

        Ok(removed)
    }
}

#[async_trait]
impl CartStore for RedisCartStore {
    async fn find(&self, user_id: &str, shop_id: &str) -> Result<Option<Cart>, StorageError> {
        let mut connection = self.connection.clone();

        let raw: Option<String> = connection
            .hget(CARTS_KEY, cart_field(user_id, shop_id))
            .await?;

        raw.as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(Into::into)
    }

    async fn find_by_id(&self, cart_id: &str) -> Result<Option<Cart>, StorageError> {
        let carts = self.all().await?;

        Ok(carts.into_iter().map(|(_, cart)| cart).find(|cart| cart.id == cart_id))
    }

    async fn find_for_user(&self, user_id: &str) -> Result<Vec<Cart>, StorageError> {
        let prefix = format!("{user_id}:");
        let carts = self.all().await?;

        Ok(carts
            .into_iter()
            .filter(|(field, _)| field.starts_with(&prefix))
            .map(|(_, cart)| cart)
            .collect())
    }

    async fn put(&self, cart: &Cart) -> Result<(), StorageError> {
        let mut connection = self.connection.clone();

        let field = cart_field(&cart.user.id, &cart.shop.id);
        let raw = serde_json::to_string(cart)?;
        let _: () = connection.hset(CARTS_KEY, field, raw).await?;

        Ok(())
    }

    async fn delete(&self, user_id: &str, shop_id: &str) -> Result<bool, StorageError> {
        let mut connection = self.connection.clone();

        let removed: usize = connection
            .hdel(CARTS_KEY, cart_field(user_id, shop_id))
            .await?;

        Ok(removed > 0)
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<usize, StorageError> {
        let prefix = format!("{user_id}:");
        let mut connection = self.connection.clone();

        let fields: Vec<String> = connection.hkeys(CARTS_KEY).await?;
        let matching: Vec<String> = fields
            .into_iter()
            .filter(|field| field.starts_with(&prefix))
            .collect();

        self.remove_fields(matching).await
    }

    async fn purge_product(&self, product_id: &str) -> Result<usize, StorageError> {
        let carts = self.all().await?;

        let matching: Vec<String> = carts
            .into_iter()
            .filter(|(_, cart)| cart.item_index(product_id).is_some())
            .map(|(field, _)| field)
            .collect();

        #[cfg(feature = "verbose")]
        println!("Purging {} carts holding {}", matching.len(), product_id);

        self.remove_fields(matching).await
    }
}

/// In-memory store for tests and local runs without Redis. Same field keying
/// as the Redis layout.
#[derive(Default)]
pub struct MemoryCartStore {
    carts: RwLock<HashMap<String, Cart>>,
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn find(&self, user_id: &str, shop_id: &str) -> Result<Option<Cart>, StorageError> {
        let carts = self.carts.read().unwrap();

        Ok(carts.get(&cart_field(user_id, shop_id)).cloned())
    }

    async fn find_by_id(&self, cart_id: &str) -> Result<Option<Cart>, StorageError> {
        let carts = self.carts.read().unwrap();

        Ok(carts.values().find(|cart| cart.id == cart_id).cloned())
    }

    async fn find_for_user(&self, user_id: &str) -> Result<Vec<Cart>, StorageError> {
        let prefix = format!("{user_id}:");
        let carts = self.carts.read().unwrap();

        Ok(carts
            .iter()
            .filter(|(field, _)| field.starts_with(&prefix))
            .map(|(_, cart)| cart.clone())
            .collect())
    }

    async fn put(&self, cart: &Cart) -> Result<(), StorageError> {
        let mut carts = self.carts.write().unwrap();
        carts.insert(cart_field(&cart.user.id, &cart.shop.id), cart.clone());

        Ok(())
    }

    async fn delete(&self, user_id: &str, shop_id: &str) -> Result<bool, StorageError> {
        let mut carts = self.carts.write().unwrap();

        Ok(carts.remove(&cart_field(user_id, shop_id)).is_some())
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<usize, StorageError> {
        let prefix = format!("{user_id}:");
        let mut carts = self.carts.write().unwrap();

        let before = carts.len();
        carts.retain(|field, _| !field.starts_with(&prefix));

        Ok(before - carts.len())
    }

    async fn purge_product(&self, product_id: &str) -> Result<usize, StorageError> {
        let mut carts = self.carts.write().unwrap();

        let before = carts.len();
        carts.retain(|_, cart| cart.item_index(product_id).is_none());

        Ok(before - carts.len())
    }
}
