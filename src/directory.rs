//! # Directories
//!
//! Lookup contracts for the entities the cart consumes but does not own:
//! users, shops, and products. The cart only ever reads them by id; everything
//! else about those domains lives elsewhere.
use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::de::DeserializeOwned;

use crate::{
    error::StorageError,
    models::{Product, Shop, User},
};

pub const USERS_KEY: &str = "users";
pub const SHOPS_KEY: &str = "shops";
pub const PRODUCTS_KEY: &str = "products";

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError>;
}

#[async_trait]
pub trait ShopDirectory: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Shop>, StorageError>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StorageError>;
}

/// Directory lookups backed by the shared Redis instance.
///
/// One hash per entity kind: 1 big key, then id to JSON document pairs.
#[derive(Clone)]
pub struct RedisDirectory {
    connection: ConnectionManager,
}

impl RedisDirectory {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        key: &str,
        id: &str,
    ) -> Result<Option<T>, StorageError> {
        let mut connection = self.connection.clone();

        let raw: Option<String> = connection.hget(key, id).await?;

        raw.as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(Into::into)
    }
}

#[async_trait]
impl UserDirectory for RedisDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        self.fetch(USERS_KEY, id).await
    }
}

#[async_trait]
impl ShopDirectory for RedisDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<Shop>, StorageError> {
        self.fetch(SHOPS_KEY, id).await
    }
}

#[async_trait]
impl ProductCatalog for RedisDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StorageError> {
        self.fetch(PRODUCTS_KEY, id).await
    }
}

/// In-memory directory for tests and local runs without Redis.
#[derive(Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<String, User>>,
    shops: RwLock<HashMap<String, Shop>>,
    products: RwLock<HashMap<String, Product>>,
}

impl MemoryDirectory {
    pub fn insert_user(&self, user: User) {
        self.users.write().unwrap().insert(user.id.clone(), user);
    }

    pub fn insert_shop(&self, shop: Shop) {
        self.shops.write().unwrap().insert(shop.id.clone(), shop);
    }

    pub fn insert_product(&self, product: Product) {
        self.products
            .write()
            .unwrap()
            .insert(product.id.clone(), product);
    }

    pub fn remove_product(&self, id: &str) {
        self.products.write().unwrap().remove(id);
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        Ok(self.users.read().unwrap().get(id).cloned())
    }
}

#[async_trait]
impl ShopDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<Shop>, StorageError> {
        Ok(self.shops.read().unwrap().get(id).cloned())
    }
}

#[async_trait]
impl ProductCatalog for MemoryDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StorageError> {
        Ok(self.products.read().unwrap().get(id).cloned())
    }
}
