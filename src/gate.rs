//! # Availability Gate
//!
//! Classifies shops and products as usable or blocked before the cart touches
//! them. Read-only; mutation handlers call the `require_*` helpers (shop is
//! checked before product, and a blocked shop short-circuits), while
//! reconciliation uses the `classify_*` forms that report missing entities
//! instead of failing.
use crate::{
    directory::{ProductCatalog, ShopDirectory, UserDirectory},
    error::{AppError, Entity, StorageError},
    models::{Product, Shop, User},
};

/// Shop state as seen at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub enum ShopGate {
    Open(Shop),
    Blocked(Shop),
    Missing,
}

/// Product state as seen at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductGate {
    Available(Product),
    Blocked(Product),
    Missing,
}

pub async fn classify_shop(
    shops: &dyn ShopDirectory,
    id: &str,
) -> Result<ShopGate, StorageError> {
    let gate = match shops.find_by_id(id).await? {
        None => ShopGate::Missing,
        Some(shop) if shop.status.is_blocking() => ShopGate::Blocked(shop),
        Some(shop) => ShopGate::Open(shop),
    };

    Ok(gate)
}

pub async fn classify_product(
    products: &dyn ProductCatalog,
    id: &str,
) -> Result<ProductGate, StorageError> {
    let gate = match products.find_by_id(id).await? {
        None => ProductGate::Missing,
        Some(product) if !product.status.is_available() => ProductGate::Blocked(product),
        Some(product) => ProductGate::Available(product),
    };

    Ok(gate)
}

pub async fn require_user(users: &dyn UserDirectory, id: &str) -> Result<User, AppError> {
    users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(Entity::User, id))
}

/// The shop must exist and not be in a blocking status.
pub async fn require_open_shop(shops: &dyn ShopDirectory, id: &str) -> Result<Shop, AppError> {
    match classify_shop(shops, id).await? {
        ShopGate::Open(shop) => Ok(shop),
        ShopGate::Blocked(shop) => Err(AppError::blocked(Entity::Shop, &shop.id, shop.status)),
        ShopGate::Missing => Err(AppError::not_found(Entity::Shop, id)),
    }
}

/// The product must exist and still be orderable.
pub async fn require_available_product(
    products: &dyn ProductCatalog,
    id: &str,
) -> Result<Product, AppError> {
    match classify_product(products, id).await? {
        ProductGate::Available(product) => Ok(product),
        ProductGate::Blocked(product) => {
            Err(AppError::blocked(Entity::Product, &product.id, product.status))
        }
        ProductGate::Missing => Err(AppError::not_found(Entity::Product, id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;
    use crate::models::{ProductStatus, ShopStatus};

    fn shop(id: &str, status: ShopStatus) -> Shop {
        Shop {
            id: id.to_string(),
            name: id.to_string(),
            images: vec![],
            address: "addr".into(),
            latitude: 0.0,
            longitude: 0.0,
            status,
        }
    }

    fn product(id: &str, status: ProductStatus) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            price: 10.0,
            images: vec![],
            status,
        }
    }

    #[tokio::test]
    async fn test_shop_classification() {
        let directory = MemoryDirectory::default();
        directory.insert_shop(shop("open", ShopStatus::Open));
        directory.insert_shop(shop("closed", ShopStatus::Closed));
        directory.insert_shop(shop("suspended", ShopStatus::Suspended));

        assert!(matches!(
            classify_shop(&directory, "open").await.unwrap(),
            ShopGate::Open(_)
        ));
        assert!(matches!(
            classify_shop(&directory, "closed").await.unwrap(),
            ShopGate::Blocked(_)
        ));
        assert!(matches!(
            classify_shop(&directory, "suspended").await.unwrap(),
            ShopGate::Blocked(_)
        ));
        assert!(matches!(
            classify_shop(&directory, "missing").await.unwrap(),
            ShopGate::Missing
        ));
    }

    #[tokio::test]
    async fn test_product_classification() {
        let directory = MemoryDirectory::default();
        directory.insert_product(product("p1", ProductStatus::Available));
        directory.insert_product(product("p2", ProductStatus::OutOfStock));
        directory.insert_product(product("p3", ProductStatus::Discontinued));

        assert!(matches!(
            classify_product(&directory, "p1").await.unwrap(),
            ProductGate::Available(_)
        ));
        assert!(matches!(
            classify_product(&directory, "p2").await.unwrap(),
            ProductGate::Blocked(_)
        ));
        assert!(matches!(
            classify_product(&directory, "p3").await.unwrap(),
            ProductGate::Blocked(_)
        ));
        assert!(matches!(
            classify_product(&directory, "nope").await.unwrap(),
            ProductGate::Missing
        ));
    }

    #[tokio::test]
    async fn test_require_helpers_report_block_and_not_found() {
        let directory = MemoryDirectory::default();
        directory.insert_shop(shop("closed", ShopStatus::Closed));
        directory.insert_product(product("p2", ProductStatus::OutOfStock));

        let err = require_open_shop(&directory, "closed").await.unwrap_err();
        assert!(matches!(err, AppError::Blocked { entity: Entity::Shop, .. }));

        let err = require_open_shop(&directory, "gone").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: Entity::Shop, .. }));

        let err = require_available_product(&directory, "p2").await.unwrap_err();
        assert!(matches!(err, AppError::Blocked { entity: Entity::Product, .. }));

        let err = require_user(&directory, "nobody").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: Entity::User, .. }));
    }
}
