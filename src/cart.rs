//! # Cart Operations
//!
//! Every write to cart storage goes through [`CartService`]; nothing else
//! touches the carts hash. Each operation checks the availability gate first,
//! applies one change, recomputes totals, and persists the whole document.
//!
//! Reads come in two flavors: [`CartService::read_cart`] returns the stored
//! document as-is, while [`CartService::reconcile_cart`] prunes stale items
//! and persists the result before returning it. The HTTP detail and validate
//! endpoints both use the reconciling form.
use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    directory::{ProductCatalog, ShopDirectory, UserDirectory},
    error::{AppError, Entity},
    gate::{
        ProductGate, ShopGate, classify_product, classify_shop, require_available_product,
        require_open_shop, require_user,
    },
    models::{Cart, CartItem, CartSummary},
    reconcile::{Diagnostic, Reconciled, reconcile},
    store::{CartStore, cart_field},
};

/// A reconciled cart, or `None` when reconciliation emptied and deleted it.
#[derive(Debug, Serialize)]
pub struct ReconciledCart {
    pub cart: Option<Cart>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One entry per cart in the user's cart list.
#[derive(Debug, Serialize)]
pub struct CartOverview {
    #[serde(flatten)]
    pub summary: CartSummary,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct CartService {
    users: Arc<dyn UserDirectory>,
    shops: Arc<dyn ShopDirectory>,
    products: Arc<dyn ProductCatalog>,
    carts: Arc<dyn CartStore>,
}

impl CartService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        shops: Arc<dyn ShopDirectory>,
        products: Arc<dyn ProductCatalog>,
        carts: Arc<dyn CartStore>,
    ) -> Self {
        Self {
            users,
            shops,
            products,
            carts,
        }
    }

    /// Adds one unit of the product to the user's cart for the shop, creating
    /// the cart if this is the first item.
    pub async fn add_item(
        &self,
        user_id: &str,
        shop_id: &str,
        product_id: &str,
    ) -> Result<Cart, AppError> {
        debug!(user_id, shop_id, product_id, "add_item");

        let user = require_user(self.users.as_ref(), user_id).await?;
        let shop = require_open_shop(self.shops.as_ref(), shop_id).await?;
        let product = require_available_product(self.products.as_ref(), product_id).await?;

        let cart = match self.carts.find(user_id, shop_id).await? {
            None => Cart::new(&user, &shop, CartItem::from_product(&product)),
            Some(mut cart) => {
                match cart.item_index(product_id) {
                    Some(index) => cart.items[index].quantity += 1,
                    None => cart.items.push(CartItem::from_product(&product)),
                }
                cart.recompute_totals();
                cart.touch();

                cart
            }
        };

        self.carts.put(&cart).await?;
        info!(
            cart_id = %cart.id,
            total_item_count = cart.total_item_count,
            "item added"
        );

        Ok(cart)
    }

    /// Overwrites the line item's quantity. Zero removes the item, and an
    /// emptied cart is deleted rather than saved.
    ///
    /// A product that has gone unavailable additionally purges every cart
    /// holding it, across all users, before the block is reported.
    pub async fn set_quantity(
        &self,
        user_id: &str,
        shop_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> Result<Option<Cart>, AppError> {
        debug!(user_id, shop_id, product_id, quantity, "set_quantity");

        let quantity = u32::try_from(quantity)
            .map_err(|_| AppError::Validation(format!("quantity {quantity} is out of range")))?;

        require_user(self.users.as_ref(), user_id).await?;
        require_open_shop(self.shops.as_ref(), shop_id).await?;

        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Product, product_id))?;

        if !product.status.is_available() {
            let purged = self.carts.purge_product(product_id).await?;
            warn!(
                product_id,
                status = %product.status,
                purged,
                "product unavailable, purged all carts holding it"
            );

            return Err(AppError::blocked(Entity::Product, product_id, product.status));
        }

        let mut cart = self
            .carts
            .find(user_id, shop_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Cart, &cart_field(user_id, shop_id)))?;
        let index = cart
            .item_index(product_id)
            .ok_or_else(|| AppError::not_found(Entity::CartItem, product_id))?;

        if quantity == 0 {
            cart.items.remove(index);

            if cart.items.is_empty() {
                self.carts.delete(user_id, shop_id).await?;
                info!(cart_id = %cart.id, "cart emptied and deleted");

                return Ok(None);
            }
        } else {
            cart.items[index].quantity = quantity;
        }

        cart.recompute_totals();
        cart.touch();
        self.carts.put(&cart).await?;

        Ok(Some(cart))
    }

    /// Removes one unit of the product, dropping the line item at quantity 1
    /// and the whole cart when it empties.
    pub async fn decrement_item(
        &self,
        user_id: &str,
        shop_id: &str,
        product_id: &str,
    ) -> Result<Option<Cart>, AppError> {
        debug!(user_id, shop_id, product_id, "decrement_item");

        require_user(self.users.as_ref(), user_id).await?;
        require_open_shop(self.shops.as_ref(), shop_id).await?;
        require_available_product(self.products.as_ref(), product_id).await?;

        let mut cart = self
            .carts
            .find(user_id, shop_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Cart, &cart_field(user_id, shop_id)))?;
        let index = cart
            .item_index(product_id)
            .ok_or_else(|| AppError::not_found(Entity::CartItem, product_id))?;

        if cart.items[index].quantity > 1 {
            cart.items[index].quantity -= 1;
        } else {
            cart.items.remove(index);
        }

        if cart.items.is_empty() {
            self.carts.delete(user_id, shop_id).await?;
            info!(cart_id = %cart.id, "cart emptied and deleted");

            return Ok(None);
        }

        cart.recompute_totals();
        cart.touch();
        self.carts.put(&cart).await?;

        Ok(Some(cart))
    }

    /// Sets the free-text note on one line item. The cart is addressed by its
    /// own id here, not by (user, shop).
    pub async fn annotate_item(
        &self,
        cart_id: &str,
        product_id: &str,
        note: &str,
    ) -> Result<Cart, AppError> {
        debug!(cart_id, product_id, "annotate_item");

        let mut cart = self
            .carts
            .find_by_id(cart_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Cart, cart_id))?;
        let index = cart
            .item_index(product_id)
            .ok_or_else(|| AppError::not_found(Entity::CartItem, product_id))?;

        cart.items[index].note = note.to_string();
        cart.touch();
        self.carts.put(&cart).await?;

        Ok(cart)
    }

    /// One summary per cart the user owns, each annotated with whatever
    /// availability problems a dry-run reconciliation finds. Nothing is
    /// pruned or persisted on this path.
    pub async fn carts_for_user(&self, user_id: &str) -> Result<Vec<CartOverview>, AppError> {
        debug!(user_id, "carts_for_user");

        require_user(self.users.as_ref(), user_id).await?;

        let carts = self.carts.find_for_user(user_id).await?;

        let mut overviews = Vec::with_capacity(carts.len());
        for cart in carts {
            let shop = classify_shop(self.shops.as_ref(), &cart.shop.id).await?;
            let products = self.classify_items(&cart).await?;
            let (_, diagnostics) = reconcile(cart.clone(), &shop, &products);

            overviews.push(CartOverview {
                summary: cart.summary(),
                diagnostics,
            });
        }

        Ok(overviews)
    }

    /// The stored cart, untouched. No availability checks, no pruning.
    pub async fn read_cart(&self, user_id: &str, shop_id: &str) -> Result<Cart, AppError> {
        self.carts
            .find(user_id, shop_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Cart, &cart_field(user_id, shop_id)))
    }

    /// Full reconciliation as a read: prunes stale items, persists the
    /// corrected cart (or deletes it when emptied), and returns it together
    /// with the diagnostics.
    pub async fn reconcile_cart(
        &self,
        user_id: &str,
        shop_id: &str,
    ) -> Result<ReconciledCart, AppError> {
        debug!(user_id, shop_id, "reconcile_cart");

        let cart = self
            .carts
            .find(user_id, shop_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Cart, &cart_field(user_id, shop_id)))?;

        let shop = classify_shop(self.shops.as_ref(), shop_id).await?;
        if matches!(shop, ShopGate::Missing) {
            return Err(AppError::not_found(Entity::Shop, shop_id));
        }

        let products = self.classify_items(&cart).await?;

        match reconcile(cart, &shop, &products) {
            (Reconciled::Delete, diagnostics) => {
                self.carts.delete(user_id, shop_id).await?;
                info!(user_id, shop_id, "no usable items left, cart deleted");

                Ok(ReconciledCart {
                    cart: None,
                    diagnostics,
                })
            }
            (Reconciled::Keep(cart), diagnostics) => {
                if !diagnostics.is_empty() {
                    info!(
                        cart_id = %cart.id,
                        dropped = diagnostics.len(),
                        "cart reconciled"
                    );
                }
                self.carts.put(&cart).await?;

                Ok(ReconciledCart {
                    cart: Some(cart),
                    diagnostics,
                })
            }
        }
    }

    /// Unconditional removal once the order for this (user, shop) is placed.
    pub async fn delete_on_payment(&self, user_id: &str, shop_id: &str) -> Result<(), AppError> {
        self.carts.delete(user_id, shop_id).await?;
        info!(user_id, shop_id, "cart deleted after payment");

        Ok(())
    }

    pub async fn delete_all_for_user(&self, user_id: &str) -> Result<usize, AppError> {
        let deleted = self.carts.delete_for_user(user_id).await?;
        info!(user_id, deleted, "deleted all carts for user");

        Ok(deleted)
    }

    /// Flags the cart as soft-deleted without touching its items.
    pub async fn soft_delete(&self, cart_id: &str) -> Result<Cart, AppError> {
        let mut cart = self
            .carts
            .find_by_id(cart_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Cart, cart_id))?;

        cart.is_deleted = true;
        cart.touch();
        self.carts.put(&cart).await?;

        Ok(cart)
    }

    /// Clears the soft-delete flag.
    pub async fn restore(&self, cart_id: &str) -> Result<Cart, AppError> {
        let mut cart = self
            .carts
            .find_by_id(cart_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Cart, cart_id))?;

        cart.is_deleted = false;
        cart.touch();
        self.carts.put(&cart).await?;

        Ok(cart)
    }

    async fn classify_items(
        &self,
        cart: &Cart,
    ) -> Result<HashMap<String, ProductGate>, AppError> {
        let mut products = HashMap::with_capacity(cart.items.len());
        for item in &cart.items {
            let gate = classify_product(self.products.as_ref(), &item.product_id).await?;
            products.insert(item.product_id.clone(), gate);
        }

        Ok(products)
    }
}
