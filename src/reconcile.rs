//! # Reconciliation
//!
//! Brings a stored cart back in line with the live shop/product state.
//!
//! Shop problems are surfaced as warnings only; a closed shop often reopens,
//! and wiping the cart over it would throw away the user's picks. Product
//! problems prune the offending line item. Totals are recomputed from the
//! surviving items, and a cart left with no items is marked for deletion
//! rather than written back empty.
//!
//! The procedure is pure and idempotent: a cart whose items are all available
//! comes back unchanged with no diagnostics.
use std::collections::HashMap;

use serde::Serialize;

use crate::{
    gate::{ProductGate, ShopGate},
    models::{Cart, ProductStatus, ShopStatus},
};

/// One entry per problem found, in item order. Shop entries come first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    ShopMissing {
        shop_id: String,
    },
    ShopBlocked {
        shop_id: String,
        status: ShopStatus,
    },
    ProductMissing {
        product_id: String,
        name: String,
    },
    ProductBlocked {
        product_id: String,
        name: String,
        status: ProductStatus,
    },
}

/// What the caller should do with the cart after reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    Keep(Cart),
    Delete,
}

pub fn reconcile(
    mut cart: Cart,
    shop: &ShopGate,
    products: &HashMap<String, ProductGate>,
) -> (Reconciled, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    match shop {
        ShopGate::Open(_) => {}
        ShopGate::Blocked(shop) => diagnostics.push(Diagnostic::ShopBlocked {
            shop_id: shop.id.clone(),
            status: shop.status,
        }),
        ShopGate::Missing => diagnostics.push(Diagnostic::ShopMissing {
            shop_id: cart.shop.id.clone(),
        }),
    }

    cart.items.retain(|item| match products.get(&item.product_id) {
        Some(ProductGate::Available(_)) => true,
        Some(ProductGate::Blocked(product)) => {
            diagnostics.push(Diagnostic::ProductBlocked {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                status: product.status,
            });
            false
        }
        Some(ProductGate::Missing) | None => {
            diagnostics.push(Diagnostic::ProductMissing {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
            });
            false
        }
    });

    if cart.items.is_empty() {
        return (Reconciled::Delete, diagnostics);
    }

    cart.recompute_totals();

    (Reconciled::Keep(cart), diagnostics)
}
