use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{error::AppError, state::State as AppState};

#[derive(Deserialize)]
pub struct AddItemPayload {
    pub user: String,
    pub shop: String,
    pub product: String,
}

#[derive(Deserialize)]
pub struct SetQuantityPayload {
    pub user: String,
    pub shop: String,
    pub product: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct NotePayload {
    pub note: String,
}

pub async fn add_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddItemPayload>,
) -> Result<Json<Value>, AppError> {
    let cart = state
        .carts
        .add_item(&payload.user, &payload.shop, &payload.product)
        .await?;

    Ok(Json(json!({ "status": true, "data": cart })))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SetQuantityPayload>,
) -> Result<Json<Value>, AppError> {
    let cart = state
        .carts
        .set_quantity(
            &payload.user,
            &payload.shop,
            &payload.product,
            payload.quantity,
        )
        .await?;

    Ok(Json(json!({ "status": true, "data": cart })))
}

pub async fn decrement_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddItemPayload>,
) -> Result<Json<Value>, AppError> {
    let cart = state
        .carts
        .decrement_item(&payload.user, &payload.shop, &payload.product)
        .await?;

    Ok(Json(json!({ "status": true, "data": cart })))
}

pub async fn carts_handler(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Result<Json<Value>, AppError> {
    let overviews = state.carts.carts_for_user(&user).await?;

    Ok(Json(json!({ "status": true, "data": overviews })))
}

pub async fn detail_handler(
    State(state): State<Arc<AppState>>,
    Path((user, shop)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let reconciled = state.carts.reconcile_cart(&user, &shop).await?;

    Ok(Json(json!({ "status": true, "data": reconciled })))
}

pub async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Path((user, shop)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let reconciled = state.carts.reconcile_cart(&user, &shop).await?;

    Ok(Json(json!({ "status": true, "data": reconciled })))
}

pub async fn payment_handler(
    State(state): State<Arc<AppState>>,
    Path((user, shop)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    state.carts.delete_on_payment(&user, &shop).await?;

    Ok(Json(json!({ "status": true, "message": "Cart deleted" })))
}

pub async fn delete_user_carts_handler(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.carts.delete_all_for_user(&user).await?;

    Ok(Json(json!({ "status": true, "deleted": deleted })))
}

pub async fn softdelete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let cart = state.carts.soft_delete(&id).await?;

    Ok(Json(json!({ "status": true, "data": cart })))
}

pub async fn restore_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let cart = state.carts.restore(&id).await?;

    Ok(Json(json!({ "status": true, "data": cart })))
}

pub async fn note_handler(
    State(state): State<Arc<AppState>>,
    Path((cart_id, product_id)): Path<(String, String)>,
    Json(payload): Json<NotePayload>,
) -> Result<Json<Value>, AppError> {
    let cart = state
        .carts
        .annotate_item(&cart_id, &product_id, &payload.note)
        .await?;

    Ok(Json(json!({ "status": true, "data": cart })))
}
