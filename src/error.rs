use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    User,
    Shop,
    Product,
    Cart,
    CartItem,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "user",
            Entity::Shop => "shop",
            Entity::Product => "product",
            Entity::Cart => "cart",
            Entity::CartItem => "cart item",
        };
        write!(f, "{name}")
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },

    #[error("{entity} {id} is {status}")]
    Blocked {
        entity: Entity,
        id: String,
        status: String,
    },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AppError {
    pub fn not_found(entity: Entity, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn blocked(entity: Entity, id: &str, status: impl ToString) -> Self {
        Self::Blocked {
            entity,
            id: id.to_string(),
            status: status.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("corrupt document: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match self {
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Blocked { .. } => (StatusCode::CONFLICT, "blocked"),
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation"),
            AppError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "system"),
        };

        let error = match &self {
            AppError::NotFound { entity, id } => json!({
                "kind": kind,
                "entity": entity,
                "id": id,
                "message": self.to_string(),
            }),
            AppError::Blocked { entity, id, status } => json!({
                "kind": kind,
                "entity": entity,
                "id": id,
                "state": status,
                "message": self.to_string(),
            }),
            _ => json!({
                "kind": kind,
                "message": self.to_string(),
            }),
        };

        (status, Json(json!({ "status": false, "error": error }))).into_response()
    }
}
