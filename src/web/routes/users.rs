//! 用户接口

use super::Pagination;
use crate::model::Model;
use crate::models::User;
use crate::types::Filter;
use crate::web::error::ApiError;
use crate::web::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use rat_logger::info;
use serde_json::Value;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:user_id", get(get_user))
}

/// 用户列表
async fn list_users(
    State(state): State<AppState>,
    page: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let Query(page) = page.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let users = state
        .client
        .model_client::<User>()?
        .find_many(Filter::new(), page.to_options())
        .await?;
    let body = users
        .iter()
        .map(|user| user.to_json())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(body))
}

/// 单个用户
async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .client
        .model_client::<User>()?
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(user.to_json()?))
}

/// 创建用户
async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let users = state
        .client
        .model_client::<User>()
        .map_err(ApiError::from_create)?;
    let user = User::from_json(payload).map_err(ApiError::from_create)?;
    let created = users.insert(&user).await.map_err(ApiError::from_create)?;
    info!("👤 创建用户: {}", created.id);
    Ok(Json(created.to_json().map_err(ApiError::from_create)?))
}
