//! 文章接口

use super::{default_limit, Pagination};
use crate::model::Model;
use crate::models::Post;
use crate::types::Filter;
use crate::web::error::ApiError;
use crate::web::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use rat_logger::info;
use serde::Deserialize;
use serde_json::Value;

/// 文章列表查询参数
#[derive(Debug, Deserialize)]
pub struct PostQuery {
    pub published: Option<bool>,
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

impl PostQuery {
    fn page(&self) -> Pagination {
        Pagination {
            skip: self.skip,
            limit: self.limit,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/posts", get(list_posts).post(create_post))
}

/// 文章列表，可按发布状态过滤
async fn list_posts(
    State(state): State<AppState>,
    query: Result<Query<PostQuery>, QueryRejection>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut filter = Filter::new();
    if let Some(published) = query.published {
        filter = filter.eq("published", published);
    }
    let posts = state
        .client
        .model_client::<Post>()?
        .find_many(filter, query.page().to_options())
        .await?;
    let body = posts
        .iter()
        .map(|post| post.to_json())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(body))
}

/// 创建文章
async fn create_post(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let posts = state
        .client
        .model_client::<Post>()
        .map_err(ApiError::from_create)?;
    let post = Post::from_json(payload).map_err(ApiError::from_create)?;
    let created = posts.insert(&post).await.map_err(ApiError::from_create)?;
    info!("📝 创建文章: {}", created.id);
    Ok(Json(created.to_json().map_err(ApiError::from_create)?))
}
