//! 示例 HTTP 服务
//!
//! 客户端通过共享状态注入到每个处理函数，生命周期由 `serve` 管理：
//! 启动时连接并建表，收到关闭信号后断开

pub mod error;
pub mod routes;

pub use error::{ApiError, ErrorResponse};

use crate::client::{ClientConfig, NormaClient};
use crate::config::Settings;
use crate::error::NormaResult;
use crate::models::{Post, User};
use axum::Router;
use rat_logger::info;
use tower_http::cors::{Any, CorsLayer};

/// 所有路由共享的状态
#[derive(Clone, Debug)]
pub struct AppState {
    /// 数据库客户端
    pub client: NormaClient,
}

impl AppState {
    pub fn new(client: NormaClient) -> Self {
        Self { client }
    }
}

/// 创建路由
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::routes())
        .merge(routes::users::routes())
        .merge(routes::posts::routes())
        .layer(cors)
        .with_state(state)
}

/// 创建示例服务使用的表
pub async fn prepare_tables(client: &NormaClient) -> NormaResult<()> {
    client.create_table::<User>().await?;
    client.create_table::<Post>().await?;
    info!("✅ 数据表已就绪: users, posts");
    Ok(())
}

/// 启动服务直到收到 Ctrl-C
pub async fn serve(settings: Settings) -> NormaResult<()> {
    let client = NormaClient::new(ClientConfig::from_settings(&settings)?);
    client.connect().await?;

    if let Err(e) = prepare_tables(&client).await {
        client.disconnect().await;
        return Err(e);
    }

    let app = create_router(AppState::new(client.clone()));
    let listener = match tokio::net::TcpListener::bind(&settings.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            client.disconnect().await;
            return Err(e.into());
        }
    };
    info!("🚀 服务监听于 http://{}", settings.bind_addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    client.disconnect().await;
    info!("服务已停止");
    result.map_err(Into::into)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("收到关闭信号，正在停止服务");
    }
}
