//! 数据库客户端门面
//!
//! 客户端由调用方创建并显式传递（例如放入 Web 服务的共享状态），
//! 内部持有一个可替换的适配器，克隆后共享同一连接

mod config;
mod model_client;

pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_DATABASE_NAME, DEFAULT_MAX_CONNECTIONS};
pub use model_client::ModelClient;

use crate::adapter::{connect_adapter, DatabaseAdapter};
use crate::error::{NormaError, NormaResult};
use crate::model::Model;
use crate::security::DatabaseSecurityValidator;
use crate::types::*;
use rat_logger::{debug, info};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

struct ClientInner {
    config: ClientConfig,
    adapter: RwLock<Option<Arc<dyn DatabaseAdapter>>>,
}

/// norma 客户端
#[derive(Clone)]
pub struct NormaClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for NormaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormaClient")
            .field("db_type", &self.inner.config.db_type)
            .field("database_name", &self.inner.config.database_name)
            .finish()
    }
}

impl NormaClient {
    /// 创建客户端（不会立即连接）
    pub fn new(config: ClientConfig) -> Self {
        debug!("创建客户端: 类型={}", config.db_type);
        Self {
            inner: Arc::new(ClientInner {
                config,
                adapter: RwLock::new(None),
            }),
        }
    }

    /// 客户端配置
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// 数据库类型
    pub fn db_type(&self) -> DatabaseType {
        self.inner.config.db_type
    }

    /// 适配器大类
    pub fn adapter_kind(&self) -> AdapterKind {
        self.inner.config.db_type.adapter_kind()
    }

    /// 连接URL
    pub fn database_url(&self) -> &str {
        &self.inner.config.database_url
    }

    /// 建立连接，已连接时直接返回
    pub async fn connect(&self) -> NormaResult<()> {
        let mut slot = self.inner.adapter.write().await;
        if slot.is_some() {
            debug!("客户端已连接，跳过");
            return Ok(());
        }
        let adapter = connect_adapter(&self.inner.config).await?;
        *slot = Some(adapter);
        info!("✅ 数据库已连接: {}", self.inner.config.db_type);
        Ok(())
    }

    /// 断开连接，未连接时不做任何事
    pub async fn disconnect(&self) {
        let adapter = self.inner.adapter.write().await.take();
        if let Some(adapter) = adapter {
            adapter.close().await;
            info!("数据库连接已断开: {}", self.inner.config.db_type);
        }
    }

    /// 是否已连接
    pub async fn is_connected(&self) -> bool {
        self.inner.adapter.read().await.is_some()
    }

    /// 当前适配器
    pub(crate) async fn adapter(&self) -> NormaResult<Arc<dyn DatabaseAdapter>> {
        self.inner
            .adapter
            .read()
            .await
            .clone()
            .ok_or(NormaError::NotConnected)
    }

    /// 在连接作用域内执行操作，无论成功与否结束时都会断开
    pub async fn with_connection<F, Fut, T>(&self, f: F) -> NormaResult<T>
    where
        F: FnOnce(NormaClient) -> Fut,
        Fut: Future<Output = NormaResult<T>>,
    {
        self.connect().await?;
        let result = f(self.clone()).await;
        self.disconnect().await;
        result
    }

    /// 获取模型操作客户端，同时检查模型元数据
    pub fn model_client<T: Model>(&self) -> NormaResult<ModelClient<T>> {
        let meta = T::meta();
        meta.check()?;
        DatabaseSecurityValidator::new(self.db_type()).validate_model(meta)?;
        Ok(ModelClient::new(self.clone()))
    }

    /// 创建模型对应的表/集合
    pub async fn create_table<T: Model>(&self) -> NormaResult<()> {
        self.model_client::<T>()?.create_table().await
    }

    /// 插入模型实例
    pub async fn insert<T: Model>(&self, model: &T) -> NormaResult<T> {
        self.model_client::<T>()?.insert(model).await
    }

    /// 根据主键查找
    pub async fn find_by_id<T: Model>(&self, id: impl Into<DataValue>) -> NormaResult<Option<T>> {
        self.model_client::<T>()?.find_by_id(id).await
    }

    /// 条件查询
    pub async fn find_many<T: Model>(
        &self,
        filter: Filter,
        options: FindOptions,
    ) -> NormaResult<Vec<T>> {
        self.model_client::<T>()?.find_many(filter, options).await
    }
}
