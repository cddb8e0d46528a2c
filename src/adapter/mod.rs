//! 数据库适配器模块
//!
//! 提供统一的数据库操作接口，屏蔽不同数据库的实现差异

use crate::client::ClientConfig;
use crate::error::{NormaError, NormaResult};
use crate::model::ModelMeta;
use crate::types::*;
use async_trait::async_trait;
use rat_logger::info;
use std::sync::Arc;

// 导入各个数据库适配器 (条件编译)
#[cfg(feature = "mongodb-support")]
mod mongodb;
#[cfg(feature = "postgres-support")]
mod postgres;
#[cfg(any(feature = "sqlite-support", feature = "postgres-support"))]
mod sql_builder;
#[cfg(feature = "sqlite-support")]
mod sqlite;

// 条件导出适配器
#[cfg(feature = "mongodb-support")]
pub use mongodb::MongoAdapter;
#[cfg(feature = "postgres-support")]
pub use postgres::PostgresAdapter;
#[cfg(any(feature = "sqlite-support", feature = "postgres-support"))]
pub use sql_builder::{SqlBuilder, SqlDialect, SqlParam, SqlStatement};
#[cfg(feature = "sqlite-support")]
pub use sqlite::SqliteAdapter;

/// 数据库适配器trait，定义统一的数据库操作接口
///
/// 所有操作都以模型元数据为依据：SQL 后端按字段类型解码行，文档后端把主键映射到 `_id`
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// 数据库类型
    fn db_type(&self) -> DatabaseType;

    /// 创建表/集合（已存在时不做任何修改）以及声明的索引
    async fn create_table(&self, meta: &ModelMeta) -> NormaResult<()>;

    /// 插入一条记录，返回实际存储的字段映射
    async fn insert(&self, meta: &ModelMeta, data: &DataMap) -> NormaResult<DataMap>;

    /// 根据主键查找记录
    async fn find_by_id(&self, meta: &ModelMeta, id: &DataValue) -> NormaResult<Option<DataMap>>;

    /// 条件查询
    async fn find_many(
        &self,
        meta: &ModelMeta,
        filter: &Filter,
        options: &FindOptions,
    ) -> NormaResult<Vec<DataMap>>;

    /// 根据主键更新部分字段，返回是否有记录被修改
    async fn update_by_id(
        &self,
        meta: &ModelMeta,
        id: &DataValue,
        changes: &DataMap,
    ) -> NormaResult<bool>;

    /// 根据主键删除记录
    async fn delete_by_id(&self, meta: &ModelMeta, id: &DataValue) -> NormaResult<bool>;

    /// 统计记录数量
    async fn count(&self, meta: &ModelMeta, filter: &Filter) -> NormaResult<u64>;

    /// 关闭底层连接
    async fn close(&self);
}

/// 根据客户端配置创建并连接适配器
pub async fn connect_adapter(config: &ClientConfig) -> NormaResult<Arc<dyn DatabaseAdapter>> {
    info!(
        "🔌 连接数据库: 类型={}, 适配器={}",
        config.db_type,
        config.db_type.adapter_kind().as_str()
    );

    match config.db_type {
        DatabaseType::SQLite => {
            #[cfg(feature = "sqlite-support")]
            {
                let adapter = SqliteAdapter::connect(config).await?;
                Ok(Arc::new(adapter))
            }
            #[cfg(not(feature = "sqlite-support"))]
            {
                Err(feature_disabled(config.db_type, "sqlite-support"))
            }
        }
        DatabaseType::PostgreSQL => {
            #[cfg(feature = "postgres-support")]
            {
                let adapter = PostgresAdapter::connect(config).await?;
                Ok(Arc::new(adapter))
            }
            #[cfg(not(feature = "postgres-support"))]
            {
                Err(feature_disabled(config.db_type, "postgres-support"))
            }
        }
        DatabaseType::MongoDB => {
            #[cfg(feature = "mongodb-support")]
            {
                let adapter = MongoAdapter::connect(config).await?;
                Ok(Arc::new(adapter))
            }
            #[cfg(not(feature = "mongodb-support"))]
            {
                Err(feature_disabled(config.db_type, "mongodb-support"))
            }
        }
    }
}

#[allow(dead_code)]
fn feature_disabled(db_type: DatabaseType, feature: &str) -> NormaError {
    NormaError::UnsupportedDatabase {
        db_type: format!("{}（未启用 {} 特性）", db_type, feature),
    }
}

/// 语句日志：开启 echo 时以 info 级别输出，否则为 debug
#[allow(dead_code)]
pub(crate) fn log_statement(echo: bool, statement: &str) {
    if echo {
        info!("📝 {}", statement);
    } else {
        rat_logger::debug!("📝 {}", statement);
    }
}
