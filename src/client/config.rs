//! # 客户端配置
//!
//! 通过构建器显式设置数据库类型和连接URL，构建时检查两者是否一致

use crate::config::Settings;
use crate::error::{NormaError, NormaResult};
use crate::types::DatabaseType;
use rat_logger::info;
use serde::{Deserialize, Serialize};

/// 默认 MongoDB 数据库名
pub const DEFAULT_DATABASE_NAME: &str = "norma_db";

/// 默认最大连接数
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// 客户端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// 数据库类型
    pub db_type: DatabaseType,
    /// 连接URL
    pub database_url: String,
    /// 数据库名（仅 MongoDB 使用）
    pub database_name: String,
    /// 是否输出执行的语句
    pub echo: bool,
    /// 连接池最大连接数
    pub max_connections: u32,
}

impl ClientConfig {
    /// 创建配置构建器
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// 从运行时设置创建，与构建器做同样的一致性检查
    pub fn from_settings(settings: &Settings) -> NormaResult<Self> {
        Self::builder()
            .db_type(settings.db_type)
            .database_url(settings.database_url.clone())
            .database_name(settings.mongodb_database.clone())
            .echo(settings.db_echo)
            .build()
    }

    /// SQLite 内存数据库配置
    pub fn sqlite_memory() -> Self {
        Self {
            db_type: DatabaseType::SQLite,
            database_url: "sqlite::memory:".to_string(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            echo: false,
            max_connections: 1,
        }
    }
}

/// 客户端配置构建器
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    db_type: Option<DatabaseType>,
    database_url: Option<String>,
    database_name: Option<String>,
    echo: bool,
    max_connections: Option<u32>,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置数据库类型
    pub fn db_type(mut self, db_type: DatabaseType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    /// 设置连接URL
    pub fn database_url<S: Into<String>>(mut self, url: S) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// 设置数据库名
    pub fn database_name<S: Into<String>>(mut self, name: S) -> Self {
        self.database_name = Some(name.into());
        self
    }

    /// 设置语句输出
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// 构建配置
    ///
    /// # 错误
    ///
    /// 未设置连接URL、类型无法确定、类型与URL不一致或连接数为零时返回错误
    pub fn build(self) -> NormaResult<ClientConfig> {
        let database_url = self.database_url.ok_or_else(|| NormaError::ConfigError {
            message: "连接URL必须设置".to_string(),
        })?;

        let inferred = DatabaseType::from_url(&database_url);
        let db_type = match (self.db_type, inferred) {
            (Some(explicit), Some(from_url)) if explicit != from_url => {
                return Err(NormaError::ConfigError {
                    message: format!(
                        "数据库类型 {} 与连接URL的类型 {} 不一致",
                        explicit, from_url
                    ),
                })
            }
            (Some(explicit), _) => explicit,
            (None, Some(from_url)) => from_url,
            (None, None) => {
                return Err(NormaError::ConfigError {
                    message: format!("无法从连接URL推断数据库类型: {}", database_url),
                })
            }
        };

        let max_connections = self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(NormaError::ConfigError {
                message: "最大连接数不能为零".to_string(),
            });
        }

        let database_name = self
            .database_name
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());
        if database_name.trim().is_empty() {
            return Err(NormaError::ConfigError {
                message: "数据库名不能为空".to_string(),
            });
        }

        info!("创建客户端配置: 类型={}, 语句输出={}", db_type, self.echo);

        Ok(ClientConfig {
            db_type,
            database_url,
            database_name,
            echo: self.echo,
            max_connections,
        })
    }
}
