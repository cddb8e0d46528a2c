//! norma - 声明式模型与异步客户端
//!
//! 结构体 + 字段配置声明模型，写入前统一验证；同一套客户端接口
//! 按配置选择 SQLite、PostgreSQL 或 MongoDB 后端。
//! 附带一个示例HTTP服务、一个演示流程和一个交互式发布助手

// 导出所有公共模块
pub mod error;
pub mod types;
pub mod model;
pub mod security;
pub mod adapter;
pub mod client;
pub mod config;
pub mod models;
pub mod web;
pub mod demo;
pub mod publish;

// 重新导出常用类型和函数
pub use error::{NormaError, NormaResult};
pub use types::*;
pub use model::{
    Model, ModelMeta, FieldConfig, FieldKind, Relationship,
    string_field, integer_field, float_field, boolean_field, datetime_field, json_field,
};
pub use security::{DatabaseSecurityValidator, IdentifierKind};
pub use adapter::DatabaseAdapter;
pub use client::{ClientConfig, ClientConfigBuilder, ModelClient, NormaClient};
pub use config::{init_logging, LogLevel, LoggingConfig, LoggingConfigBuilder, Settings};

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
