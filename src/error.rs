//! 错误类型定义
//!
//! 模型验证、客户端门面和存储适配器共用同一个错误枚举，
//! Web 层根据变体决定 HTTP 状态码

use thiserror::Error;

/// norma 统一错误类型
#[derive(Error, Debug)]
pub enum NormaError {
    /// 字段验证失败
    #[error("模型验证失败: {field} - {message}")]
    ValidationError { field: String, message: String },

    /// 序列化/反序列化失败
    #[error("数据序列化失败: {message}")]
    SerializationError { message: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    ConfigError { message: String },

    /// 数据库连接失败
    #[error("数据库连接失败: {message}")]
    ConnectionError { message: String },

    /// 查询执行失败
    #[error("查询执行失败: {message}")]
    QueryError { message: String },

    /// 不支持的数据库类型
    #[error("不支持的数据库类型: {db_type}")]
    UnsupportedDatabase { db_type: String },

    /// 客户端尚未连接
    #[error("数据库未初始化")]
    NotConnected,

    /// IO 错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),
}

/// 结果类型别名
pub type NormaResult<T> = Result<T, NormaError>;

impl NormaError {
    /// 是否属于调用方输入导致的错误
    pub fn is_validation(&self) -> bool {
        matches!(self, NormaError::ValidationError { .. })
    }
}

impl From<serde_json::Error> for NormaError {
    fn from(err: serde_json::Error) -> Self {
        NormaError::SerializationError {
            message: err.to_string(),
        }
    }
}

/// 快速构造错误的宏
#[macro_export]
macro_rules! norma_error {
    (validation, $field:expr, $msg:expr) => {
        $crate::error::NormaError::ValidationError {
            field: $field.to_string(),
            message: $msg.to_string(),
        }
    };
    (serialization, $msg:expr) => {
        $crate::error::NormaError::SerializationError {
            message: $msg.to_string(),
        }
    };
    (config, $msg:expr) => {
        $crate::error::NormaError::ConfigError {
            message: $msg.to_string(),
        }
    };
    (connection, $msg:expr) => {
        $crate::error::NormaError::ConnectionError {
            message: $msg.to_string(),
        }
    };
    (query, $msg:expr) => {
        $crate::error::NormaError::QueryError {
            message: $msg.to_string(),
        }
    };
    (unsupported_db, $db_type:expr) => {
        $crate::error::NormaError::UnsupportedDatabase {
            db_type: $db_type.to_string(),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = norma_error!(validation, "email", "字符串不匹配正则表达式");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "模型验证失败: email - 字符串不匹配正则表达式");
    }

    #[test]
    fn test_json_error_becomes_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: NormaError = json_err.into();
        assert!(matches!(err, NormaError::SerializationError { .. }));
    }
}
