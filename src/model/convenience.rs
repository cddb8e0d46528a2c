//! 模型便捷函数模块
//!
//! 提供创建各种字段配置的便捷函数，约束通过链式方法追加

use crate::model::field_types::{FieldConfig, FieldKind};

/// 便捷函数：创建字符串字段
pub fn string_field() -> FieldConfig {
    FieldConfig::new(FieldKind::String)
}

/// 便捷函数：创建整数字段
pub fn integer_field() -> FieldConfig {
    FieldConfig::new(FieldKind::Integer)
}

/// 便捷函数：创建浮点数字段
pub fn float_field() -> FieldConfig {
    FieldConfig::new(FieldKind::Float)
}

/// 便捷函数：创建布尔字段
pub fn boolean_field() -> FieldConfig {
    FieldConfig::new(FieldKind::Boolean)
}

/// 便捷函数：创建日期时间字段
pub fn datetime_field() -> FieldConfig {
    FieldConfig::new(FieldKind::DateTime)
}

/// 便捷函数：创建JSON字段
/// 在 MongoDB 中使用原生文档，在 SQL 数据库中使用文本存储
pub fn json_field() -> FieldConfig {
    FieldConfig::new(FieldKind::Json)
}

/// 常用的默认值工厂
pub mod factories {
    use crate::types::DataValue;
    use chrono::{SubsecRound, Utc};

    /// 32位十六进制 UUID（无连字符）
    pub fn uuid_hex() -> DataValue {
        DataValue::String(uuid::Uuid::new_v4().simple().to_string())
    }

    /// 当前 UTC 时间，截断到毫秒以便各存储后端无损保存
    pub fn now() -> DataValue {
        DataValue::DateTime(Utc::now().trunc_subsecs(3))
    }
}
