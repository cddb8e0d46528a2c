//! 模型特征模块
//!
//! 定义模型的核心特征：元数据访问、构造验证、字典转换

use crate::error::{NormaError, NormaResult};
use crate::model::field_types::{FieldConfig, ModelMeta};
use crate::types::{data_map_to_json, DataMap, DataValue};
use rat_logger::debug;
use serde::{de::DeserializeOwned, Serialize};

/// 模型特征
///
/// 通常由 `define_model!` 宏实现，只需提供 `meta()`
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 获取模型元数据
    fn meta() -> &'static ModelMeta;

    /// 获取集合名称
    fn collection_name() -> &'static str {
        Self::meta().collection_name.as_str()
    }

    /// 主键字段名
    fn primary_key_field() -> Option<&'static str> {
        Self::meta().primary_key_field()
    }

    /// 唯一字段列表（包含主键）
    fn unique_fields() -> Vec<&'static str> {
        Self::meta().unique_fields()
    }

    /// 获取字段配置
    fn field_config(name: &str) -> Option<&'static FieldConfig> {
        Self::meta().field(name)
    }

    /// 从字段映射构造模型
    ///
    /// 未定义字段被拒绝，缺失字段使用默认值，所有字段值经过验证
    fn build(data: DataMap) -> NormaResult<Self> {
        let prepared = Self::meta().prepare(data)?;
        Self::from_prepared(prepared)
    }

    /// 从字典构造，与 `build` 等价
    fn from_dict(data: DataMap) -> NormaResult<Self> {
        Self::build(data)
    }

    /// 从 JSON 对象构造
    fn from_json(value: serde_json::Value) -> NormaResult<Self> {
        match value {
            serde_json::Value::Object(object) => {
                let data: DataMap = object
                    .into_iter()
                    .map(|(k, v)| (k, DataValue::from_json_value(v)))
                    .collect();
                Self::build(data)
            }
            other => Err(NormaError::ValidationError {
                field: "body".to_string(),
                message: format!("期望JSON对象，实际为: {}", other),
            }),
        }
    }

    /// 转换为字典，包含每个声明的字段
    fn to_dict(&self) -> NormaResult<DataMap> {
        let json = serde_json::to_value(self)?;
        let object = match json {
            serde_json::Value::Object(object) => object,
            other => {
                return Err(NormaError::SerializationError {
                    message: format!("模型序列化结果不是对象: {}", other),
                })
            }
        };

        let meta = Self::meta();
        let mut map = DataMap::with_capacity(meta.fields.len());
        for (name, config) in &meta.fields {
            let raw = object.get(name).cloned().unwrap_or(serde_json::Value::Null);
            let value = config.coerce(name, DataValue::from_json_value(raw))?;
            map.insert(name.clone(), value);
        }
        Ok(map)
    }

    /// 转换为 JSON 对象（日期时间为 RFC3339 文本）
    fn to_json(&self) -> NormaResult<serde_json::Value> {
        Ok(data_map_to_json(&self.to_dict()?))
    }

    /// 重新验证当前实例
    fn validate(&self) -> NormaResult<()> {
        let map = self.to_dict()?;
        Self::meta().validate_map(&map)
    }

    /// 主键值
    fn primary_key_value(&self) -> NormaResult<DataValue> {
        let pk = Self::primary_key_field().ok_or_else(|| NormaError::ConfigError {
            message: format!("模型 {} 没有声明主键字段", Self::collection_name()),
        })?;
        let mut map = self.to_dict()?;
        Ok(map.remove(pk).unwrap_or(DataValue::Null))
    }

    /// 部分更新：每个变更先验证，任一失败时实例保持不变；主键不可修改
    fn update(&mut self, changes: DataMap) -> NormaResult<()> {
        let meta = Self::meta();
        let mut current = self.to_dict()?;

        for (name, value) in changes {
            let config = meta.field(&name).ok_or_else(|| NormaError::ValidationError {
                field: name.clone(),
                message: format!("字段未在模型 {} 中定义", meta.collection_name),
            })?;
            let coerced = config.coerce(&name, value)?;
            if config.primary_key && current.get(&name) != Some(&coerced) {
                return Err(NormaError::ValidationError {
                    field: name,
                    message: "主键不可修改".to_string(),
                });
            }
            config.validate(&name, &coerced)?;
            current.insert(name, coerced);
        }

        *self = Self::from_prepared(current)?;
        Ok(())
    }

    /// 由已准备好的字段映射反序列化为结构体
    #[doc(hidden)]
    fn from_prepared(data: DataMap) -> NormaResult<Self> {
        let json = data_map_to_json(&data);
        serde_json::from_value(json).map_err(|e| {
            debug!("❌ 模型 {} 反序列化失败: {}", Self::collection_name(), e);
            NormaError::SerializationError {
                message: format!("无法构造模型 {}: {}", Self::collection_name(), e),
            }
        })
    }
}
