//! 字段配置定义模块
//!
//! 每个字段携带一个显式的配置结构（约束 + 元数据），
//! 由便捷函数创建、链式设置，并在注册模型时统一检查

use crate::error::{NormaError, NormaResult};
use crate::types::{parse_datetime, DataMap, DataValue};
use rat_logger::debug;
use serde::{Deserialize, Serialize};

/// 字段值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// 字符串
    String,
    /// 整数
    Integer,
    /// 浮点数
    Float,
    /// 布尔
    Boolean,
    /// 日期时间（UTC）
    DateTime,
    /// 任意 JSON
    Json,
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Float)
    }
}

/// 关系声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    /// 多对一：当前字段保存目标集合中 `foreign_key` 字段的值
    ManyToOne { target: String, foreign_key: String },
}

impl Relationship {
    /// 创建多对一关系
    pub fn many_to_one(target: &str, foreign_key: &str) -> Self {
        Relationship::ManyToOne {
            target: target.to_string(),
            foreign_key: foreign_key.to_string(),
        }
    }

    /// 目标集合/表名
    pub fn target(&self) -> &str {
        match self {
            Relationship::ManyToOne { target, .. } => target,
        }
    }

    /// 目标集合中被引用的字段
    pub fn foreign_key(&self) -> &str {
        match self {
            Relationship::ManyToOne { foreign_key, .. } => foreign_key,
        }
    }
}

/// 默认值工厂函数
pub type DefaultFactory = fn() -> DataValue;

/// 字段配置
#[derive(Debug, Clone)]
pub struct FieldConfig {
    /// 值类型
    pub kind: FieldKind,
    /// 是否主键
    pub primary_key: bool,
    /// 是否唯一
    pub unique: bool,
    /// 是否建立索引
    pub index: bool,
    /// 是否允许为空
    pub nullable: bool,
    /// 最小长度（按字符计）
    pub min_length: Option<usize>,
    /// 最大长度（按字符计）
    pub max_length: Option<usize>,
    /// 最小值
    pub min_value: Option<f64>,
    /// 最大值
    pub max_value: Option<f64>,
    /// 正则表达式
    pub regex_pattern: Option<String>,
    /// 默认值
    pub default: Option<DataValue>,
    /// 默认值工厂
    pub default_factory: Option<DefaultFactory>,
    /// 关系声明
    pub relationship: Option<Relationship>,
    /// 字段描述
    pub description: Option<String>,
}

impl FieldConfig {
    /// 创建新的字段配置
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            primary_key: false,
            unique: false,
            index: false,
            nullable: false,
            min_length: None,
            max_length: None,
            min_value: None,
            max_value: None,
            regex_pattern: None,
            default: None,
            default_factory: None,
            relationship: None,
            description: None,
        }
    }

    /// 设置为主键
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// 设置为唯一字段
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// 设置为索引字段
    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// 允许为空
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn min_value(mut self, min_value: impl Into<f64>) -> Self {
        self.min_value = Some(min_value.into());
        self
    }

    pub fn max_value(mut self, max_value: impl Into<f64>) -> Self {
        self.max_value = Some(max_value.into());
        self
    }

    /// 设置正则表达式
    pub fn regex_pattern(mut self, pattern: &str) -> Self {
        self.regex_pattern = Some(pattern.to_string());
        self
    }

    /// 设置默认值
    pub fn default(mut self, value: impl Into<DataValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// 设置默认值工厂（每次构造时调用）
    pub fn default_factory(mut self, factory: DefaultFactory) -> Self {
        self.default_factory = Some(factory);
        self
    }

    /// 设置关系
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = Some(relationship);
        self
    }

    /// 设置字段描述
    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// 是否声明了默认值或默认值工厂
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.default_factory.is_some()
    }

    /// 计算默认值，工厂优先
    pub fn resolve_default(&self) -> Option<DataValue> {
        if let Some(factory) = self.default_factory {
            return Some(factory());
        }
        self.default.clone()
    }

    /// 检查配置本身是否自洽
    pub fn check(&self, field_name: &str) -> NormaResult<()> {
        let fail = |message: String| NormaError::ConfigError {
            message: format!("字段 {}: {}", field_name, message),
        };

        let has_length = self.min_length.is_some() || self.max_length.is_some();
        if has_length && self.kind != FieldKind::String {
            return Err(fail("长度约束只能用于字符串字段".to_string()));
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(fail(format!("最小长度{}大于最大长度{}", min, max)));
            }
        }

        let has_range = self.min_value.is_some() || self.max_value.is_some();
        if has_range && !self.kind.is_numeric() {
            return Err(fail("数值范围只能用于数值字段".to_string()));
        }
        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                return Err(fail(format!("最小值{}大于最大值{}", min, max)));
            }
        }

        if let Some(pattern) = &self.regex_pattern {
            if self.kind != FieldKind::String {
                return Err(fail("正则表达式只能用于字符串字段".to_string()));
            }
            regex::Regex::new(pattern).map_err(|e| fail(format!("正则表达式无效: {}", e)))?;
        }

        if self.primary_key && self.nullable {
            return Err(fail("主键不能允许为空".to_string()));
        }

        if let Some(relationship) = &self.relationship {
            if relationship.target().is_empty() || relationship.foreign_key().is_empty() {
                return Err(fail("关系必须指定目标集合和外键字段".to_string()));
            }
        }

        if let Some(default) = &self.default {
            let coerced = self
                .coerce(field_name, default.clone())
                .map_err(|e| fail(format!("默认值无效: {}", e)))?;
            self.validate(field_name, &coerced)
                .map_err(|e| fail(format!("默认值无效: {}", e)))?;
        }

        Ok(())
    }

    /// 将值规范化为字段类型
    ///
    /// 外部输入（JSON、数据库行）里的日期时间通常是文本，整数可能出现在浮点字段里
    ///
    /// JSON 的 `null` 与空值等价，可空规则对两者一致
    pub fn coerce(&self, field_name: &str, value: DataValue) -> NormaResult<DataValue> {
        if value.is_null() || value == DataValue::Json(serde_json::Value::Null) {
            return Ok(DataValue::Null);
        }

        let coerced = match (self.kind, value) {
            (FieldKind::DateTime, DataValue::String(text)) => match parse_datetime(&text) {
                Some(dt) => DataValue::DateTime(dt),
                None => {
                    return Err(NormaError::ValidationError {
                        field: field_name.to_string(),
                        message: format!("无效的日期时间格式: '{}'", text),
                    })
                }
            },
            (FieldKind::Float, DataValue::Int(i)) => DataValue::Float(i as f64),
            (FieldKind::Integer, DataValue::Float(f)) if f.fract() == 0.0 => DataValue::Int(f as i64),
            (FieldKind::Json, DataValue::Json(json)) => DataValue::Json(json),
            (FieldKind::Json, other) => DataValue::Json(other.to_json_value()),
            (_, other) => other,
        };

        Ok(coerced)
    }

    /// 验证字段值
    pub fn validate(&self, field_name: &str, value: &DataValue) -> NormaResult<()> {
        let fail = |message: String| NormaError::ValidationError {
            field: field_name.to_string(),
            message,
        };

        if value.is_null() {
            if self.nullable {
                return Ok(());
            }
            return Err(fail("必填字段不能为空".to_string()));
        }

        match self.kind {
            FieldKind::String => {
                let s = value
                    .as_str()
                    .ok_or_else(|| fail(format!("字段类型不匹配，期望字符串类型，实际为{}", value.type_name())))?;
                let length = s.chars().count();
                if let Some(min_len) = self.min_length {
                    if length < min_len {
                        return Err(fail(format!("字符串长度不能少于{}", min_len)));
                    }
                }
                if let Some(max_len) = self.max_length {
                    if length > max_len {
                        return Err(fail(format!("字符串长度不能超过{}", max_len)));
                    }
                }
                if let Some(pattern) = &self.regex_pattern {
                    let regex = regex::Regex::new(pattern)
                        .map_err(|e| fail(format!("正则表达式无效: {}", e)))?;
                    if !regex.is_match(s) {
                        debug!("❌ 字段 {} 不匹配正则表达式 {}", field_name, pattern);
                        return Err(fail("字符串不匹配正则表达式".to_string()));
                    }
                }
            }
            FieldKind::Integer | FieldKind::Float => {
                let number = match (self.kind, value) {
                    (FieldKind::Integer, DataValue::Int(i)) => *i as f64,
                    (FieldKind::Float, DataValue::Float(f)) => *f,
                    (FieldKind::Float, DataValue::Int(i)) => *i as f64,
                    _ => {
                        let expected = if self.kind == FieldKind::Integer { "整数" } else { "浮点数" };
                        return Err(fail(format!(
                            "字段类型不匹配，期望{}类型，实际为{}",
                            expected,
                            value.type_name()
                        )));
                    }
                };
                if let Some(min_val) = self.min_value {
                    if number < min_val {
                        return Err(fail(format!("数值不能小于{}", min_val)));
                    }
                }
                if let Some(max_val) = self.max_value {
                    if number > max_val {
                        return Err(fail(format!("数值不能大于{}", max_val)));
                    }
                }
            }
            FieldKind::Boolean => {
                if !matches!(value, DataValue::Bool(_)) {
                    return Err(fail(format!("字段类型不匹配，期望布尔类型，实际为{}", value.type_name())));
                }
            }
            FieldKind::DateTime => {
                if !matches!(value, DataValue::DateTime(_)) {
                    return Err(fail(format!("字段类型不匹配，期望日期时间类型，实际为{}", value.type_name())));
                }
            }
            FieldKind::Json => {
                // JSON类型可以接受任何值
            }
        }

        Ok(())
    }
}

/// 模型元数据
#[derive(Debug, Clone)]
pub struct ModelMeta {
    /// 集合/表名
    pub collection_name: String,
    /// 字段定义（保持声明顺序）
    pub fields: Vec<(String, FieldConfig)>,
    /// 模型描述
    pub description: Option<String>,
}

impl ModelMeta {
    pub fn new(collection_name: &str, fields: Vec<(String, FieldConfig)>) -> Self {
        Self {
            collection_name: collection_name.to_string(),
            fields,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// 获取字段配置
    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, config)| config)
    }

    /// 字段名列表（声明顺序）
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// 主键字段名
    pub fn primary_key_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, config)| config.primary_key)
            .map(|(name, _)| name.as_str())
    }

    /// 唯一字段（主键总是包含在内）
    pub fn unique_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, config)| config.primary_key || config.unique)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// 声明了索引提示的字段
    pub fn indexed_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, config)| config.index)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// 关系字段
    pub fn relationships(&self) -> Vec<(&str, &Relationship)> {
        self.fields
            .iter()
            .filter_map(|(name, config)| config.relationship.as_ref().map(|r| (name.as_str(), r)))
            .collect()
    }

    /// 检查模型元数据：恰好一个主键，且每个字段配置自洽
    pub fn check(&self) -> NormaResult<()> {
        let primary_keys: Vec<&str> = self
            .fields
            .iter()
            .filter(|(_, config)| config.primary_key)
            .map(|(name, _)| name.as_str())
            .collect();
        match primary_keys.len() {
            1 => {}
            0 => {
                return Err(NormaError::ConfigError {
                    message: format!("模型 {} 没有声明主键字段", self.collection_name),
                })
            }
            _ => {
                return Err(NormaError::ConfigError {
                    message: format!(
                        "模型 {} 声明了多个主键字段: {}",
                        self.collection_name,
                        primary_keys.join(", ")
                    ),
                })
            }
        }

        for (name, config) in &self.fields {
            config.check(name)?;
        }
        Ok(())
    }

    /// 构造前的数据准备：拒绝未定义字段，填充默认值，规范化并验证每个字段
    pub fn prepare(&self, mut data: DataMap) -> NormaResult<DataMap> {
        if let Some(unknown) = data.keys().find(|key| self.field(key).is_none()) {
            return Err(NormaError::ValidationError {
                field: unknown.clone(),
                message: format!("字段未在模型 {} 中定义", self.collection_name),
            });
        }

        let mut prepared = DataMap::with_capacity(self.fields.len());
        for (name, config) in &self.fields {
            let raw = match data.remove(name) {
                Some(value) => value,
                None => config.resolve_default().unwrap_or(DataValue::Null),
            };
            let value = config.coerce(name, raw)?;
            config.validate(name, &value)?;
            prepared.insert(name.clone(), value);
        }
        Ok(prepared)
    }

    /// 验证一个完整的数据映射
    pub fn validate_map(&self, data: &DataMap) -> NormaResult<()> {
        for (name, config) in &self.fields {
            let value = data.get(name).unwrap_or(&DataValue::Null);
            config.validate(name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_map;
    use crate::model::convenience::*;

    #[test]
    fn test_field_configuration_with_all_options() {
        let config = string_field()
            .primary_key()
            .unique()
            .index()
            .min_length(1)
            .max_length(100)
            .description("Test field");

        assert!(config.primary_key);
        assert!(config.unique);
        assert!(config.index);
        assert!(!config.nullable);
        assert_eq!(config.min_length, Some(1));
        assert_eq!(config.max_length, Some(100));
        assert_eq!(config.description.as_deref(), Some("Test field"));
        assert!(config.check("name").is_ok());

        let number = integer_field().min_value(0).max_value(150);
        assert_eq!(number.min_value, Some(0.0));
        assert_eq!(number.max_value, Some(150.0));
        assert!(number.check("age").is_ok());
    }

    #[test]
    fn test_inconsistent_configs_are_rejected() {
        assert!(string_field().min_length(5).max_length(1).check("name").is_err());
        assert!(integer_field().min_length(1).check("age").is_err());
        assert!(string_field().min_value(1).check("name").is_err());
        assert!(integer_field().min_value(10).max_value(1).check("age").is_err());
        assert!(string_field().regex_pattern("(").check("email").is_err());
        assert!(string_field().primary_key().nullable().check("id").is_err());
        assert!(integer_field().min_value(0).default(-1).check("age").is_err());
        assert!(string_field()
            .relationship(Relationship::many_to_one("", "id"))
            .check("author_id")
            .is_err());
    }

    #[test]
    fn test_validate_string_constraints() {
        let config = string_field()
            .min_length(1)
            .max_length(5)
            .regex_pattern(r"^[a-z]+$");
        assert!(config.validate("name", &DataValue::from("abc")).is_ok());

        let err = config.validate("name", &DataValue::from("")).unwrap_err();
        assert!(matches!(err, NormaError::ValidationError { ref field, .. } if field == "name"));
        assert!(config.validate("name", &DataValue::from("abcdef")).is_err());
        assert!(config.validate("name", &DataValue::from("ABC")).is_err());
        assert!(config.validate("name", &DataValue::Int(1)).is_err());
        // 按字符而非字节计长度
        assert!(string_field().max_length(2).validate("name", &DataValue::from("张三")).is_ok());
    }

    #[test]
    fn test_validate_null_and_nullable() {
        assert!(string_field().validate("name", &DataValue::Null).is_err());
        assert!(datetime_field().nullable().validate("created_at", &DataValue::Null).is_ok());
    }

    #[test]
    fn test_coerce_datetime_and_numbers() {
        let dt = datetime_field()
            .coerce("created_at", DataValue::from("2024-05-01T08:30:00Z"))
            .unwrap();
        assert!(matches!(dt, DataValue::DateTime(_)));
        assert!(datetime_field().coerce("created_at", DataValue::from("yesterday")).is_err());
        assert_eq!(
            float_field().coerce("score", DataValue::Int(3)).unwrap(),
            DataValue::Float(3.0)
        );
        assert_eq!(
            integer_field().coerce("age", DataValue::Float(3.0)).unwrap(),
            DataValue::Int(3)
        );
    }

    fn sample_meta() -> ModelMeta {
        ModelMeta::new(
            "people",
            vec![
                ("id".to_string(), string_field().primary_key().default_factory(factories::uuid_hex)),
                ("name".to_string(), string_field().min_length(1).index()),
                ("email".to_string(), string_field().unique()),
                ("age".to_string(), integer_field().default(0).min_value(0).max_value(150)),
            ],
        )
    }

    #[test]
    fn test_meta_queries() {
        let meta = sample_meta();
        assert!(meta.check().is_ok());
        assert_eq!(meta.primary_key_field(), Some("id"));
        assert_eq!(meta.unique_fields(), vec!["id", "email"]);
        assert_eq!(meta.indexed_fields(), vec!["name"]);
        assert_eq!(meta.field_names(), vec!["id", "name", "email", "age"]);
    }

    #[test]
    fn test_meta_requires_single_primary_key() {
        let none = ModelMeta::new("t", vec![("name".to_string(), string_field())]);
        assert!(matches!(none.check(), Err(NormaError::ConfigError { .. })));

        let two = ModelMeta::new(
            "t",
            vec![
                ("a".to_string(), string_field().primary_key()),
                ("b".to_string(), string_field().primary_key()),
            ],
        );
        assert!(two.check().is_err());
    }

    #[test]
    fn test_prepare_fills_defaults_and_rejects_unknown() {
        let meta = sample_meta();
        let prepared = meta
            .prepare(data_map! { "name" => "Ann", "email" => "ann@example.com" })
            .unwrap();
        assert_eq!(prepared.get("age"), Some(&DataValue::Int(0)));
        assert!(matches!(prepared.get("id"), Some(DataValue::String(id)) if id.len() == 32));

        let err = meta
            .prepare(data_map! { "name" => "Ann", "email" => "a@b.c", "nickname" => "x" })
            .unwrap_err();
        assert!(matches!(err, NormaError::ValidationError { ref field, .. } if field == "nickname"));

        // 缺少必填字段
        assert!(meta.prepare(data_map! { "name" => "Ann" }).is_err());
    }
}
