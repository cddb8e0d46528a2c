//! 模型定义系统模块
//!
//! 通过结构体 + 显式字段配置声明数据模型，
//! 提供字段验证、默认值、字典转换等功能

pub mod convenience;
pub mod field_types;
pub mod macros;
pub mod traits;

pub use convenience::*;
pub use field_types::{DefaultFactory, FieldConfig, FieldKind, ModelMeta, Relationship};
pub use traits::Model;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_map;
    use crate::error::NormaError;
    use crate::types::DataValue;

    crate::define_model! {
        /// 测试用模型
        struct Gadget {
            id: String,
            label: String,
            weight: f64,
            tags: serde_json::Value,
            active: bool,
            made_at: Option<chrono::DateTime<chrono::Utc>>,
        }
        collection = "gadgets",
        fields = {
            id: string_field().primary_key().default_factory(factories::uuid_hex),
            label: string_field().min_length(1).max_length(10),
            weight: float_field().min_value(0).default(1.0),
            tags: json_field().default(serde_json::json!([])),
            active: boolean_field().default(true),
            made_at: datetime_field().nullable().default_factory(factories::now),
        }
        , description = "gadget"
    }

    #[test]
    fn test_macro_generates_meta() {
        let meta = Gadget::meta();
        assert_eq!(Gadget::collection_name(), "gadgets");
        assert_eq!(Gadget::primary_key_field(), Some("id"));
        assert_eq!(meta.fields.len(), 6);
        assert_eq!(meta.description.as_deref(), Some("gadget"));
        assert!(meta.check().is_ok());
        // 元数据只构建一次
        assert!(std::ptr::eq(Gadget::meta(), meta));
    }

    #[test]
    fn test_build_and_round_trip() {
        let gadget = Gadget::build(data_map! { "label" => "lamp", "weight" => 2 }).unwrap();
        assert_eq!(gadget.weight, 2.0);
        assert!(gadget.active);
        assert_eq!(gadget.tags, serde_json::json!([]));
        assert!(gadget.made_at.is_some());

        let dict = gadget.to_dict().unwrap();
        assert_eq!(dict.len(), 6);
        let again = Gadget::from_dict(dict).unwrap();
        assert_eq!(again, gadget);

        let json = gadget.to_json().unwrap();
        assert_eq!(Gadget::from_json(json).unwrap(), gadget);
    }

    #[test]
    fn test_update_is_atomic_and_keeps_primary_key() {
        let mut gadget = Gadget::build(data_map! { "label" => "lamp" }).unwrap();
        let original = gadget.clone();

        let err = gadget
            .update(data_map! { "label" => "desk", "weight" => -1.0 })
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(gadget, original);

        let err = gadget.update(data_map! { "id" => "other" }).unwrap_err();
        assert!(matches!(err, NormaError::ValidationError { ref field, .. } if field == "id"));

        gadget.update(data_map! { "label" => "desk" }).unwrap();
        assert_eq!(gadget.label, "desk");
        assert_eq!(gadget.id, original.id);
        assert_eq!(gadget.primary_key_value().unwrap(), DataValue::String(original.id));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(Gadget::from_json(serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn test_validate_detects_mutated_instance() {
        let mut gadget = Gadget::build(data_map! { "label" => "lamp" }).unwrap();
        assert!(gadget.validate().is_ok());
        gadget.label = String::new();
        assert!(gadget.validate().is_err());
    }
    crate::define_model! {
        /// 带可空 JSON 字段的测试模型
        struct Note {
            id: String,
            body: serde_json::Value,
        }
        collection = "notes",
        fields = {
            id: string_field().primary_key(),
            body: json_field().nullable(),
        }
    }

    #[test]
    fn test_json_null_follows_nullable_rule() {
        let err = Gadget::build(data_map! { "label" => "lamp", "tags" => serde_json::Value::Null })
            .unwrap_err();
        assert!(matches!(err, NormaError::ValidationError { ref field, .. } if field == "tags"));

        let note = Note::build(data_map! { "id" => "n1", "body" => serde_json::Value::Null }).unwrap();
        assert_eq!(note.body, serde_json::Value::Null);
        let dict = note.to_dict().unwrap();
        assert_eq!(dict.get("body"), Some(&DataValue::Null));
        assert_eq!(Note::from_dict(dict).unwrap(), note);
    }

    #[test]
    fn test_json_values_round_trip() {
        for body in [
            serde_json::json!({"a": [1, 2, {"b": null}]}),
            serde_json::json!([]),
            serde_json::json!("text"),
            serde_json::json!(3.5),
        ] {
            let note = Note::build(data_map! { "id" => "n2", "body" => body.clone() }).unwrap();
            assert_eq!(note.body, body);
            assert_eq!(Note::from_dict(note.to_dict().unwrap()).unwrap(), note);
        }
    }
}
