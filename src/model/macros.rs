//! 模型相关的宏定义
//!
//! 提供便捷的宏来定义模型和构造字段映射

/// 便捷宏：构造 `DataMap`
///
/// ```ignore
/// let data = data_map! { "name" => "Alice", "age" => 30 };
/// ```
#[macro_export]
macro_rules! data_map {
    () => {
        $crate::types::DataMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::types::DataMap::new();
        $(
            map.insert($key.to_string(), $crate::types::DataValue::from($value));
        )+
        map
    }};
}

/// 便捷宏：定义模型
///
/// 生成结构体（派生 Debug/Clone/PartialEq/Serialize/Deserialize）并实现 `Model`，
/// 字段配置在首次访问时构建一次
#[macro_export]
macro_rules! define_model {
    (
        $(#[$struct_meta:meta])*
        struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $field_type:ty
            ),* $(,)?
        }
        collection = $collection:expr,
        fields = {
            $(
                $field_name:ident : $field_def:expr
            ),* $(,)?
        }
        $(, description = $description:expr)?
    ) => {
        $(#[$struct_meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $field_type,
            )*
        }

        impl $crate::model::Model for $name {
            fn meta() -> &'static $crate::model::ModelMeta {
                static META: std::sync::OnceLock<$crate::model::ModelMeta> = std::sync::OnceLock::new();
                META.get_or_init(|| {
                    let fields: Vec<(String, $crate::model::FieldConfig)> = vec![
                        $(
                            (stringify!($field_name).to_string(), $field_def),
                        )*
                    ];
                    #[allow(unused_mut)]
                    let mut meta = $crate::model::ModelMeta::new($collection, fields);
                    $(
                        meta = meta.with_description($description);
                    )?
                    meta
                })
            }
        }
    };
}
