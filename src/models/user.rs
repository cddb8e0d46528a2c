use crate::define_model;
use crate::model::*;

/// 邮箱格式
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

define_model! {
    /// 用户模型
    struct User {
        id: String,
        name: String,
        email: String,
        age: i64,
        is_active: bool,
        created_at: Option<chrono::DateTime<chrono::Utc>>,
    }
    collection = "users",
    fields = {
        id: string_field()
            .primary_key()
            .default_factory(factories::uuid_hex)
            .description("用户唯一标识"),
        name: string_field()
            .min_length(1)
            .max_length(100)
            .index()
            .description("用户姓名"),
        email: string_field()
            .unique()
            .max_length(255)
            .regex_pattern(EMAIL_PATTERN)
            .description("邮箱地址"),
        age: integer_field()
            .default(0)
            .min_value(0)
            .max_value(150)
            .description("年龄"),
        is_active: boolean_field()
            .default(true)
            .description("账户是否启用"),
        created_at: datetime_field()
            .nullable()
            .default_factory(factories::now)
            .description("创建时间"),
    }
    , description = "用户"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_map;
    use crate::error::NormaError;

    #[test]
    fn test_user_defaults() {
        let user = User::build(data_map! {
            "name" => "John Doe",
            "email" => "john@example.com",
        })
        .unwrap();
        assert_eq!(user.age, 0);
        assert!(user.is_active);
        assert!(user.created_at.is_some());
        assert_eq!(user.id.len(), 32);
    }

    #[test]
    fn test_user_constraints() {
        let invalid_email = User::build(data_map! { "name" => "A", "email" => "not-an-email" });
        assert!(matches!(invalid_email, Err(NormaError::ValidationError { ref field, .. }) if field == "email"));

        let too_old = User::build(data_map! { "name" => "A", "email" => "a@b.io", "age" => 151 });
        assert!(matches!(too_old, Err(NormaError::ValidationError { ref field, .. }) if field == "age"));

        let empty_name = User::build(data_map! { "name" => "", "email" => "a@b.io" });
        assert!(empty_name.is_err());

        let long_name = "x".repeat(101);
        assert!(User::build(data_map! { "name" => long_name, "email" => "a@b.io" }).is_err());
        assert!(User::build(data_map! { "name" => "x".repeat(100), "email" => "a@b.io", "age" => 150 }).is_ok());
    }

    #[test]
    fn test_user_metadata() {
        assert!(User::meta().check().is_ok());
        assert_eq!(User::collection_name(), "users");
        assert_eq!(User::unique_fields(), vec!["id", "email"]);
        assert_eq!(User::meta().indexed_fields(), vec!["name"]);
    }
    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut user = User::build(data_map! {
            "name" => "John Doe",
            "email" => "john@example.com",
            "age" => 30,
        })
        .unwrap();
        let before = user.clone();

        user.update(data_map! { "name" => "Jane Doe", "age" => 31 }).unwrap();
        assert_eq!(user.name, "Jane Doe");
        assert_eq!(user.age, 31);
        assert_eq!(user.email, before.email);
        assert_eq!(user.is_active, before.is_active);
        assert_eq!(user.created_at, before.created_at);
        assert_eq!(user.id, before.id);
    }
}
