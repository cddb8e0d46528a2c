use crate::define_model;
use crate::model::*;

define_model! {
    /// 文章模型
    struct Post {
        id: String,
        title: String,
        content: String,
        author_id: String,
        published: bool,
        created_at: Option<chrono::DateTime<chrono::Utc>>,
        updated_at: Option<chrono::DateTime<chrono::Utc>>,
    }
    collection = "posts",
    fields = {
        id: string_field()
            .primary_key()
            .default_factory(factories::uuid_hex)
            .description("文章唯一标识"),
        title: string_field()
            .min_length(1)
            .max_length(200)
            .index()
            .description("标题"),
        content: string_field()
            .min_length(1)
            .description("正文"),
        author_id: string_field()
            .relationship(Relationship::many_to_one("users", "id"))
            .description("作者"),
        published: boolean_field()
            .default(false)
            .index()
            .description("是否发布"),
        created_at: datetime_field()
            .nullable()
            .default_factory(factories::now)
            .index()
            .description("创建时间"),
        updated_at: datetime_field()
            .nullable()
            .default_factory(factories::now)
            .description("更新时间"),
    }
    , description = "文章"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_map;

    #[test]
    fn test_post_defaults_and_relationship() {
        let post = Post::build(data_map! {
            "title" => "Hello",
            "content" => "World",
            "author_id" => "abc",
        })
        .unwrap();
        assert!(!post.published);
        assert!(post.created_at.is_some());
        assert!(post.updated_at.is_some());

        let relationships = Post::meta().relationships();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].0, "author_id");
        assert_eq!(relationships[0].1.target(), "users");
        assert_eq!(
            Post::meta().indexed_fields(),
            vec!["title", "published", "created_at"]
        );
    }

    #[test]
    fn test_post_requires_content_and_author() {
        assert!(Post::build(data_map! { "title" => "t", "content" => "", "author_id" => "a" }).is_err());
        assert!(Post::build(data_map! { "title" => "t", "content" => "c" }).is_err());
        assert!(Post::build(data_map! { "title" => "x".repeat(201), "content" => "c", "author_id" => "a" }).is_err());
    }
}
