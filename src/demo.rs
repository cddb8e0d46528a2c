//! 演示流程
//!
//! 在一个连接作用域内建表、写入一个用户和一篇已发布文章，再做两次查询

use crate::client::NormaClient;
use crate::data_map;
use crate::error::NormaResult;
use crate::model::Model;
use crate::models::{Post, User};
use crate::types::{FindOptions, Filter};
use rat_logger::info;

/// 演示用户的邮箱
pub const DEMO_EMAIL: &str = "john@example.com";

/// 演示结果
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub user: User,
    pub post: Post,
    pub user_count: usize,
    pub published_count: usize,
}

/// 运行演示，结束时总会断开连接
pub async fn run_demo(client: &NormaClient) -> NormaResult<DemoReport> {
    client
        .with_connection(|client| async move {
            let users = client.model_client::<User>()?;
            let posts = client.model_client::<Post>()?;
            users.create_table().await?;
            posts.create_table().await?;

            // 邮箱唯一，重复运行时复用已有用户
            let user = match users.find_one(Filter::new().eq("email", DEMO_EMAIL)).await? {
                Some(existing) => {
                    info!("复用已有用户: {}", existing.id);
                    existing
                }
                None => {
                    let user = User::build(data_map! {
                        "name" => "John Doe",
                        "email" => DEMO_EMAIL,
                        "age" => 30,
                    })?;
                    users.insert(&user).await?
                }
            };
            println!("Created user: {}", user.to_json()?);

            let post = Post::build(data_map! {
                "title" => "Hello Norma!",
                "content" => "This is my first post using Norma ORM.",
                "author_id" => user.id.clone(),
                "published" => true,
            })?;
            let post = posts.insert(&post).await?;
            println!("Created post: {}", post.to_json()?);

            let user_count = users.find_many(Filter::new(), FindOptions::new()).await?.len();
            println!("Found {} users", user_count);

            let published_count = posts
                .find_many(Filter::new().eq("published", true), FindOptions::new())
                .await?
                .len();
            println!("Found {} published posts", published_count);

            Ok(DemoReport {
                user,
                post,
                user_count,
                published_count,
            })
        })
        .await
}
