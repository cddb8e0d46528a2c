//! 示例数据模型
//!
//! 用户和文章两个模型，供示例服务和演示程序使用

mod post;
mod user;

pub use post::Post;
pub use user::{User, EMAIL_PATTERN};
