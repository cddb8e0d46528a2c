//! HTTP 路由

pub mod health;
pub mod posts;
pub mod users;

use serde::Deserialize;

/// 分页参数
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

pub(crate) fn default_limit() -> u64 {
    100
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl Pagination {
    pub fn to_options(self) -> crate::types::FindOptions {
        crate::types::FindOptions::new().paginate(self.skip, self.limit)
    }
}
