//! 基础类型定义
//!
//! 定义支持的数据库类型、通用数据值和查询条件

pub mod data_value;
pub mod database_config;
pub mod query;

// 重新导出所有公共类型
pub use data_value::{data_map_to_json, format_datetime, parse_datetime, DataMap, DataValue};
pub use database_config::{AdapterKind, DatabaseType};
pub use query::{FindOptions, Filter, QueryCondition, QueryOperator, SortDirection};
