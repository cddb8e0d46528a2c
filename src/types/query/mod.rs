use crate::types::data_value::{DataMap, DataValue};
use serde::{Deserialize, Serialize};

/// 查询条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCondition {
    /// 字段名
    pub field: String,
    /// 操作符
    pub operator: QueryOperator,
    /// 值
    pub value: DataValue,
}

/// 查询操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryOperator {
    /// 等于
    Eq,
    /// 不等于
    Ne,
    /// 大于
    Gt,
    /// 大于等于
    Gte,
    /// 小于
    Lt,
    /// 小于等于
    Lte,
    /// 在列表中（值为 JSON 数组）
    In,
}

impl QueryOperator {
    /// SQL 运算符文本
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            QueryOperator::Eq => "=",
            QueryOperator::Ne => "<>",
            QueryOperator::Gt => ">",
            QueryOperator::Gte => ">=",
            QueryOperator::Lt => "<",
            QueryOperator::Lte => "<=",
            QueryOperator::In => "IN",
        }
    }
}

/// 查询过滤器，所有条件之间为 AND 关系
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub conditions: Vec<QueryCondition>,
}

impl Filter {
    /// 创建空过滤器（匹配所有记录）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从等值映射创建过滤器
    pub fn from_map(map: DataMap) -> Self {
        let mut entries: Vec<(String, DataValue)> = map.into_iter().collect();
        // 固定字段顺序，保证生成的语句稳定
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let conditions = entries
            .into_iter()
            .map(|(field, value)| QueryCondition {
                field,
                operator: QueryOperator::Eq,
                value,
            })
            .collect();
        Self { conditions }
    }

    /// 是否没有任何条件
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// 追加条件
    pub fn with(mut self, field: &str, operator: QueryOperator, value: impl Into<DataValue>) -> Self {
        self.conditions.push(QueryCondition {
            field: field.to_string(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.with(field, QueryOperator::Eq, value)
    }

    pub fn ne(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.with(field, QueryOperator::Ne, value)
    }

    pub fn gt(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.with(field, QueryOperator::Gt, value)
    }

    pub fn gte(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.with(field, QueryOperator::Gte, value)
    }

    pub fn lt(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.with(field, QueryOperator::Lt, value)
    }

    pub fn lte(self, field: &str, value: impl Into<DataValue>) -> Self {
        self.with(field, QueryOperator::Lte, value)
    }

    /// 字段值在给定列表中
    pub fn is_in<V: Into<DataValue>>(self, field: &str, values: Vec<V>) -> Self {
        let items: Vec<serde_json::Value> = values
            .into_iter()
            .map(|v| v.into().to_json_value())
            .collect();
        self.with(field, QueryOperator::In, DataValue::Json(serde_json::Value::Array(items)))
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// 升序
    Asc,
    /// 降序
    Desc,
}

/// 查询选项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindOptions {
    /// 跳过的记录数
    pub offset: u64,
    /// 限制返回的记录数
    pub limit: Option<u64>,
    /// 排序配置
    pub sort: Vec<(String, SortDirection)>,
}

impl FindOptions {
    /// 创建新的查询选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置分页
    pub fn paginate(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// 追加排序字段
    pub fn sort_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort.push((field.to_string(), direction));
        self
    }
}
