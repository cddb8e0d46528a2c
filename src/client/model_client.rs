//! 单个模型的类型化操作入口

use crate::client::NormaClient;
use crate::error::{NormaError, NormaResult};
use crate::model::Model;
use crate::types::*;
use std::marker::PhantomData;

/// 模型操作客户端
///
/// 所有写入在到达存储之前都经过模型验证，读出的记录重新构造为模型实例
pub struct ModelClient<T: Model> {
    client: NormaClient,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Model> Clone for ModelClient<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Model> ModelClient<T> {
    pub(crate) fn new(client: NormaClient) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }

    /// 集合名称
    pub fn collection_name(&self) -> &'static str {
        T::collection_name()
    }

    /// 按主键字段类型规范化主键值
    fn normalize_id(&self, id: DataValue) -> NormaResult<DataValue> {
        let meta = T::meta();
        let pk = meta.primary_key_field().ok_or_else(|| NormaError::ConfigError {
            message: format!("模型 {} 没有声明主键字段", meta.collection_name),
        })?;
        match meta.field(pk) {
            Some(config) => config.coerce(pk, id),
            None => Ok(id),
        }
    }

    /// 检查过滤字段并按字段类型规范化比较值
    fn normalize_filter(&self, filter: Filter) -> NormaResult<Filter> {
        let meta = T::meta();
        let mut conditions = Vec::with_capacity(filter.conditions.len());
        for mut condition in filter.conditions {
            let config = meta.field(&condition.field).ok_or_else(|| NormaError::ValidationError {
                field: condition.field.clone(),
                message: format!("字段未在模型 {} 中定义", meta.collection_name),
            })?;
            if condition.operator != QueryOperator::In {
                condition.value = config.coerce(&condition.field, condition.value)?;
            }
            conditions.push(condition);
        }
        Ok(Filter { conditions })
    }

    /// 创建表/集合（幂等）
    pub async fn create_table(&self) -> NormaResult<()> {
        let adapter = self.client.adapter().await?;
        adapter.create_table(T::meta()).await
    }

    /// 插入模型实例，返回存储后的实例
    pub async fn insert(&self, model: &T) -> NormaResult<T> {
        model.validate()?;
        let data = model.to_dict()?;
        let adapter = self.client.adapter().await?;
        let stored = adapter.insert(T::meta(), &data).await?;
        crate::debug_log!("插入记录到 {}", T::collection_name());
        T::build(stored)
    }

    /// 根据主键查找
    pub async fn find_by_id(&self, id: impl Into<DataValue>) -> NormaResult<Option<T>> {
        let id = self.normalize_id(id.into())?;
        let adapter = self.client.adapter().await?;
        match adapter.find_by_id(T::meta(), &id).await? {
            Some(row) => Ok(Some(T::build(row)?)),
            None => Ok(None),
        }
    }

    /// 条件查询
    pub async fn find_many(&self, filter: Filter, options: FindOptions) -> NormaResult<Vec<T>> {
        let filter = self.normalize_filter(filter)?;
        let adapter = self.client.adapter().await?;
        let rows = adapter.find_many(T::meta(), &filter, &options).await?;
        rows.into_iter().map(T::build).collect()
    }

    /// 查询第一条匹配记录
    pub async fn find_one(&self, filter: Filter) -> NormaResult<Option<T>> {
        let options = FindOptions {
            limit: Some(1),
            ..Default::default()
        };
        Ok(self.find_many(filter, options).await?.into_iter().next())
    }

    /// 部分更新，返回更新后的实例；记录不存在时返回 None
    pub async fn update_by_id(
        &self,
        id: impl Into<DataValue>,
        changes: DataMap,
    ) -> NormaResult<Option<T>> {
        let id = self.normalize_id(id.into())?;
        let adapter = self.client.adapter().await?;
        let mut current = match adapter.find_by_id(T::meta(), &id).await? {
            Some(row) => T::build(row)?,
            None => return Ok(None),
        };

        let changed: Vec<String> = changes.keys().cloned().collect();
        current.update(changes)?;

        let mut all = current.to_dict()?;
        let data: DataMap = changed
            .into_iter()
            .filter_map(|name| all.remove_entry(&name))
            .collect();
        if data.is_empty() {
            return Ok(Some(current));
        }

        if adapter.update_by_id(T::meta(), &id, &data).await? {
            Ok(Some(current))
        } else {
            Ok(None)
        }
    }

    /// 按主键写回整个实例，返回是否有记录被更新
    pub async fn save(&self, model: &T) -> NormaResult<bool> {
        model.validate()?;
        let mut data = model.to_dict()?;
        let pk = T::primary_key_field().ok_or_else(|| NormaError::ConfigError {
            message: format!("模型 {} 没有声明主键字段", T::collection_name()),
        })?;
        let id = data.remove(pk).unwrap_or(DataValue::Null);
        let adapter = self.client.adapter().await?;
        adapter.update_by_id(T::meta(), &id, &data).await
    }

    /// 根据主键删除
    pub async fn delete_by_id(&self, id: impl Into<DataValue>) -> NormaResult<bool> {
        let id = self.normalize_id(id.into())?;
        let adapter = self.client.adapter().await?;
        adapter.delete_by_id(T::meta(), &id).await
    }

    /// 统计匹配记录数
    pub async fn count(&self, filter: Filter) -> NormaResult<u64> {
        let filter = self.normalize_filter(filter)?;
        let adapter = self.client.adapter().await?;
        adapter.count(T::meta(), &filter).await
    }
}
