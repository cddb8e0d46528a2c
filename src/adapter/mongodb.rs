//! MongoDB适配器
//!
//! 主键字段保存为文档的 `_id`，其余字段按字段名保存；
//! 日期时间使用 BSON DateTime（毫秒精度）

use super::{log_statement, DatabaseAdapter};
use crate::client::ClientConfig;
use crate::error::{NormaError, NormaResult};
use crate::model::{FieldKind, ModelMeta};
use crate::security::{DatabaseSecurityValidator, IdentifierKind};
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{FindOptions as MongoFindOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use rat_logger::{debug, info};

/// MongoDB适配器
pub struct MongoAdapter {
    client: Client,
    database: Database,
    validator: DatabaseSecurityValidator,
    echo: bool,
}

/// 将数据值转换为BSON
pub(crate) fn data_value_to_bson(value: &DataValue) -> Bson {
    match value {
        DataValue::Null => Bson::Null,
        DataValue::Bool(b) => Bson::Boolean(*b),
        DataValue::Int(i) => Bson::Int64(*i),
        DataValue::Float(f) => Bson::Double(*f),
        DataValue::String(s) => Bson::String(s.clone()),
        DataValue::DateTime(dt) => {
            Bson::DateTime(mongodb::bson::DateTime::from_millis(dt.timestamp_millis()))
        }
        DataValue::Json(json) => {
            mongodb::bson::to_bson(json).unwrap_or_else(|_| Bson::String(json.to_string()))
        }
    }
}

/// 按字段类型将BSON转换为数据值
pub(crate) fn bson_to_data_value(kind: FieldKind, value: Bson) -> DataValue {
    match (kind, value) {
        (_, Bson::Null) | (_, Bson::Undefined) => DataValue::Null,
        (FieldKind::Json, other) => DataValue::Json(other.into_relaxed_extjson()),
        (_, Bson::Boolean(b)) => DataValue::Bool(b),
        (_, Bson::Int32(i)) => DataValue::Int(i as i64),
        (_, Bson::Int64(i)) => DataValue::Int(i),
        (_, Bson::Double(f)) => DataValue::Float(f),
        (_, Bson::String(s)) => DataValue::String(s),
        (_, Bson::DateTime(dt)) => DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
            .map(DataValue::DateTime)
            .unwrap_or(DataValue::Null),
        (_, Bson::ObjectId(oid)) => DataValue::String(oid.to_hex()),
        (_, other) => DataValue::from_json_value(other.into_relaxed_extjson()),
    }
}

/// 将分页上限转换为驱动使用的 i64，超出范围时取最大值
fn clamp_limit(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl MongoAdapter {
    /// 连接并验证服务器可达
    pub async fn connect(config: &ClientConfig) -> NormaResult<Self> {
        let validator = DatabaseSecurityValidator::new(DatabaseType::MongoDB);
        validator.validate_identifier(IdentifierKind::Collection, &config.database_name)?;

        let client = Client::with_uri_str(&config.database_url)
            .await
            .map_err(|e| NormaError::ConnectionError {
                message: format!("MongoDB连接失败: {}", e),
            })?;
        let database = client.database(&config.database_name);
        database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| NormaError::ConnectionError {
                message: format!("MongoDB服务器不可达: {}", e),
            })?;
        info!("连接MongoDB数据库: {}", config.database_name);

        Ok(Self {
            client,
            database,
            validator,
            echo: config.echo,
        })
    }

    fn collection(&self, meta: &ModelMeta) -> NormaResult<Collection<Document>> {
        self.validator
            .validate_identifier(IdentifierKind::Collection, &meta.collection_name)?;
        Ok(self.database.collection::<Document>(&meta.collection_name))
    }

    /// 字段名到文档键的映射
    fn document_key<'a>(meta: &ModelMeta, field: &'a str) -> &'a str {
        if meta.primary_key_field() == Some(field) {
            "_id"
        } else {
            field
        }
    }

    fn id_filter(id: &DataValue) -> Document {
        doc! { "_id": data_value_to_bson(id) }
    }

    fn to_document(meta: &ModelMeta, data: &DataMap) -> Document {
        let mut document = Document::new();
        for (name, _) in &meta.fields {
            let value = data.get(name).unwrap_or(&DataValue::Null);
            document.insert(Self::document_key(meta, name), data_value_to_bson(value));
        }
        document
    }

    fn from_document(meta: &ModelMeta, mut document: Document) -> NormaResult<DataMap> {
        let mut map = DataMap::with_capacity(meta.fields.len());
        for (name, config) in &meta.fields {
            let raw = document
                .remove(Self::document_key(meta, name))
                .unwrap_or(Bson::Null);
            let value = config.coerce(name, bson_to_data_value(config.kind, raw))?;
            map.insert(name.clone(), value);
        }
        Ok(map)
    }

    fn build_filter(&self, meta: &ModelMeta, filter: &Filter) -> NormaResult<Document> {
        let mut clauses = Vec::with_capacity(filter.conditions.len());
        for condition in &filter.conditions {
            let config = meta.field(&condition.field).ok_or_else(|| NormaError::ValidationError {
                field: condition.field.clone(),
                message: format!("字段未在模型 {} 中定义", meta.collection_name),
            })?;
            self.validator
                .validate_identifier(IdentifierKind::Field, &condition.field)?;
            let key = Self::document_key(meta, &condition.field);

            let value = match (&condition.operator, &condition.value) {
                (QueryOperator::In, DataValue::Json(serde_json::Value::Array(items))) => {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        let coerced = config
                            .coerce(&condition.field, DataValue::from_json_value(item.clone()))?;
                        values.push(data_value_to_bson(&coerced));
                    }
                    Bson::Array(values)
                }
                (QueryOperator::In, _) => {
                    return Err(NormaError::ValidationError {
                        field: condition.field.clone(),
                        message: "IN 条件的值必须是数组".to_string(),
                    })
                }
                (_, value) => data_value_to_bson(value),
            };

            let clause = match condition.operator {
                QueryOperator::Eq => doc! { key: value },
                QueryOperator::Ne => doc! { key: { "$ne": value } },
                QueryOperator::Gt => doc! { key: { "$gt": value } },
                QueryOperator::Gte => doc! { key: { "$gte": value } },
                QueryOperator::Lt => doc! { key: { "$lt": value } },
                QueryOperator::Lte => doc! { key: { "$lte": value } },
                QueryOperator::In => doc! { key: { "$in": value } },
            };
            clauses.push(clause);
        }

        Ok(match clauses.len() {
            0 => Document::new(),
            1 => clauses.remove(0),
            _ => doc! { "$and": clauses },
        })
    }
}

#[async_trait]
impl DatabaseAdapter for MongoAdapter {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::MongoDB
    }

    async fn create_table(&self, meta: &ModelMeta) -> NormaResult<()> {
        self.validator.validate_model(meta)?;
        let collection = self.collection(meta)?;

        let existing = self
            .database
            .list_collection_names(None)
            .await
            .map_err(|e| NormaError::QueryError {
                message: format!("获取MongoDB集合列表失败: {}", e),
            })?;
        if !existing.contains(&meta.collection_name) {
            self.database
                .create_collection(&meta.collection_name, None)
                .await
                .map_err(|e| NormaError::QueryError {
                    message: format!("创建MongoDB集合失败: {}", e),
                })?;
            debug!("创建MongoDB集合: {}", meta.collection_name);
        }

        let pk = meta.primary_key_field();
        for (name, config) in &meta.fields {
            if Some(name.as_str()) == pk || !(config.unique || config.index) {
                continue;
            }
            let options = IndexOptions::builder()
                .name(format!("idx_{}_{}", meta.collection_name, name))
                .unique(config.unique)
                .build();
            let index = IndexModel::builder()
                .keys(doc! { name.as_str(): 1 })
                .options(options)
                .build();
            collection
                .create_index(index, None)
                .await
                .map_err(|e| NormaError::QueryError {
                    message: format!("创建MongoDB索引失败: {}", e),
                })?;
        }

        debug!("✅ MongoDB集合 '{}' 已就绪", meta.collection_name);
        Ok(())
    }

    async fn insert(&self, meta: &ModelMeta, data: &DataMap) -> NormaResult<DataMap> {
        let document = Self::to_document(meta, data);
        log_statement(self.echo, &format!("{}.insertOne({})", meta.collection_name, document));
        self.collection(meta)?
            .insert_one(document, None)
            .await
            .map_err(|e| NormaError::QueryError {
                message: format!("MongoDB插入失败: {}", e),
            })?;
        Ok(data.clone())
    }

    async fn find_by_id(&self, meta: &ModelMeta, id: &DataValue) -> NormaResult<Option<DataMap>> {
        let filter = Self::id_filter(id);
        log_statement(self.echo, &format!("{}.findOne({})", meta.collection_name, filter));
        let found = self
            .collection(meta)?
            .find_one(filter, None)
            .await
            .map_err(|e| NormaError::QueryError {
                message: format!("MongoDB查询失败: {}", e),
            })?;
        found.map(|document| Self::from_document(meta, document)).transpose()
    }

    async fn find_many(
        &self,
        meta: &ModelMeta,
        filter: &Filter,
        options: &FindOptions,
    ) -> NormaResult<Vec<DataMap>> {
        let query = self.build_filter(meta, filter)?;

        let mut find_options = MongoFindOptions::default();
        if options.offset > 0 {
            find_options.skip = Some(options.offset);
        }
        // MongoDB 把 limit(0) 当作不限制，与 SQL 的 LIMIT 0 相反
        match options.limit {
            Some(0) => return Ok(Vec::new()),
            Some(limit) => find_options.limit = Some(clamp_limit(limit)),
            None => {}
        }
        if !options.sort.is_empty() {
            let mut sort = Document::new();
            for (field, direction) in &options.sort {
                if meta.field(field).is_none() {
                    return Err(NormaError::ValidationError {
                        field: field.clone(),
                        message: format!("字段未在模型 {} 中定义", meta.collection_name),
                    });
                }
                let order = match direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                };
                sort.insert(Self::document_key(meta, field), order);
            }
            find_options.sort = Some(sort);
        }

        log_statement(self.echo, &format!("{}.find({})", meta.collection_name, query));
        let mut cursor = self
            .collection(meta)?
            .find(query, find_options)
            .await
            .map_err(|e| NormaError::QueryError {
                message: format!("MongoDB查询失败: {}", e),
            })?;

        let mut results = Vec::new();
        while cursor.advance().await.map_err(|e| NormaError::QueryError {
            message: format!("MongoDB游标读取失败: {}", e),
        })? {
            let document = cursor.deserialize_current().map_err(|e| NormaError::SerializationError {
                message: format!("MongoDB文档解析失败: {}", e),
            })?;
            results.push(Self::from_document(meta, document)?);
        }
        Ok(results)
    }

    async fn update_by_id(
        &self,
        meta: &ModelMeta,
        id: &DataValue,
        changes: &DataMap,
    ) -> NormaResult<bool> {
        let mut set = Document::new();
        for (name, value) in changes {
            if meta.field(name).is_none() {
                return Err(NormaError::ValidationError {
                    field: name.clone(),
                    message: format!("字段未在模型 {} 中定义", meta.collection_name),
                });
            }
            set.insert(Self::document_key(meta, name), data_value_to_bson(value));
        }
        if set.is_empty() {
            return Err(NormaError::ValidationError {
                field: "changes".to_string(),
                message: "没有需要更新的字段".to_string(),
            });
        }

        let filter = Self::id_filter(id);
        log_statement(
            self.echo,
            &format!("{}.updateOne({}, {{$set: {}}})", meta.collection_name, filter, set),
        );
        let result = self
            .collection(meta)?
            .update_one(filter, doc! { "$set": set }, None)
            .await
            .map_err(|e| NormaError::QueryError {
                message: format!("MongoDB更新失败: {}", e),
            })?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_id(&self, meta: &ModelMeta, id: &DataValue) -> NormaResult<bool> {
        let filter = Self::id_filter(id);
        log_statement(self.echo, &format!("{}.deleteOne({})", meta.collection_name, filter));
        let result = self
            .collection(meta)?
            .delete_one(filter, None)
            .await
            .map_err(|e| NormaError::QueryError {
                message: format!("MongoDB删除失败: {}", e),
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self, meta: &ModelMeta, filter: &Filter) -> NormaResult<u64> {
        let query = self.build_filter(meta, filter)?;
        self.collection(meta)?
            .count_documents(query, None)
            .await
            .map_err(|e| NormaError::QueryError {
                message: format!("MongoDB计数失败: {}", e),
            })
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        info!("MongoDB客户端已关闭");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_round_trip_is_millisecond_precise() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let bson = data_value_to_bson(&DataValue::DateTime(dt));
        assert_eq!(bson_to_data_value(FieldKind::DateTime, bson), DataValue::DateTime(dt));
    }

    #[test]
    fn test_json_field_reads_back_as_json() {
        let json = serde_json::json!({"tags": ["a", "b"]});
        let bson = data_value_to_bson(&DataValue::Json(json.clone()));
        assert_eq!(bson_to_data_value(FieldKind::Json, bson), DataValue::Json(json));
    }

    #[test]
    fn test_limit_never_wraps_negative() {
        assert_eq!(clamp_limit(25), 25);
        assert_eq!(clamp_limit(i64::MAX as u64), i64::MAX);
        assert_eq!(clamp_limit(u64::MAX), i64::MAX);
    }

    #[test]
    fn test_int32_widened() {
        assert_eq!(bson_to_data_value(FieldKind::Integer, Bson::Int32(7)), DataValue::Int(7));
    }
}
