//! PostgreSQL适配器

use super::sql_builder::{SqlBuilder, SqlDialect, SqlParam, SqlStatement};
use super::{log_statement, DatabaseAdapter};
use crate::client::ClientConfig;
use crate::error::{NormaError, NormaResult};
use crate::model::{FieldKind, ModelMeta};
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rat_logger::{debug, info};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// PostgreSQL适配器
pub struct PostgresAdapter {
    pool: PgPool,
    builder: SqlBuilder,
    echo: bool,
}

impl PostgresAdapter {
    /// 创建连接池
    pub async fn connect(config: &ClientConfig) -> NormaResult<Self> {
        info!("连接PostgreSQL数据库: 最大连接数={}", config.max_connections);
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|e| NormaError::ConnectionError {
                message: format!("PostgreSQL连接失败: {}", e),
            })?;

        Ok(Self {
            pool,
            builder: SqlBuilder::new(SqlDialect::Postgres),
            echo: config.echo,
        })
    }

    /// 绑定参数；空值按列类型绑定，避免服务端类型推断失败
    fn bind_param<'q>(query: PgQuery<'q>, param: &SqlParam) -> PgQuery<'q> {
        match &param.value {
            DataValue::Null => match param.kind {
                FieldKind::String => query.bind(Option::<String>::None),
                FieldKind::Integer => query.bind(Option::<i64>::None),
                FieldKind::Float => query.bind(Option::<f64>::None),
                FieldKind::Boolean => query.bind(Option::<bool>::None),
                FieldKind::DateTime => query.bind(Option::<DateTime<Utc>>::None),
                FieldKind::Json => query.bind(Option::<serde_json::Value>::None),
            },
            DataValue::Bool(b) => query.bind(*b),
            DataValue::Int(i) => query.bind(*i),
            DataValue::Float(f) => query.bind(*f),
            DataValue::String(s) => query.bind(s.clone()),
            DataValue::DateTime(dt) => query.bind(*dt),
            DataValue::Json(json) => query.bind(json.clone()),
        }
    }

    fn build_query<'q>(&self, statement: &'q SqlStatement) -> PgQuery<'q> {
        log_statement(self.echo, &statement.sql);
        statement
            .params
            .iter()
            .fold(sqlx::query(&statement.sql), Self::bind_param)
    }

    async fn execute(&self, statement: &SqlStatement) -> NormaResult<u64> {
        let result = self
            .build_query(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| NormaError::QueryError {
                message: format!("PostgreSQL执行失败: {}", e),
            })?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, statement: &SqlStatement) -> NormaResult<Vec<PgRow>> {
        self.build_query(statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NormaError::QueryError {
                message: format!("PostgreSQL查询失败: {}", e),
            })
    }

    fn decode_row(meta: &ModelMeta, row: &PgRow) -> NormaResult<DataMap> {
        let mut map = DataMap::with_capacity(meta.fields.len());
        for (name, config) in &meta.fields {
            let column = name.as_str();
            let decode_err = |e: sqlx::Error| NormaError::SerializationError {
                message: format!("无法解码列 {}: {}", column, e),
            };

            let value: DataValue = match config.kind {
                FieldKind::String => row.try_get::<Option<String>, _>(column).map_err(decode_err)?.into(),
                FieldKind::Integer => row.try_get::<Option<i64>, _>(column).map_err(decode_err)?.into(),
                FieldKind::Float => row.try_get::<Option<f64>, _>(column).map_err(decode_err)?.into(),
                FieldKind::Boolean => row.try_get::<Option<bool>, _>(column).map_err(decode_err)?.into(),
                FieldKind::DateTime => row
                    .try_get::<Option<DateTime<Utc>>, _>(column)
                    .map_err(decode_err)?
                    .into(),
                FieldKind::Json => match row
                    .try_get::<Option<serde_json::Value>, _>(column)
                    .map_err(decode_err)?
                {
                    Some(json) => DataValue::Json(json),
                    None => DataValue::Null,
                },
            };
            map.insert(name.clone(), value);
        }
        Ok(map)
    }
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    async fn create_table(&self, meta: &ModelMeta) -> NormaResult<()> {
        for sql in self.builder.create_table(meta)? {
            let statement = SqlStatement { sql, params: Vec::new() };
            self.execute(&statement).await?;
        }
        debug!("✅ PostgreSQL表 '{}' 已就绪", meta.collection_name);
        Ok(())
    }

    async fn insert(&self, meta: &ModelMeta, data: &DataMap) -> NormaResult<DataMap> {
        let statement = self.builder.insert(meta, data)?;
        self.execute(&statement).await?;
        Ok(data.clone())
    }

    async fn find_by_id(&self, meta: &ModelMeta, id: &DataValue) -> NormaResult<Option<DataMap>> {
        let statement = self.builder.select_by_id(meta, id)?;
        let rows = self.fetch_all(&statement).await?;
        rows.first().map(|row| Self::decode_row(meta, row)).transpose()
    }

    async fn find_many(
        &self,
        meta: &ModelMeta,
        filter: &Filter,
        options: &FindOptions,
    ) -> NormaResult<Vec<DataMap>> {
        let statement = self.builder.select(meta, filter, options)?;
        let rows = self.fetch_all(&statement).await?;
        rows.iter().map(|row| Self::decode_row(meta, row)).collect()
    }

    async fn update_by_id(
        &self,
        meta: &ModelMeta,
        id: &DataValue,
        changes: &DataMap,
    ) -> NormaResult<bool> {
        let statement = self.builder.update_by_id(meta, id, changes)?;
        Ok(self.execute(&statement).await? > 0)
    }

    async fn delete_by_id(&self, meta: &ModelMeta, id: &DataValue) -> NormaResult<bool> {
        let statement = self.builder.delete_by_id(meta, id)?;
        Ok(self.execute(&statement).await? > 0)
    }

    async fn count(&self, meta: &ModelMeta, filter: &Filter) -> NormaResult<u64> {
        let statement = self.builder.count(meta, filter)?;
        let rows = self.fetch_all(&statement).await?;
        let count: i64 = match rows.first() {
            Some(row) => row.try_get(0).map_err(|e| NormaError::QueryError {
                message: format!("PostgreSQL计数失败: {}", e),
            })?,
            None => 0,
        };
        Ok(count.max(0) as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL连接池已关闭");
    }
}
