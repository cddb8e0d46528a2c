//! SQLite适配器
//!
//! 基于 sqlx 连接池；内存数据库只保留一条永不回收的连接，
//! 否则每条新连接都会看到一个空库

use super::sql_builder::{SqlBuilder, SqlDialect, SqlParam, SqlStatement};
use super::{log_statement, DatabaseAdapter};
use crate::client::ClientConfig;
use crate::error::{NormaError, NormaResult};
use crate::model::{FieldKind, ModelMeta};
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rat_logger::{debug, info};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;

/// SQLite 中日期时间的文本形式
///
/// 固定宽度（微秒、`Z` 后缀），文本比较与时间先后一致，范围过滤和排序才正确
pub(crate) fn stored_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite 连接目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SqliteTarget {
    Memory,
    File(PathBuf),
}

impl SqliteTarget {
    /// 解析连接 URL
    ///
    /// 接受 `sqlite:///relative.db`、`sqlite:////abs/path.db`、`sqlite://path.db`、
    /// `sqlite:path.db` 以及 `sqlite::memory:`/`:memory:`
    pub(crate) fn parse(url: &str) -> NormaResult<Self> {
        let rest = if url == ":memory:" {
            url
        } else {
            url.strip_prefix("sqlite:").ok_or_else(|| NormaError::ConfigError {
                message: format!("无效的SQLite连接URL: {}", url),
            })?
        };

        let path = match rest.strip_prefix("//") {
            Some(after) => after.strip_prefix('/').unwrap_or(after),
            None => rest,
        };
        // 查询参数（如 ?mode=rwc）不属于文件路径
        let path = path.split('?').next().unwrap_or_default();

        if path.is_empty() || path == ":memory:" {
            Ok(SqliteTarget::Memory)
        } else {
            Ok(SqliteTarget::File(PathBuf::from(path)))
        }
    }
}

/// SQLite适配器
pub struct SqliteAdapter {
    pool: SqlitePool,
    builder: SqlBuilder,
    echo: bool,
}

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

impl SqliteAdapter {
    /// 创建连接池
    pub async fn connect(config: &ClientConfig) -> NormaResult<Self> {
        let target = SqliteTarget::parse(&config.database_url)?;
        let pool = match &target {
            SqliteTarget::Memory => {
                info!("连接SQLite内存数据库");
                let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
                    NormaError::ConnectionError {
                        message: format!("SQLite内存数据库配置无效: {}", e),
                    }
                })?;
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await
            }
            SqliteTarget::File(path) => {
                info!("连接SQLite数据库文件: {}", path.display());
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        NormaError::ConnectionError {
                            message: format!("创建SQLite数据库目录失败: {}", e),
                        }
                    })?;
                }
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true);
                SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect_with(options)
                    .await
            }
        }
        .map_err(|e| NormaError::ConnectionError {
            message: format!("SQLite连接失败: {}", e),
        })?;

        Ok(Self {
            pool,
            builder: SqlBuilder::new(SqlDialect::Sqlite),
            echo: config.echo,
        })
    }

    fn bind_param<'q>(query: SqliteQuery<'q>, param: &SqlParam) -> SqliteQuery<'q> {
        match &param.value {
            DataValue::Null => query.bind(Option::<String>::None),
            DataValue::Bool(b) => query.bind(*b),
            DataValue::Int(i) => query.bind(*i),
            DataValue::Float(f) => query.bind(*f),
            DataValue::String(s) => query.bind(s.clone()),
            DataValue::DateTime(dt) => query.bind(stored_datetime(dt)),
            DataValue::Json(json) => query.bind(json.to_string()),
        }
    }

    fn build_query<'q>(&self, statement: &'q SqlStatement) -> SqliteQuery<'q> {
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
                message: format!("SQLite执行失败: {}", e),
            })?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, statement: &SqlStatement) -> NormaResult<Vec<SqliteRow>> {
        self.build_query(statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NormaError::QueryError {
                message: format!("SQLite查询失败: {}", e),
            })
    }

    /// 按字段定义解码一行
    fn decode_row(meta: &ModelMeta, row: &SqliteRow) -> NormaResult<DataMap> {
        let mut map = DataMap::with_capacity(meta.fields.len());
        for (name, config) in &meta.fields {
            let column = name.as_str();
            let decode_err = |e: sqlx::Error| NormaError::SerializationError {
                message: format!("无法解码列 {}: {}", column, e),
            };

            let value = match config.kind {
                FieldKind::Integer => row
                    .try_get::<Option<i64>, _>(column)
                    .map_err(decode_err)?
                    .into(),
                FieldKind::Float => row
                    .try_get::<Option<f64>, _>(column)
                    .map_err(decode_err)?
                    .into(),
                FieldKind::Boolean => row
                    .try_get::<Option<bool>, _>(column)
                    .map_err(decode_err)?
                    .into(),
                FieldKind::String | FieldKind::DateTime => {
                    let text: DataValue = row
                        .try_get::<Option<String>, _>(column)
                        .map_err(decode_err)?
                        .into();
                    config.coerce(column, text)?
                }
                FieldKind::Json => match row.try_get::<Option<String>, _>(column).map_err(decode_err)? {
                    Some(text) => DataValue::Json(serde_json::from_str(&text)?),
                    None => DataValue::Null,
                },
            };
            map.insert(name.clone(), value);
        }
        Ok(map)
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    async fn create_table(&self, meta: &ModelMeta) -> NormaResult<()> {
        for sql in self.builder.create_table(meta)? {
            let statement = SqlStatement { sql, params: Vec::new() };
            self.execute(&statement).await?;
        }
        debug!("✅ SQLite表 '{}' 已就绪", meta.collection_name);
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
                message: format!("SQLite计数失败: {}", e),
            })?,
            None => 0,
        };
        Ok(count.max(0) as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("SQLite连接池已关闭");
    }
}
