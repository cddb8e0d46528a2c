//! SQL语句构建器
//!
//! SQLite 和 PostgreSQL 共用的语句生成逻辑，两者只在占位符、
//! 列类型和分页写法上有差异

use crate::error::{NormaError, NormaResult};
use crate::model::{FieldConfig, FieldKind, ModelMeta};
use crate::security::{DatabaseSecurityValidator, IdentifierKind};
use crate::types::*;

/// SQL方言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Sqlite,
    Postgres,
}

impl SqlDialect {
    fn db_type(&self) -> DatabaseType {
        match self {
            SqlDialect::Sqlite => DatabaseType::SQLite,
            SqlDialect::Postgres => DatabaseType::PostgreSQL,
        }
    }

    /// 第 `index` 个参数的占位符（从1开始）
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::Sqlite => "?".to_string(),
            SqlDialect::Postgres => format!("${}", index),
        }
    }

    /// 字段对应的列类型
    pub fn column_type(&self, config: &FieldConfig) -> String {
        match (self, config.kind) {
            (_, FieldKind::String) => match config.max_length {
                Some(max) => format!("VARCHAR({})", max),
                None => "TEXT".to_string(),
            },
            (SqlDialect::Sqlite, FieldKind::Integer) => "INTEGER".to_string(),
            (SqlDialect::Postgres, FieldKind::Integer) => "BIGINT".to_string(),
            (SqlDialect::Sqlite, FieldKind::Float) => "REAL".to_string(),
            (SqlDialect::Postgres, FieldKind::Float) => "DOUBLE PRECISION".to_string(),
            (_, FieldKind::Boolean) => "BOOLEAN".to_string(),
            // SQLite 以 RFC3339 文本保存日期时间
            (SqlDialect::Sqlite, FieldKind::DateTime) => "TEXT".to_string(),
            (SqlDialect::Postgres, FieldKind::DateTime) => "TIMESTAMPTZ".to_string(),
            (SqlDialect::Sqlite, FieldKind::Json) => "TEXT".to_string(),
            (SqlDialect::Postgres, FieldKind::Json) => "JSONB".to_string(),
        }
    }
}

/// 带字段类型的绑定参数，空值也需要知道列类型
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParam {
    pub kind: FieldKind,
    pub value: DataValue,
}

/// 生成的语句及其参数
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// SQL语句构建器
#[derive(Debug, Clone, Copy)]
pub struct SqlBuilder {
    dialect: SqlDialect,
    validator: DatabaseSecurityValidator,
}

impl SqlBuilder {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            validator: DatabaseSecurityValidator::new(dialect.db_type()),
        }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    fn table(&self, meta: &ModelMeta) -> NormaResult<String> {
        self.validator
            .quote(IdentifierKind::Collection, &meta.collection_name)
    }

    fn column(&self, name: &str) -> NormaResult<String> {
        self.validator.quote(IdentifierKind::Field, name)
    }

    fn column_list(&self, meta: &ModelMeta) -> NormaResult<String> {
        let columns = meta
            .fields
            .iter()
            .map(|(name, _)| self.column(name))
            .collect::<NormaResult<Vec<_>>>()?;
        Ok(columns.join(", "))
    }

    fn primary_key<'m>(&self, meta: &'m ModelMeta) -> NormaResult<(&'m str, &'m FieldConfig)> {
        let pk = meta.primary_key_field().ok_or_else(|| NormaError::ConfigError {
            message: format!("模型 {} 没有声明主键字段", meta.collection_name),
        })?;
        let config = meta.field(pk).ok_or_else(|| NormaError::ConfigError {
            message: format!("主键字段 {} 不存在", pk),
        })?;
        Ok((pk, config))
    }

    fn field_config<'m>(&self, meta: &'m ModelMeta, name: &str) -> NormaResult<&'m FieldConfig> {
        meta.field(name).ok_or_else(|| NormaError::ValidationError {
            field: name.to_string(),
            message: format!("字段未在模型 {} 中定义", meta.collection_name),
        })
    }

    /// 建表语句 + 索引语句
    pub fn create_table(&self, meta: &ModelMeta) -> NormaResult<Vec<String>> {
        self.validator.validate_model(meta)?;
        let table = self.table(meta)?;

        let mut columns = Vec::with_capacity(meta.fields.len());
        for (name, config) in &meta.fields {
            let mut column = format!("{} {}", self.column(name)?, self.dialect.column_type(config));
            if config.primary_key {
                column.push_str(" PRIMARY KEY");
            } else {
                if !config.nullable {
                    column.push_str(" NOT NULL");
                }
                if config.unique {
                    column.push_str(" UNIQUE");
                }
            }
            if let Some(relationship) = &config.relationship {
                column.push_str(&format!(
                    " REFERENCES {}({})",
                    self.validator
                        .quote(IdentifierKind::Collection, relationship.target())?,
                    self.column(relationship.foreign_key())?
                ));
            }
            columns.push(column);
        }

        let mut statements = vec![format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            table,
            columns.join(", ")
        )];

        for field in meta.indexed_fields() {
            let index_name = format!("idx_{}_{}", meta.collection_name, field);
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                self.column(&index_name)?,
                table,
                self.column(field)?
            ));
        }

        Ok(statements)
    }

    /// 插入语句，按字段声明顺序写入所有列
    pub fn insert(&self, meta: &ModelMeta, data: &DataMap) -> NormaResult<SqlStatement> {
        let mut columns = Vec::with_capacity(meta.fields.len());
        let mut placeholders = Vec::with_capacity(meta.fields.len());
        let mut params = Vec::with_capacity(meta.fields.len());

        for (name, config) in &meta.fields {
            columns.push(self.column(name)?);
            params.push(SqlParam {
                kind: config.kind,
                value: data.get(name).cloned().unwrap_or(DataValue::Null),
            });
            placeholders.push(self.dialect.placeholder(params.len()));
        }

        Ok(SqlStatement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table(meta)?,
                columns.join(", "),
                placeholders.join(", ")
            ),
            params,
        })
    }

    /// 按主键查询单条记录
    pub fn select_by_id(&self, meta: &ModelMeta, id: &DataValue) -> NormaResult<SqlStatement> {
        let (pk, config) = self.primary_key(meta)?;
        Ok(SqlStatement {
            sql: format!(
                "SELECT {} FROM {} WHERE {} = {} LIMIT 1",
                self.column_list(meta)?,
                self.table(meta)?,
                self.column(pk)?,
                self.dialect.placeholder(1)
            ),
            params: vec![SqlParam {
                kind: config.kind,
                value: id.clone(),
            }],
        })
    }

    /// 条件查询
    pub fn select(
        &self,
        meta: &ModelMeta,
        filter: &Filter,
        options: &FindOptions,
    ) -> NormaResult<SqlStatement> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", self.column_list(meta)?, self.table(meta)?);
        sql.push_str(&self.where_clause(meta, filter, &mut params)?);

        if !options.sort.is_empty() {
            let order = options
                .sort
                .iter()
                .map(|(field, direction)| {
                    self.field_config(meta, field)?;
                    let dir = match direction {
                        SortDirection::Asc => "ASC",
                        SortDirection::Desc => "DESC",
                    };
                    Ok(format!("{} {}", self.column(field)?, dir))
                })
                .collect::<NormaResult<Vec<_>>>()?;
            sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
        }

        match (self.dialect, options.limit) {
            (_, Some(limit)) => sql.push_str(&format!(" LIMIT {}", limit)),
            // SQLite 的 OFFSET 必须跟在 LIMIT 之后
            (SqlDialect::Sqlite, None) if options.offset > 0 => sql.push_str(" LIMIT -1"),
            _ => {}
        }
        if options.offset > 0 {
            sql.push_str(&format!(" OFFSET {}", options.offset));
        }

        Ok(SqlStatement { sql, params })
    }

    /// 计数
    pub fn count(&self, meta: &ModelMeta, filter: &Filter) -> NormaResult<SqlStatement> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table(meta)?);
        sql.push_str(&self.where_clause(meta, filter, &mut params)?);
        Ok(SqlStatement { sql, params })
    }

    /// 按主键更新
    pub fn update_by_id(
        &self,
        meta: &ModelMeta,
        id: &DataValue,
        changes: &DataMap,
    ) -> NormaResult<SqlStatement> {
        let (pk, pk_config) = self.primary_key(meta)?;
        let mut assignments = Vec::new();
        let mut params = Vec::new();

        // 按声明顺序生成 SET 子句，保证语句稳定
        for (name, config) in &meta.fields {
            if let Some(value) = changes.get(name) {
                params.push(SqlParam {
                    kind: config.kind,
                    value: value.clone(),
                });
                assignments.push(format!(
                    "{} = {}",
                    self.column(name)?,
                    self.dialect.placeholder(params.len())
                ));
            }
        }
        if let Some(unknown) = changes.keys().find(|k| meta.field(k).is_none()) {
            return Err(NormaError::ValidationError {
                field: unknown.clone(),
                message: format!("字段未在模型 {} 中定义", meta.collection_name),
            });
        }
        if assignments.is_empty() {
            return Err(NormaError::ValidationError {
                field: "changes".to_string(),
                message: "没有需要更新的字段".to_string(),
            });
        }

        params.push(SqlParam {
            kind: pk_config.kind,
            value: id.clone(),
        });
        Ok(SqlStatement {
            sql: format!(
                "UPDATE {} SET {} WHERE {} = {}",
                self.table(meta)?,
                assignments.join(", "),
                self.column(pk)?,
                self.dialect.placeholder(params.len())
            ),
            params,
        })
    }

    /// 按主键删除
    pub fn delete_by_id(&self, meta: &ModelMeta, id: &DataValue) -> NormaResult<SqlStatement> {
        let (pk, config) = self.primary_key(meta)?;
        Ok(SqlStatement {
            sql: format!(
                "DELETE FROM {} WHERE {} = {}",
                self.table(meta)?,
                self.column(pk)?,
                self.dialect.placeholder(1)
            ),
            params: vec![SqlParam {
                kind: config.kind,
                value: id.clone(),
            }],
        })
    }

    fn where_clause(
        &self,
        meta: &ModelMeta,
        filter: &Filter,
        params: &mut Vec<SqlParam>,
    ) -> NormaResult<String> {
        if filter.is_empty() {
            return Ok(String::new());
        }

        let mut clauses = Vec::with_capacity(filter.conditions.len());
        for condition in &filter.conditions {
            let config = self.field_config(meta, &condition.field)?;
            let column = self.column(&condition.field)?;

            let clause = match (condition.operator, &condition.value) {
                (QueryOperator::In, DataValue::Json(serde_json::Value::Array(items))) => {
                    if items.is_empty() {
                        "1 = 0".to_string()
                    } else {
                        let mut placeholders = Vec::with_capacity(items.len());
                        for item in items {
                            let value = config.coerce(
                                &condition.field,
                                DataValue::from_json_value(item.clone()),
                            )?;
                            params.push(SqlParam {
                                kind: config.kind,
                                value,
                            });
                            placeholders.push(self.dialect.placeholder(params.len()));
                        }
                        format!("{} IN ({})", column, placeholders.join(", "))
                    }
                }
                (QueryOperator::In, _) => {
                    return Err(NormaError::ValidationError {
                        field: condition.field.clone(),
                        message: "IN 条件的值必须是数组".to_string(),
                    })
                }
                (QueryOperator::Eq, DataValue::Null) => format!("{} IS NULL", column),
                (QueryOperator::Ne, DataValue::Null) => format!("{} IS NOT NULL", column),
                (operator, value) => {
                    params.push(SqlParam {
                        kind: config.kind,
                        value: value.clone(),
                    });
                    format!(
                        "{} {} {}",
                        column,
                        operator.sql_symbol(),
                        self.dialect.placeholder(params.len())
                    )
                }
            };
            clauses.push(clause);
        }

        Ok(format!(" WHERE {}", clauses.join(" AND ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_map;
    use crate::model::*;

    fn post_meta() -> ModelMeta {
        ModelMeta::new(
            "posts",
            vec![
                ("id".to_string(), string_field().primary_key()),
                ("title".to_string(), string_field().max_length(200).index()),
                (
                    "author_id".to_string(),
                    string_field().relationship(Relationship::many_to_one("users", "id")),
                ),
                ("published".to_string(), boolean_field().default(false)),
                ("created_at".to_string(), datetime_field().nullable()),
            ],
        )
    }

    #[test]
    fn test_create_table_sqlite() {
        let statements = SqlBuilder::new(SqlDialect::Sqlite)
            .create_table(&post_meta())
            .unwrap();
        assert_eq!(
            statements[0],
            "CREATE TABLE IF NOT EXISTS \"posts\" (\"id\" TEXT PRIMARY KEY, \"title\" VARCHAR(200) NOT NULL, \
             \"author_id\" TEXT NOT NULL REFERENCES \"users\"(\"id\"), \"published\" BOOLEAN NOT NULL, \
             \"created_at\" TEXT)"
        );
        assert_eq!(
            statements[1],
            "CREATE INDEX IF NOT EXISTS \"idx_posts_title\" ON \"posts\" (\"title\")"
        );
    }

    #[test]
    fn test_postgres_column_types_and_placeholders() {
        let builder = SqlBuilder::new(SqlDialect::Postgres);
        let statements = builder.create_table(&post_meta()).unwrap();
        assert!(statements[0].contains("\"created_at\" TIMESTAMPTZ"));

        let stmt = builder
            .insert(&post_meta(), &data_map! { "id" => "1", "title" => "t" })
            .unwrap();
        assert!(stmt.sql.ends_with("VALUES ($1, $2, $3, $4, $5)"));
        assert_eq!(stmt.params.len(), 5);
        assert_eq!(stmt.params[4].kind, FieldKind::DateTime);
        assert!(stmt.params[4].value.is_null());
    }

    #[test]
    fn test_select_with_filter_and_pagination() {
        let builder = SqlBuilder::new(SqlDialect::Sqlite);
        let filter = Filter::new().eq("published", true).is_in("id", vec!["a", "b"]);
        let stmt = builder
            .select(
                &post_meta(),
                &filter,
                &FindOptions::new().paginate(10, 5).sort_by("title", SortDirection::Desc),
            )
            .unwrap();
        assert!(stmt.sql.ends_with(
            "WHERE \"published\" = ? AND \"id\" IN (?, ?) ORDER BY \"title\" DESC LIMIT 5 OFFSET 10"
        ));
        assert_eq!(stmt.params.len(), 3);

        let offset_only = builder
            .select(&post_meta(), &Filter::new(), &FindOptions { offset: 3, ..Default::default() })
            .unwrap();
        assert!(offset_only.sql.ends_with("LIMIT -1 OFFSET 3"));
    }

    #[test]
    fn test_unknown_filter_field_is_rejected() {
        let builder = SqlBuilder::new(SqlDialect::Sqlite);
        let err = builder
            .count(&post_meta(), &Filter::new().eq("title; DROP TABLE posts", "x"))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update_orders_assignments_by_declaration() {
        let builder = SqlBuilder::new(SqlDialect::Postgres);
        let stmt = builder
            .update_by_id(
                &post_meta(),
                &DataValue::from("p1"),
                &data_map! { "published" => true, "title" => "new" },
            )
            .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE \"posts\" SET \"title\" = $1, \"published\" = $2 WHERE \"id\" = $3"
        );
        assert!(builder
            .update_by_id(&post_meta(), &DataValue::from("p1"), &DataMap::new())
            .is_err());
    }
}
