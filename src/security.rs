//! 标识符安全验证
//!
//! 表名、集合名和字段名会被拼接进 SQL 语句或作为文档键使用，
//! 在建表和生成语句前统一检查

use crate::error::{NormaError, NormaResult};
use crate::model::ModelMeta;
use crate::types::{AdapterKind, DatabaseType};

/// 标识符最大长度
const MAX_IDENTIFIER_LEN: usize = 63;

/// 不允许作为表名或列名的 SQL 关键字
const SQL_RESERVED: &[&str] = &[
    "SELECT", "FROM", "WHERE", "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER",
    "TABLE", "INDEX", "AND", "OR", "NOT", "NULL", "IS", "IN", "EXISTS", "LIKE", "UNION",
    "JOIN", "GROUP", "BY", "HAVING", "ORDER", "LIMIT", "OFFSET", "DISTINCT", "AS", "ON",
    "PRIMARY", "KEY", "FOREIGN", "REFERENCES", "CONSTRAINT", "DEFAULT", "CHECK", "UNIQUE",
    "CASE", "WHEN", "THEN", "ELSE", "END", "USER",
];

/// 标识符用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// 表名或集合名
    Collection,
    /// 字段名
    Field,
}

impl IdentifierKind {
    fn label(&self) -> &'static str {
        match self {
            IdentifierKind::Collection => "表名",
            IdentifierKind::Field => "字段名",
        }
    }
}

/// 数据库安全验证器
#[derive(Debug, Clone, Copy)]
pub struct DatabaseSecurityValidator {
    db_type: DatabaseType,
}

impl DatabaseSecurityValidator {
    /// 创建新的安全验证器
    pub fn new(db_type: DatabaseType) -> Self {
        Self { db_type }
    }

    /// 验证标识符
    ///
    /// SQL 后端只接受 `[A-Za-z_][A-Za-z0-9_]*` 且不能是保留字；
    /// 文档后端禁止 `$` 开头、点号和空字符
    pub fn validate_identifier(&self, kind: IdentifierKind, name: &str) -> NormaResult<()> {
        let fail = |message: String| NormaError::ValidationError {
            field: name.to_string(),
            message,
        };

        if name.is_empty() {
            return Err(NormaError::ValidationError {
                field: kind.label().to_string(),
                message: format!("{}不能为空", kind.label()),
            });
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(fail(format!(
                "{}长度不能超过{}个字符",
                kind.label(),
                MAX_IDENTIFIER_LEN
            )));
        }

        match self.db_type.adapter_kind() {
            AdapterKind::Sql => {
                let mut chars = name.chars();
                if let Some(first) = chars.next() {
                    if !(first.is_ascii_alphabetic() || first == '_') {
                        return Err(fail(format!("SQL{}必须以字母或下划线开头", kind.label())));
                    }
                }
                if let Some((i, ch)) = name
                    .chars()
                    .enumerate()
                    .find(|(_, ch)| !ch.is_ascii_alphanumeric() && *ch != '_')
                {
                    return Err(fail(format!(
                        "SQL{}包含非法字符 '{}' 在位置 {}",
                        kind.label(),
                        ch,
                        i
                    )));
                }
                if SQL_RESERVED.contains(&name.to_uppercase().as_str()) {
                    return Err(fail(format!("{}不能使用SQL关键字: {}", kind.label(), name)));
                }
            }
            AdapterKind::Mongo => {
                if name.starts_with('$') {
                    return Err(fail(format!("{}不能以$开头", kind.label())));
                }
                if name.contains('\0') {
                    return Err(fail(format!("{}不能包含空字符", kind.label())));
                }
                if kind == IdentifierKind::Field && name.contains('.') {
                    return Err(fail("字段名不能包含点号".to_string()));
                }
                if kind == IdentifierKind::Collection && name.starts_with("system.") {
                    return Err(fail("集合名不能以system.开头".to_string()));
                }
            }
        }

        Ok(())
    }

    /// 验证并返回加引号的 SQL 标识符；文档后端原样返回
    pub fn quote(&self, kind: IdentifierKind, name: &str) -> NormaResult<String> {
        self.validate_identifier(kind, name)?;
        Ok(match self.db_type.adapter_kind() {
            AdapterKind::Sql => format!("\"{}\"", name),
            AdapterKind::Mongo => name.to_string(),
        })
    }

    /// 验证模型元数据中的集合名、字段名和关系目标
    pub fn validate_model(&self, meta: &ModelMeta) -> NormaResult<()> {
        self.validate_identifier(IdentifierKind::Collection, &meta.collection_name)?;
        for (name, config) in &meta.fields {
            self.validate_identifier(IdentifierKind::Field, name)?;
            if let Some(relationship) = &config.relationship {
                self.validate_identifier(IdentifierKind::Collection, relationship.target())?;
                self.validate_identifier(IdentifierKind::Field, relationship.foreign_key())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{string_field, ModelMeta};

    #[test]
    fn test_sql_identifiers() {
        let validator = DatabaseSecurityValidator::new(DatabaseType::PostgreSQL);

        assert!(validator.validate_identifier(IdentifierKind::Field, "author_id").is_ok());
        assert!(validator.validate_identifier(IdentifierKind::Field, "createdAt").is_ok());
        assert!(validator.validate_identifier(IdentifierKind::Field, "").is_err());
        assert!(validator.validate_identifier(IdentifierKind::Field, "1name").is_err());
        assert!(validator.validate_identifier(IdentifierKind::Field, "na me").is_err());
        assert!(validator.validate_identifier(IdentifierKind::Field, "x;--").is_err());
        assert!(validator.validate_identifier(IdentifierKind::Collection, "select").is_err());
        assert_eq!(
            validator.quote(IdentifierKind::Collection, "users").unwrap(),
            "\"users\""
        );
    }

    #[test]
    fn test_document_identifiers() {
        let validator = DatabaseSecurityValidator::new(DatabaseType::MongoDB);

        assert!(validator.validate_identifier(IdentifierKind::Field, "user-name").is_ok());
        assert!(validator.validate_identifier(IdentifierKind::Field, "id").is_ok());
        assert!(validator.validate_identifier(IdentifierKind::Field, "$where").is_err());
        assert!(validator.validate_identifier(IdentifierKind::Field, "a.b").is_err());
        assert!(validator
            .validate_identifier(IdentifierKind::Collection, "system.users")
            .is_err());
        assert_eq!(validator.quote(IdentifierKind::Field, "name").unwrap(), "name");
    }

    #[test]
    fn test_validate_model() {
        let validator = DatabaseSecurityValidator::new(DatabaseType::SQLite);
        let good = ModelMeta::new("users", vec![("id".to_string(), string_field().primary_key())]);
        assert!(validator.validate_model(&good).is_ok());

        let bad = ModelMeta::new("users", vec![("order".to_string(), string_field())]);
        assert!(validator.validate_model(&bad).is_err());
    }
}
