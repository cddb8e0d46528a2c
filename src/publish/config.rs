//! 发布配置
//!
//! 默认值对应 Python 包的构建产物和 twine 上传流程，命令模板中的
//! `{dist}` 会被替换为实际的产物目录

use super::PublishError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 包信息（仅用于展示）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    /// 预发布仓库的安装命令
    pub staging_install: String,
    /// 正式仓库的安装命令
    pub production_install: String,
    pub staging_register_url: String,
    pub production_register_url: String,
}

impl Default for PackageInfo {
    fn default() -> Self {
        Self {
            name: "norma-orm".to_string(),
            version: "0.1.0".to_string(),
            author: "Geoion".to_string(),
            description: "A modern Python ORM framework with dataclass support".to_string(),
            staging_install: "pip install --index-url https://test.pypi.org/simple/ norma-orm"
                .to_string(),
            production_install: "pip install norma-orm".to_string(),
            staging_register_url: "https://test.pypi.org/account/register/".to_string(),
            production_register_url: "https://pypi.org/account/register/".to_string(),
        }
    }
}

/// 发布配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// 产物目录
    pub dist_dir: PathBuf,
    /// 二进制包文件模式
    pub wheel_pattern: String,
    /// 源码包文件模式
    pub sdist_pattern: String,
    /// 上传工具
    pub tool: String,
    /// 工具缺失时的安装提示
    pub tool_install_hint: String,
    /// 产物缺失时的构建提示
    pub build_hint: String,
    pub check_command: String,
    pub staging_upload_command: String,
    pub production_upload_command: String,
    pub package: PackageInfo,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            dist_dir: PathBuf::from("dist"),
            wheel_pattern: "*.whl".to_string(),
            sdist_pattern: "*.tar.gz".to_string(),
            tool: "twine".to_string(),
            tool_install_hint: "pip install twine".to_string(),
            build_hint: "python -m build".to_string(),
            check_command: "twine check {dist}/*".to_string(),
            staging_upload_command: "twine upload --repository testpypi {dist}/*".to_string(),
            production_upload_command: "twine upload {dist}/*".to_string(),
            package: PackageInfo::default(),
        }
    }
}

impl PublishConfig {
    /// 从 TOML 文件加载，未出现的键使用默认值
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PublishError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| PublishError::Config {
            message: format!("解析发布配置失败: {}", e),
        })
    }

    /// 覆盖产物目录
    pub fn with_dist_dir<P: Into<PathBuf>>(mut self, dist_dir: P) -> Self {
        self.dist_dir = dist_dir.into();
        self
    }

    /// 展开命令模板，产物目录按 shell 规则引用
    pub fn render(&self, template: &str) -> String {
        template.replace("{dist}", &shell_quote(&self.dist_dir.display().to_string()))
    }
}

/// 单引号引用含特殊字符的参数，只含安全字符时原样返回
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:@%,=".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

/// 简单的文件名模式匹配：支持单个前导 `*`，否则要求完全相同
pub fn matches_pattern(file_name: &str, pattern: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) => file_name.ends_with(suffix) && file_name.len() > suffix.len(),
        None => file_name == pattern,
    }
}
