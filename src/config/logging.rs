//! # 日志配置
//!
//! 日志级别、输出目标以及基于 rat_logger 的初始化

use crate::error::{NormaError, NormaResult};
use rat_logger::handler::term::TermConfig;
use rat_logger::{LevelFilter, LoggerBuilder};
use serde::{Deserialize, Serialize};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 错误级别
    Error,
    /// 警告级别
    Warn,
    /// 信息级别
    Info,
    /// 调试级别
    Debug,
    /// 跟踪级别
    Trace,
}

impl LogLevel {
    /// 解析级别名称（不区分大小写）
    pub fn parse(text: &str) -> NormaResult<Self> {
        match text.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(NormaError::ConfigError {
                message: format!("无效的日志级别: {}", other),
            }),
        }
    }

    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 是否输出到终端
    pub console: bool,
}

impl LoggingConfig {
    pub fn builder() -> LoggingConfigBuilder {
        LoggingConfigBuilder::new()
    }
}

/// 日志配置构建器
#[derive(Debug, Default)]
pub struct LoggingConfigBuilder {
    level: Option<LogLevel>,
    console: Option<bool>,
}

impl LoggingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置日志级别
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// 设置是否输出到终端
    pub fn console(mut self, console: bool) -> Self {
        self.console = Some(console);
        self
    }

    /// 构建日志配置
    ///
    /// # 错误
    ///
    /// 级别或终端选项未设置时返回错误
    pub fn build(self) -> NormaResult<LoggingConfig> {
        let level = self
            .level
            .ok_or_else(|| crate::norma_error!(config, "日志级别必须设置"))?;
        let console = self
            .console
            .ok_or_else(|| crate::norma_error!(config, "终端输出选项必须设置"))?;
        Ok(LoggingConfig { level, console })
    }
}

/// 初始化全局日志
///
/// 关闭终端输出时不安装任何处理器，日志被丢弃
pub fn init_logging(config: &LoggingConfig) -> NormaResult<()> {
    if !config.console {
        return Ok(());
    }
    LoggerBuilder::new()
        .with_level(config.level.to_level_filter())
        .add_terminal_with_config(TermConfig::default())
        .init()
        .map_err(|e| NormaError::ConfigError {
            message: format!("日志初始化失败: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!(LogLevel::parse("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::parse("warning").unwrap(), LogLevel::Warn);
        assert!(LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_builder_requires_all_options() {
        assert!(LoggingConfig::builder().level(LogLevel::Info).build().is_err());
        let config = LoggingConfig::builder()
            .level(LogLevel::Warn)
            .console(true)
            .build()
            .unwrap();
        assert!(matches!(config.level.to_level_filter(), LevelFilter::Warn));
    }
}
