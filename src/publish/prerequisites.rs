//! 发布前置条件检查

use super::config::{matches_pattern, PublishConfig};
use super::runner::CommandRunner;
use super::PublishError;
use rat_logger::debug;
use std::path::PathBuf;

/// 产物目录中的文件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    /// 二进制包
    pub wheels: Vec<PathBuf>,
    /// 源码包
    pub sdists: Vec<PathBuf>,
    /// 目录中全部文件（文件名, 字节数），按文件名排序
    pub files: Vec<(String, u64)>,
}

/// 检查产物目录、产物文件和上传工具
pub fn check_prerequisites<C>(config: &PublishConfig, runner: &mut C) -> Result<Artifacts, PublishError>
where
    C: CommandRunner + ?Sized,
{
    let dist = &config.dist_dir;
    if !dist.is_dir() {
        return Err(PublishError::DistMissing {
            dist: dist.display().to_string(),
            hint: config.build_hint.clone(),
        });
    }

    let mut artifacts = Artifacts::default();
    for entry in std::fs::read_dir(dist)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if matches_pattern(&name, &config.wheel_pattern) {
            artifacts.wheels.push(entry.path());
        } else if matches_pattern(&name, &config.sdist_pattern) {
            artifacts.sdists.push(entry.path());
        }
        artifacts.files.push((name, metadata.len()));
    }
    artifacts.wheels.sort();
    artifacts.sdists.sort();
    artifacts.files.sort();

    if artifacts.wheels.is_empty() || artifacts.sdists.is_empty() {
        return Err(PublishError::ArtifactsMissing {
            dist: dist.display().to_string(),
            hint: config.build_hint.clone(),
        });
    }

    let probe = format!("{} --version", config.tool);
    let available = runner.run(&probe).map(|output| output.success).unwrap_or(false);
    if !available {
        return Err(PublishError::ToolMissing {
            tool: config.tool.clone(),
            hint: config.tool_install_hint.clone(),
        });
    }

    debug!(
        "前置条件满足: {} 个二进制包, {} 个源码包",
        artifacts.wheels.len(),
        artifacts.sdists.len()
    );
    Ok(artifacts)
}
