//! 交互式发布助手
//!
//! 检查构建产物和上传工具，校验产物后让用户选择先上传到预发布仓库
//! 还是直接上传到正式仓库。每次上传前都需要 `y/N` 确认

mod config;
mod prerequisites;
mod prompt;
mod runner;

pub use config::{matches_pattern, PackageInfo, PublishConfig};
pub use prerequisites::{check_prerequisites, Artifacts};
pub use prompt::Prompter;
pub use runner::{run_command, CommandOutput, CommandRunner, ShellRunner};

use rat_logger::{error, info};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// 发布错误
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("{dist}/ 目录不存在，请先运行 '{hint}'")]
    DistMissing { dist: String, hint: String },

    #[error("{dist}/ 中缺少 wheel 或 tar.gz 文件，请先运行 '{hint}'")]
    ArtifactsMissing { dist: String, hint: String },

    #[error("{tool} 未安装，请运行 '{hint}'")]
    ToolMissing { tool: String, hint: String },

    #[error("发布配置错误: {message}")]
    Config { message: String },

    #[error("IO错误: {0}")]
    Io(#[from] io::Error),
}

/// 上传目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Staging,
    Production,
}

/// 发布流程
pub struct Publisher<R, W, C> {
    config: PublishConfig,
    prompter: Prompter<R, W>,
    runner: C,
}

impl<R: BufRead, W: Write, C: CommandRunner> Publisher<R, W, C> {
    pub fn new(config: PublishConfig, prompter: Prompter<R, W>, runner: C) -> Self {
        Self {
            config,
            prompter,
            runner,
        }
    }

    /// 执行完整流程并返回进程退出码
    ///
    /// 前置条件不满足、产物校验失败或菜单选择无效时返回 1，
    /// 用户取消或跳过上传时返回 0
    pub fn run(&mut self) -> i32 {
        match self.run_inner() {
            Ok(code) => code,
            Err(e) => {
                error!("发布流程中断: {}", e);
                let _ = self.prompter.say(&format!("❌ 错误: {}", e));
                1
            }
        }
    }

    pub fn into_parts(self) -> (Prompter<R, W>, C) {
        (self.prompter, self.runner)
    }

    fn run_inner(&mut self) -> Result<i32, PublishError> {
        self.prompter.say(&format!("🚀 {} 发布助手", self.config.package.name))?;
        self.prompter.say(&"=".repeat(50))?;

        let artifacts = match check_prerequisites(&self.config, &mut self.runner) {
            Ok(artifacts) => artifacts,
            Err(e) => {
                self.prompter.say(&format!("❌ 错误: {}", e))?;
                return Ok(1);
            }
        };
        self.prompter.say(&format!(
            "✅ 找到 {} 个 wheel 文件和 {} 个 tar.gz 文件",
            artifacts.wheels.len(),
            artifacts.sdists.len()
        ))?;

        let check = self.config.render(&self.config.check_command);
        if !self.run_step(&check, "包校验")? {
            return Ok(1);
        }

        self.show_package(&artifacts)?;

        self.prompter.say("\n🎯 上传选项:")?;
        self.prompter.say("1. 先上传到 Test PyPI（推荐）")?;
        self.prompter.say("2. 直接上传到 PyPI")?;
        self.prompter.say("3. 退出")?;
        let choice = self.prompter.ask("\n请选择 (1-3): ")?;

        match choice.as_str() {
            "1" => {
                if self.upload(Target::Staging)? {
                    let hint = self.config.package.staging_install.clone();
                    self.prompter.say("\n🧪 测试安装命令:")?;
                    self.prompter.say(&format!("   {}", hint))?;
                    self.prompter.say("\n测试通过后可以继续上传到 PyPI")?;
                    self.upload(Target::Production)?;
                }
                Ok(0)
            }
            "2" => {
                self.upload(Target::Production)?;
                Ok(0)
            }
            "3" => {
                self.prompter.say("👋 已取消上传")?;
                Ok(0)
            }
            _ => {
                self.prompter.say("❌ 无效的选择")?;
                Ok(1)
            }
        }
    }

    fn run_step(&mut self, command: &str, description: &str) -> io::Result<bool> {
        run_command(&mut self.runner, self.prompter.output(), command, description)
    }

    fn show_package(&mut self, artifacts: &Artifacts) -> io::Result<()> {
        let package = self.config.package.clone();
        self.prompter.say("\n📋 包信息:")?;
        self.prompter.say(&format!("   名称: {}", package.name))?;
        self.prompter.say(&format!("   版本: {}", package.version))?;
        self.prompter.say(&format!("   作者: {}", package.author))?;
        self.prompter.say(&format!("   描述: {}", package.description))?;

        self.prompter.say("\n📦 待上传文件:")?;
        for (name, size) in &artifacts.files {
            self.prompter.say(&format!("   {} ({} bytes)", name, size))?;
        }
        Ok(())
    }

    /// 确认并上传，返回是否上传成功
    fn upload(&mut self, target: Target) -> io::Result<bool> {
        let package = &self.config.package;
        let (label, template, register_url) = match target {
            Target::Staging => (
                "Test PyPI",
                self.config.staging_upload_command.clone(),
                package.staging_register_url.clone(),
            ),
            Target::Production => (
                "PyPI",
                self.config.production_upload_command.clone(),
                package.production_register_url.clone(),
            ),
        };
        let command = self.config.render(&template);

        self.prompter.say(&format!("\n📤 上传到 {}...", label))?;
        if target == Target::Production {
            self.prompter.say("⚠️  警告: 包将被公开发布!")?;
        }
        self.prompter.say(&format!("需要 {} 账号: {}", label, register_url))?;
        self.prompter.say(&format!("命令: {}", command))?;

        if !self.prompter.confirm(&format!("上传到 {}? (y/N): ", label))? {
            self.prompter.say(&format!("❌ 已跳过 {} 上传", label))?;
            return Ok(false);
        }

        let uploaded = self.run_step(&command, &format!("上传到 {}", label))?;
        if uploaded {
            info!("已上传到 {}", label);
            if target == Target::Production {
                let install = self.config.package.production_install.clone();
                self.prompter.say("\n🎉 已成功上传到 PyPI!")?;
                self.prompter.say(&format!("安装命令: {}", install))?;
            }
        }
        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// 记录命令并按前缀返回预设结果
    #[derive(Default)]
    struct FakeRunner {
        commands: Vec<String>,
        failing: Vec<String>,
    }

    impl CommandRunner for FakeRunner {
        fn run(&mut self, command: &str) -> io::Result<CommandOutput> {
            self.commands.push(command.to_string());
            let success = !self.failing.iter().any(|prefix| command.starts_with(prefix));
            Ok(CommandOutput {
                success,
                stdout: String::new(),
                stderr: if success { String::new() } else { "boom".to_string() },
            })
        }
    }

    fn dist_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), b"artifact").unwrap();
        }
        dir
    }

    fn publish(dir: &tempfile::TempDir, input: &str, runner: FakeRunner) -> (i32, String, Vec<String>) {
        let config = PublishConfig::default().with_dist_dir(dir.path());
        let prompter = Prompter::new(Cursor::new(input.to_string()), Vec::new());
        let mut publisher = Publisher::new(config, prompter, runner);
        let code = publisher.run();
        let (prompter, runner) = publisher.into_parts();
        let (_, output) = prompter.into_inner();
        (code, String::from_utf8(output).unwrap(), runner.commands)
    }

    #[test]
    fn test_missing_dist_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = PublishConfig::default().with_dist_dir(dir.path().join("dist"));
        let prompter = Prompter::new(Cursor::new(String::new()), Vec::new());
        let mut publisher = Publisher::new(config, prompter, FakeRunner::default());
        assert_eq!(publisher.run(), 1);
        let (_, runner) = publisher.into_parts();
        assert!(runner.commands.is_empty());
    }

    #[test]
    fn test_missing_sdist_exits_with_failure() {
        let dir = dist_with(&["norma_orm-0.1.0-py3-none-any.whl"]);
        let (code, output, _) = publish(&dir, "", FakeRunner::default());
        assert_eq!(code, 1);
        assert!(output.contains("tar.gz"));
    }

    #[test]
    fn test_missing_tool_exits_with_failure() {
        let dir = dist_with(&["a-0.1.0-py3-none-any.whl", "a-0.1.0.tar.gz"]);
        let runner = FakeRunner {
            failing: vec!["twine --version".to_string()],
            ..Default::default()
        };
        let (code, output, _) = publish(&dir, "", runner);
        assert_eq!(code, 1);
        assert!(output.contains("pip install twine"));
    }

    #[test]
    fn test_failed_verification_exits_with_failure() {
        let dir = dist_with(&["a-0.1.0-py3-none-any.whl", "a-0.1.0.tar.gz"]);
        let runner = FakeRunner {
            failing: vec!["twine check".to_string()],
            ..Default::default()
        };
        let (code, _, commands) = publish(&dir, "1\ny\n", runner);
        assert_eq!(code, 1);
        assert!(!commands.iter().any(|c| c.starts_with("twine upload")));
    }

    #[test]
    fn test_invalid_choice_exits_with_failure() {
        let dir = dist_with(&["a-0.1.0-py3-none-any.whl", "a-0.1.0.tar.gz"]);
        let (code, _, commands) = publish(&dir, "7\n", FakeRunner::default());
        assert_eq!(code, 1);
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn test_staging_then_production() {
        let dir = dist_with(&["a-0.1.0-py3-none-any.whl", "a-0.1.0.tar.gz"]);
        let (code, output, commands) = publish(&dir, "1\ny\ny\n", FakeRunner::default());
        assert_eq!(code, 0);
        let uploads: Vec<_> = commands.iter().filter(|c| c.starts_with("twine upload")).collect();
        assert_eq!(uploads.len(), 2);
        assert!(uploads[0].contains("--repository testpypi"));
        assert!(!uploads[1].contains("--repository"));
        assert!(output.contains("pip install norma-orm"));
    }

    #[test]
    fn test_declining_skips_upload() {
        let dir = dist_with(&["a-0.1.0-py3-none-any.whl", "a-0.1.0.tar.gz"]);
        let (code, output, commands) = publish(&dir, "2\nyes\n", FakeRunner::default());
        assert_eq!(code, 0);
        assert!(!commands.iter().any(|c| c.starts_with("twine upload")));
        assert!(output.contains("已跳过 PyPI 上传"));
    }

    #[test]
    fn test_upload_command_shown_before_confirmation() {
        let dir = dist_with(&["a-0.1.0-py3-none-any.whl", "a-0.1.0.tar.gz"]);
        let (_, output, _) = publish(&dir, "2\nn\n", FakeRunner::default());
        let shown = output.find("命令: twine upload").expect("上传命令未显示");
        let asked = output.find("上传到 PyPI? (y/N)").expect("缺少确认提示");
        assert!(shown < asked);
    }

    #[test]
    fn test_exit_choice_uploads_nothing() {
        let dir = dist_with(&["a-0.1.0-py3-none-any.whl", "a-0.1.0.tar.gz"]);
        let (code, output, commands) = publish(&dir, "3\n", FakeRunner::default());
        assert_eq!(code, 0);
        assert_eq!(commands.len(), 2);
        assert!(output.contains("已取消上传"));
    }
}
