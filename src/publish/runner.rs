//! 外部命令执行

use rat_logger::debug;
use std::io::{self, Write};
use std::process::Command;

/// 命令执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// 命令执行器
pub trait CommandRunner {
    fn run(&mut self, command: &str) -> io::Result<CommandOutput>;
}

/// 通过 `sh -c` 执行命令并捕获输出
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str) -> io::Result<CommandOutput> {
        debug!("执行命令: {}", command);
        let output = Command::new("sh").arg("-c").arg(command).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// 执行命令并输出进度，失败时打印命令和错误输出
pub fn run_command<C, W>(runner: &mut C, out: &mut W, command: &str, description: &str) -> io::Result<bool>
where
    C: CommandRunner + ?Sized,
    W: Write,
{
    writeln!(out, "🔄 {}...", description)?;
    let output = match runner.run(command) {
        Ok(output) => output,
        Err(e) => {
            writeln!(out, "❌ 错误: {} 失败", description)?;
            writeln!(out, "命令: {}", command)?;
            writeln!(out, "错误: {}", e)?;
            return Ok(false);
        }
    };

    if !output.success {
        writeln!(out, "❌ 错误: {} 失败", description)?;
        writeln!(out, "命令: {}", command)?;
        writeln!(out, "错误: {}", output.stderr)?;
        return Ok(false);
    }

    writeln!(out, "✅ {} 完成", description)?;
    if !output.stdout.is_empty() {
        writeln!(out, "输出: {}", output.stdout)?;
    }
    Ok(true)
}
