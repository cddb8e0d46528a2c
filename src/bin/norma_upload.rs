//! 交互式发布助手

use clap::Parser;
use norma::config::{init_logging, LoggingConfig, LogLevel};
use norma::publish::{PublishConfig, Prompter, Publisher, ShellRunner};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "norma-upload", version, about = "上传构建产物到包仓库")]
struct Args {
    /// 产物目录，覆盖配置中的 dist_dir
    #[arg(long)]
    dist: Option<PathBuf>,

    /// 发布配置文件（TOML）
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let logging = LoggingConfig {
        level: LogLevel::Warn,
        console: true,
    };
    if let Err(e) = init_logging(&logging) {
        eprintln!("❌ {}", e);
    }

    let config = match &args.config {
        Some(path) => match PublishConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ 错误: {}", e);
                std::process::exit(1);
            }
        },
        None => PublishConfig::default(),
    };
    let config = match args.dist {
        Some(dist) => config.with_dist_dir(dist),
        None => config,
    };

    let stdin = io::stdin();
    let prompter = Prompter::new(stdin.lock(), io::stdout());
    let mut publisher = Publisher::new(config, prompter, ShellRunner);
    let code = publisher.run();
    let _ = io::stdout().flush();
    std::process::exit(code);
}
