//! norma 演示程序：建表、写入一个用户和一篇文章，再查询

use clap::Parser;
use norma::client::{ClientConfig, NormaClient};
use norma::config::{init_logging, Settings};
use norma::demo::run_demo;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "norma-demo", version, about = "norma 演示程序")]
struct Args {
    /// 配置文件（TOML 或 JSON），缺省时读取环境变量
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 连接URL，覆盖配置中的 DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::from_env()?,
    };
    init_logging(&settings.logging_config())?;

    let config = match args.database_url {
        Some(url) => ClientConfig::builder()
            .database_url(url)
            .echo(settings.db_echo)
            .database_name(settings.mongodb_database.clone())
            .build()?,
        None => ClientConfig::from_settings(&settings)?,
    };

    let client = NormaClient::new(config);
    let report = run_demo(&client).await?;
    println!(
        "🎉 演示完成: 用户 {}, 文章 {}",
        report.user.id, report.post.id
    );
    Ok(())
}
