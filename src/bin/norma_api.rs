//! norma 示例HTTP服务

use clap::Parser;
use norma::config::{init_logging, Settings};
use rat_logger::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "norma-api", version, about = "norma 示例HTTP服务")]
struct Args {
    /// 配置文件（TOML 或 JSON），缺省时读取环境变量
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 监听地址，覆盖配置中的 bind_addr
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::from_env()?,
    };
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }

    init_logging(&settings.logging_config())?;
    info!("启动 {}，数据库类型: {}", norma::get_info(), settings.db_type);

    norma::web::serve(settings).await?;
    Ok(())
}
