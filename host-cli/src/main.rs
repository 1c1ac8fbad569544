//! # Host CLI
//!
//! 叙事核心的 headless 演示宿主：加载遭遇数据，
//! 用 stdin 命令驱动 触发器 → 过场 → 记录 的完整链路。
//!
//! 渲染、音频、物理都是外部协作者；这里把它们的效果落到
//! 结构化日志，核心逻辑与真实前端完全一致。

use std::io::BufReader;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod driver;
mod executor;
mod records_store;
mod scene_loader;

use config::AppConfig;
use driver::Driver;
use records_store::RecordsStore;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "host-cli", about = "对话揭示/遭遇触发状态机的演示宿主")]
struct Args {
    /// 配置文件路径
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// 遭遇数据文件路径（覆盖配置文件）
    #[arg(long)]
    encounter: Option<PathBuf>,

    /// 最佳记录文件路径（覆盖配置文件）
    #[arg(long)]
    records: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::load(&args.config)?;

    // 命令行参数优先于配置文件
    if args.encounter.is_some() {
        config.encounter_path = args.encounter;
    }
    if let Some(records) = args.records {
        config.records_path = records;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    let encounter = match &config.encounter_path {
        Some(path) => scene_loader::load_encounter(path)?,
        None => {
            warn!("未配置遭遇数据文件，使用内置演示遭遇");
            scene_loader::demo_encounter()
        }
    };

    info!(records_path = %config.records_path.display(), "最佳记录文件");
    let store = RecordsStore::new(&config.records_path);

    let mut driver = Driver::new(encounter, store)?;
    driver.run(BufReader::new(std::io::stdin()))
}
