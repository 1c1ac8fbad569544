//! # Config 模块
//!
//! 运行时配置管理。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 遭遇数据文件路径（JSON）
    ///
    /// 未配置时使用内置演示遭遇。
    #[serde(default)]
    pub encounter_path: Option<PathBuf>,

    /// 最佳记录文件路径
    #[serde(default = "default_records_path")]
    pub records_path: PathBuf,

    /// 日志过滤器（`RUST_LOG` 未设置时生效）
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            encounter_path: None,
            records_path: default_records_path(),
            log_filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// 从配置文件加载
    ///
    /// 文件不存在时返回默认配置；解析失败返回错误。
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

fn default_records_path() -> PathBuf {
    PathBuf::from("saves/records.json")
}

fn default_log_filter() -> String {
    "info".to_string()
}
