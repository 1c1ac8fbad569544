//! # RecordsStore 模块
//!
//! 最佳记录文件的读写。
//!
//! ## 文件布局
//!
//! ```text
//! saves/
//! └── records.json
//! ```
//!
//! 文件内容是记录表加一个保存时间戳；时间戳只用于展示，
//! 读取时不参与任何逻辑。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use cutscene_runtime::RecordTable;

/// 记录文件读写错误
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO 错误
    #[error("记录文件 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化/反序列化错误
    #[error("记录文件格式错误: {0}")]
    Format(#[from] serde_json::Error),
}

/// 记录文件内容
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordsFile {
    /// 保存时间（RFC 3339，仅用于展示）
    saved_at: String,
    /// 记录表
    records: RecordTable,
}

/// 记录存储
pub struct RecordsStore {
    path: PathBuf,
}

impl RecordsStore {
    /// 创建记录存储
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 读取记录表
    ///
    /// 文件不存在时返回空表（从未记录）。
    pub fn load(&self) -> Result<RecordTable, StoreError> {
        if !self.path.exists() {
            return Ok(RecordTable::default());
        }
        let content = fs::read_to_string(&self.path)?;
        let file: RecordsFile = serde_json::from_str(&content)?;
        Ok(file.records)
    }

    /// 写入记录表
    pub fn save(&self, records: &RecordTable) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = RecordsFile {
            saved_at: chrono::Local::now().to_rfc3339(),
            records: records.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)?;

        info!(path = %self.path.display(), "最佳记录已落盘");
        Ok(())
    }
}
