//! # Error 模块
//!
//! 定义 cutscene-runtime 中使用的错误类型。
//!
//! ## 设计说明
//!
//! 本核心的大多数异常情况（一次性效果重复触发、锁定期间的重复输入、
//! 未知地图的记录写入）以**防御性降级**处理：静默 no-op，
//! 永远不会对玩家暴露错误。这里的错误类型只覆盖真正的 API 误用。

use thiserror::Error;

/// 剧本构建错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// 剧本为空
    #[error("剧本至少需要一条台词")]
    Empty,

    /// 一次性扣费行索引越界
    #[error("扣费行索引 {index} 超出剧本范围（共 {len} 行）")]
    CashOutOutOfRange { index: usize, len: usize },
}

/// 运行时错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 过场已结束后仍向其派发输入
    #[error("过场已结束，不再接收输入")]
    CutsceneInactive,
}

/// cutscene-runtime 统一 Result 类型别名
pub type CutsceneResult<T> = Result<T, RuntimeError>;
