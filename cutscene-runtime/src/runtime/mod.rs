//! # Runtime 模块
//!
//! 过场执行引擎：推进算法 + 终结转换 + 定时收尾。

pub mod advancer;
pub mod engine;

pub use engine::{CutsceneRuntime, TerminalCues};
