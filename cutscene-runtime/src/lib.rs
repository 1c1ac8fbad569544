//! # Cutscene Runtime
//!
//! 横版过关游戏的叙事核心：对话揭示与遭遇触发状态机。
//!
//! ## 架构概述
//!
//! `cutscene-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 它通过**命令驱动模式**与宿主层（Host）通信：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── AdvanceInput ───────────────►│
//!   │                                   │ handle_input()
//!   │◄─── Vec<Command> ────────────────│
//!   │                                   │
//!   │──── dt_ms ──────────────────────►│
//!   │                                   │ tick()（虚拟时钟）
//!   │◄─── Vec<Command> ────────────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`Script`] / [`ScriptEntry`]：授权的叙事剧本（含投币门槛分支）
//! - [`DialogueCursor`]：逐过场实例的揭示游标
//! - [`CutsceneRuntime`]：执行引擎（推进算法 + 终结转换）
//! - [`SideEffectDispatcher`]：按（阶段 × 行）查表的副作用派发
//! - [`EncounterLifecycle`] / [`EncounterContext`]：遭遇状态机与显式上下文
//! - [`RecordKeeper`]：最佳用时的比较交换记录
//! - [`EncounterTrigger`]：主循环一侧的触发前置判定
//! - [`TimerScheduler`]：显式定时任务（延迟动作可用虚拟时钟测试）
//!
//! ## 模块结构
//!
//! - [`command`]：Command 定义
//! - [`input`]：AdvanceInput 与输入前置条件
//! - [`script`]：剧本数据模型
//! - [`cursor`]：对话游标
//! - [`effects`]：副作用表与派发器
//! - [`encounter`]：遭遇生命周期与上下文
//! - [`records`]：最佳用时记录
//! - [`trigger`]：遭遇触发
//! - [`scheduler`]：定时调度
//! - [`runtime`]：执行引擎
//! - [`error`]：错误类型定义

pub mod command;
pub mod cursor;
pub mod effects;
pub mod encounter;
pub mod error;
pub mod input;
pub mod records;
pub mod runtime;
pub mod scheduler;
pub mod script;
pub mod trigger;

// 重导出核心类型
pub use command::{Command, TrackId};
pub use cursor::DialogueCursor;
pub use effects::{Effect, EffectTable, SideEffectDispatcher};
pub use encounter::{EncounterContext, EncounterLifecycle, EncounterPhase, MapId};
pub use error::{CutsceneResult, RuntimeError, ScriptError};
pub use input::{AdvanceInput, InputGate};
pub use records::{RecordEntry, RecordKeeper, RecordTable};
pub use runtime::{CutsceneRuntime, TerminalCues};
pub use scheduler::{TimerId, TimerScheduler, TimerToken};
pub use script::{CashOut, Directive, PortraitSlot, Script, ScriptEntry, TollOutcome};
pub use trigger::{CutsceneRequest, EncounterTrigger, VictoryOutcome};
