//! # CommandExecutor 模块
//!
//! 把 Runtime 发出的 Command 转换为宿主侧的实际效果。
//!
//! ## 设计说明
//!
//! 本宿主是 headless 演示驱动：音频与渲染效果落到结构化日志，
//! 同时维护一张音频状态表以支持 `is_playing` 查询。
//! 记录落盘与过场回收不在这里处理——它们需要更外层的状态，
//! 由 driver 根据返回的 [`ExecuteResult`] 接手。

use std::collections::BTreeSet;

use tracing::{debug, info};

use cutscene_runtime::{Command, TrackId};

/// 命令执行结果
///
/// 大多数命令就地消化；需要 driver 接手的命令映射为对应变体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteResult {
    /// 已就地执行
    Ok,
    /// 过场已结束，driver 回收过场对象
    CutsceneEnded,
    /// 进入结算画面
    GameOver,
    /// 请求把最佳记录落盘
    PersistRequested,
}

/// 命令执行器
///
/// 维护音频播放状态；一个演示会话一个实例。
#[derive(Debug, Default)]
pub struct CommandExecutor {
    /// 当前 BGM（音轨，是否循环）
    bgm: Option<(TrackId, bool)>,
    /// 正在播放的环境音
    ambience: BTreeSet<TrackId>,
}

impl CommandExecutor {
    /// 创建执行器
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询某条音轨是否在播放
    pub fn is_playing(&self, track: &str) -> bool {
        self.bgm.as_ref().is_some_and(|(bgm, _)| bgm == track)
            || self.ambience.contains(track)
    }

    /// 执行单条命令
    pub fn execute(&mut self, command: &Command) -> ExecuteResult {
        match command {
            Command::PlayBgm { track, looping } => {
                debug!(track = %track, looping = looping, "播放 BGM");
                self.bgm = Some((track.clone(), *looping));
                ExecuteResult::Ok
            }

            Command::StopBgm { fade_out_ms } => {
                debug!(fade_out_ms = ?fade_out_ms, "停止 BGM");
                self.bgm = None;
                ExecuteResult::Ok
            }

            Command::PlayAmbience { track } => {
                debug!(track = %track, "启动环境音");
                self.ambience.insert(track.clone());
                ExecuteResult::Ok
            }

            Command::StopAmbience { track } => {
                debug!(track = %track, "停止环境音");
                self.ambience.remove(track);
                ExecuteResult::Ok
            }

            Command::PlaySfx { track } => {
                debug!(track = %track, "播放音效");
                ExecuteResult::Ok
            }

            Command::StopAllAudio => {
                debug!("停止所有音频");
                self.bgm = None;
                self.ambience.clear();
                ExecuteResult::Ok
            }

            Command::BackgroundTransition {
                fade_out_ms,
                hold_ms,
                fade_in_ms,
            } => {
                debug!(
                    fade_out_ms = fade_out_ms,
                    hold_ms = hold_ms,
                    fade_in_ms = fade_in_ms,
                    "背景过渡"
                );
                ExecuteResult::Ok
            }

            Command::ScreenFlicker { duration_ms } => {
                debug!(duration_ms = duration_ms, "屏幕闪烁");
                ExecuteResult::Ok
            }

            Command::ShowGameOver => {
                info!("进入结算画面");
                ExecuteResult::GameOver
            }

            Command::PersistRecords => ExecuteResult::PersistRequested,

            Command::CutsceneEnded => {
                info!("过场结束");
                ExecuteResult::CutsceneEnded
            }
        }
    }
}
