//! # Command 模块
//!
//! 定义 Runtime 向 Host 发出的所有指令。
//! Command 是 Runtime 与 Host 之间的**唯一通信方式**。
//!
//! ## 设计原则
//!
//! - **声明式**：Command 描述"做什么"，不描述"怎么做"
//! - **无副作用**：Command 本身不执行任何操作
//! - **引擎无关**：音频/渲染/存档的具体实现全部由 Host 负责

use serde::{Deserialize, Serialize};

/// 音轨标识符
///
/// 具体到文件路径还是资源 id 由 Host 解释，Runtime 只做透传。
pub type TrackId = String;

/// Runtime 向 Host 发出的指令
///
/// Host 接收 Command 后，将其转换为实际的音频、渲染、存档操作。
/// 本核心不直接绘制、不直接发声、不直接写盘。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// 播放背景音乐
    PlayBgm {
        /// 音轨标识
        track: TrackId,
        /// 是否循环播放
        looping: bool,
    },

    /// 停止背景音乐
    StopBgm {
        /// 淡出时长（毫秒），None 表示立即停止
        fade_out_ms: Option<u64>,
    },

    /// 播放环境音（可与 BGM 并存）
    PlayAmbience {
        /// 音轨标识
        track: TrackId,
    },

    /// 停止环境音
    StopAmbience {
        /// 音轨标识
        track: TrackId,
    },

    /// 播放一次性音效
    PlaySfx {
        /// 音轨标识
        track: TrackId,
    },

    /// 停止所有音频
    StopAllAudio,

    /// 背景过渡动画（淡出 → 保持 → 淡入）
    ///
    /// 战前终结转换使用固定时长参数，具体渲染由 Host 完成。
    BackgroundTransition {
        /// 淡出时长（毫秒）
        fade_out_ms: u64,
        /// 黑屏保持时长（毫秒）
        hold_ms: u64,
        /// 淡入时长（毫秒）
        fade_in_ms: u64,
    },

    /// 屏幕闪烁（梦境节拍使用）
    ScreenFlicker {
        /// 闪烁时长（毫秒）
        duration_ms: u64,
    },

    /// 进入结算/游戏结束画面
    ShowGameOver,

    /// 请求持久化最佳记录
    ///
    /// RecordKeeper 发生写入后发出，由 Host 的存档层落盘。
    PersistRecords,

    /// 过场结束（Host 可据此回收过场对象、恢复主循环）
    CutsceneEnded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serialization() {
        let cmd = Command::PlayBgm {
            track: "boss_theme".to_string(),
            looping: true,
        };

        let json = serde_json::to_string(&cmd).unwrap();
        let deserialized: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, deserialized);
    }

    #[test]
    fn test_background_transition_fields() {
        let cmd = Command::BackgroundTransition {
            fade_out_ms: 600,
            hold_ms: 400,
            fade_in_ms: 600,
        };

        let json = serde_json::to_string(&cmd).unwrap();
        let deserialized: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, deserialized);
    }
}
