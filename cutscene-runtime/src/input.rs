//! # Input 模块
//!
//! 定义 Host 向 Runtime 传递的输入事件。
//!
//! ## 设计说明
//!
//! - Runtime 不直接处理鼠标/键盘事件，只处理语义化的输入
//! - 原始事件到语义输入的映射（确认键/点击 → `Advance`，
//!   修饰键 → `SkipAhead`）由 Host 的输入层完成
//! - "当前是否允许接收输入"的前置检查由 Host 在调用前完成，
//!   [`InputGate`] 是这条前置检查的显式建模

use serde::{Deserialize, Serialize};

/// Host 向 Runtime 传递的推进输入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceInput {
    /// 推进一步（确认键按下或点击）
    Advance,

    /// 跳过剩余台词（修饰键，仅战前阶段生效）
    SkipAhead,
}

/// 输入前置条件
///
/// Host 的事件处理器在把原始输入转发给过场之前，必须确认
/// 此刻允许接收输入：未暂停、没有无关的模态菜单打开、
/// 且转场许可标志已置位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputGate {
    /// 游戏是否暂停
    pub paused: bool,
    /// 是否有模态菜单打开
    pub modal_open: bool,
    /// 转场许可标志
    pub transition_allowed: bool,
}

impl InputGate {
    /// 当前是否允许把输入转发给过场
    pub fn accepts_input(&self) -> bool {
        !self.paused && !self.modal_open && self.transition_allowed
    }
}

impl Default for InputGate {
    fn default() -> Self {
        Self {
            paused: false,
            modal_open: false,
            transition_allowed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_default_accepts() {
        assert!(InputGate::default().accepts_input());
    }

    #[test]
    fn test_gate_blocks_when_paused_or_modal() {
        let gate = InputGate {
            paused: true,
            ..Default::default()
        };
        assert!(!gate.accepts_input());

        let gate = InputGate {
            modal_open: true,
            ..Default::default()
        };
        assert!(!gate.accepts_input());

        let gate = InputGate {
            transition_allowed: false,
            ..Default::default()
        };
        assert!(!gate.accepts_input());
    }

    #[test]
    fn test_input_serialization() {
        let input = AdvanceInput::SkipAhead;
        let json = serde_json::to_string(&input).unwrap();
        let deserialized: AdvanceInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input, deserialized);
    }
}
