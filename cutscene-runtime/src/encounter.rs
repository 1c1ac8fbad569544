//! # Encounter 模块
//!
//! 头目遭遇的生命周期状态机与显式游戏状态上下文。
//!
//! ## 设计原则
//!
//! - 阶段推进全部经过显式方法；一次性阶段的重复进入是 no-op，不是错误
//! - 过场逻辑涉及的全部游戏状态（可对话标志、"金币不足"、
//!   头目阶段位）收拢进 [`EncounterContext`]，状态机没有环境可变依赖
//! - 只有终结转换代码和显式的阶段推进调用可以改写阶段；
//!   刷怪器和效果派发器只读

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// 地图标识符
pub type MapId = String;

/// 遭遇阶段
///
/// ```text
/// Idle → GateReached → PreFightDialogue → Engaged → PostFightDialogue → Fled
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum EncounterPhase {
    /// 未触发
    #[default]
    Idle,
    /// 已越过触发点，刷怪被抑制
    GateReached,
    /// 战前对话进行中
    PreFightDialogue,
    /// 交战中
    Engaged,
    /// 战后对话进行中
    PostFightDialogue,
    /// 头目已离开
    Fled,
}

/// 遭遇生命周期
///
/// 每个头目身份、每个存档槽按地图各持有一份。
/// 一次性标志保证同一遭遇中每段过场至多触发一次。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncounterLifecycle {
    phase: EncounterPhase,
    dialogue_before_shown: bool,
    dialogue_after_shown: bool,
    dialogue_after_leaving_shown: bool,
}

impl EncounterLifecycle {
    /// 创建处于 Idle 的生命周期
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前阶段
    pub fn phase(&self) -> EncounterPhase {
        self.phase
    }

    /// 玩家越过触发点：`Idle → GateReached`
    ///
    /// 返回是否发生了转换；重复进入是 no-op。
    pub fn reach_gate(&mut self) -> bool {
        if self.phase == EncounterPhase::Idle {
            self.phase = EncounterPhase::GateReached;
            true
        } else {
            false
        }
    }

    /// 激活战前过场：`GateReached → PreFightDialogue`
    ///
    /// 由 `dialogue_before_shown` 闩锁保护，每次遭遇至多一次。
    pub fn begin_pre_fight_dialogue(&mut self) -> bool {
        if self.phase == EncounterPhase::GateReached && !self.dialogue_before_shown {
            self.dialogue_before_shown = true;
            self.phase = EncounterPhase::PreFightDialogue;
            true
        } else {
            false
        }
    }

    /// 战前终结转换的延迟收尾：`PreFightDialogue → Engaged`
    pub fn engage(&mut self) -> bool {
        if self.phase == EncounterPhase::PreFightDialogue {
            self.phase = EncounterPhase::Engaged;
            true
        } else {
            false
        }
    }

    /// 外部战斗结算通知胜利：`Engaged → PostFightDialogue`
    ///
    /// 由 `dialogue_after_shown` 闩锁保护。
    pub fn begin_post_fight_dialogue(&mut self) -> bool {
        if self.phase == EncounterPhase::Engaged && !self.dialogue_after_shown {
            self.dialogue_after_shown = true;
            self.phase = EncounterPhase::PostFightDialogue;
            true
        } else {
            false
        }
    }

    /// 战后终结转换：`PostFightDialogue → Fled`
    pub fn flee(&mut self) -> bool {
        if self.phase == EncounterPhase::PostFightDialogue {
            self.phase = EncounterPhase::Fled;
            true
        } else {
            false
        }
    }

    /// 头目离开后的追加对话闩锁（后续地图的触发器消费）
    ///
    /// 返回是否是首次标记。
    pub fn mark_dialogue_after_leaving(&mut self) -> bool {
        if self.dialogue_after_leaving_shown {
            false
        } else {
            self.dialogue_after_leaving_shown = true;
            true
        }
    }

    /// 当前阶段是否抑制本地图的常规刷怪
    ///
    /// 刷怪器在每次刷怪尝试前查询此方法，而不是反向通知。
    pub fn suppresses_spawning(&self) -> bool {
        matches!(
            self.phase,
            EncounterPhase::GateReached | EncounterPhase::PreFightDialogue | EncounterPhase::Engaged
        )
    }
}

/// 显式的遭遇上下文
///
/// 状态机读写的全部游戏状态都在这里，以 `&mut` 传入——
/// 核心没有任何环境全局量。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterContext {
    /// 当前地图
    pub map_id: MapId,

    /// 玩家横向位置（触发点判定用）
    pub player_x: f32,

    /// 玩家金币数
    pub coins: u32,

    /// "可与 NPC 对话"标志
    pub can_talk: bool,

    /// 待播过场队列（过场标识符）
    pub pending_cutscenes: VecDeque<String>,

    /// 投币门槛未达标志（收费过场构建时设置）
    ///
    /// 终结转换据此把通用过场路由到结算画面。
    pub requirement_failed: bool,

    /// 头目已离开区域（后续地图的触发器消费）
    pub boss_fled: bool,

    /// 具名剧情标志
    pub flags: HashMap<String, bool>,

    /// 本地图的遭遇生命周期
    pub lifecycle: EncounterLifecycle,
}

impl EncounterContext {
    /// 创建新上下文
    pub fn new(map_id: impl Into<MapId>) -> Self {
        Self {
            map_id: map_id.into(),
            player_x: 0.0,
            coins: 0,
            can_talk: false,
            pending_cutscenes: VecDeque::new(),
            requirement_failed: false,
            boss_fled: false,
            flags: HashMap::new(),
            lifecycle: EncounterLifecycle::new(),
        }
    }

    /// 查询具名标志（缺省 false）
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// 设置具名标志
    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_phases() {
        let mut lc = EncounterLifecycle::new();
        assert_eq!(lc.phase(), EncounterPhase::Idle);

        assert!(lc.reach_gate());
        assert!(lc.begin_pre_fight_dialogue());
        assert!(lc.engage());
        assert!(lc.begin_post_fight_dialogue());
        assert!(lc.flee());
        assert_eq!(lc.phase(), EncounterPhase::Fled);
    }

    #[test]
    fn test_one_shot_phases_are_noop_on_reentry() {
        let mut lc = EncounterLifecycle::new();
        assert!(lc.reach_gate());
        assert!(!lc.reach_gate()); // 重复越过触发点

        assert!(lc.begin_pre_fight_dialogue());
        assert!(lc.engage());
        // 战前对话闩锁已置位，即使回到 GateReached 也不会再触发
        assert!(!lc.begin_pre_fight_dialogue());

        assert!(lc.begin_post_fight_dialogue());
        assert!(!lc.begin_post_fight_dialogue());
    }

    #[test]
    fn test_out_of_order_transitions_are_noop() {
        let mut lc = EncounterLifecycle::new();
        // Idle 下直接 engage / flee 都是 no-op
        assert!(!lc.engage());
        assert!(!lc.flee());
        assert!(!lc.begin_post_fight_dialogue());
        assert_eq!(lc.phase(), EncounterPhase::Idle);
    }

    #[test]
    fn test_spawn_suppression_window() {
        let mut lc = EncounterLifecycle::new();
        assert!(!lc.suppresses_spawning());

        lc.reach_gate();
        assert!(lc.suppresses_spawning());
        lc.begin_pre_fight_dialogue();
        assert!(lc.suppresses_spawning());
        lc.engage();
        assert!(lc.suppresses_spawning());

        lc.begin_post_fight_dialogue();
        assert!(!lc.suppresses_spawning());
        lc.flee();
        assert!(!lc.suppresses_spawning());
    }

    #[test]
    fn test_after_leaving_latch() {
        let mut lc = EncounterLifecycle::new();
        assert!(lc.mark_dialogue_after_leaving());
        assert!(!lc.mark_dialogue_after_leaving());
    }

    #[test]
    fn test_context_flags() {
        let mut ctx = EncounterContext::new("glacier");
        assert!(!ctx.flag("met_penguin"));

        ctx.set_flag("met_penguin", true);
        assert!(ctx.flag("met_penguin"));
    }

    #[test]
    fn test_context_serialization() {
        let mut ctx = EncounterContext::new("glacier");
        ctx.coins = 42;
        ctx.pending_cutscenes.push_back("pre_fight".to_string());
        ctx.lifecycle.reach_gate();

        let json = serde_json::to_string(&ctx).unwrap();
        let deserialized: EncounterContext = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx, deserialized);
    }
}
