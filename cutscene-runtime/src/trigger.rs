//! # Trigger 模块
//!
//! 主循环一侧的遭遇触发逻辑：当叙事前置条件（地图、剧情标志、
//! 玩家位置）满足时，请求实例化一段过场。
//!
//! ## 设计说明
//!
//! 核心只产出 [`CutsceneRequest`]；剧本数据与
//! `Script + DialogueCursor` 的实例化由 Host 完成。
//! 阶段写入全部走 [`EncounterLifecycle`] 的显式方法，
//! 一次性闩锁保证每段过场至多触发一次。
//!
//! [`EncounterLifecycle`]: crate::encounter::EncounterLifecycle

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::encounter::{EncounterContext, MapId};
use crate::records::RecordKeeper;

/// 请求实例化的过场类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutsceneRequest {
    /// 战前对话
    PreFight,
    /// 战后对话
    PostFight,
    /// 头目离开后的追加对话
    AfterLeaving,
}

/// 胜利处理结果
#[derive(Debug, Clone, PartialEq)]
pub struct VictoryOutcome {
    /// 需要实例化的过场（一次性闩锁可能压制）
    pub request: Option<CutsceneRequest>,
    /// 需要 Host 执行的指令（记录写入时含落盘请求）
    pub commands: Vec<Command>,
}

/// 遭遇触发器
///
/// 每张带头目的地图配置一个。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterTrigger {
    /// 所属地图
    pub map_id: MapId,
    /// 触发点横向位置：玩家越过即视为抵达关口
    pub gate_x: f32,
    /// 额外要求的剧情标志（全部为真才触发）
    pub required_flags: Vec<String>,
}

impl EncounterTrigger {
    /// 创建触发器
    pub fn new(map_id: impl Into<MapId>, gate_x: f32) -> Self {
        Self {
            map_id: map_id.into(),
            gate_x,
            required_flags: Vec::new(),
        }
    }

    /// 附加剧情标志前置
    pub fn with_required_flags(mut self, flags: Vec<String>) -> Self {
        self.required_flags = flags;
        self
    }

    /// 前置条件是否满足（地图匹配、位置越过触发点、标志齐备）
    pub fn gate_crossed(&self, ctx: &EncounterContext) -> bool {
        ctx.map_id == self.map_id
            && ctx.player_x >= self.gate_x
            && self.required_flags.iter().all(|flag| ctx.flag(flag))
    }

    /// 每帧轮询：玩家越过触发点时翻入 GateReached
    ///
    /// 返回是否发生了转换；此后本地图的常规刷怪被抑制。
    pub fn poll_gate(&self, ctx: &mut EncounterContext) -> bool {
        if self.gate_crossed(ctx) {
            ctx.lifecycle.reach_gate()
        } else {
            false
        }
    }

    /// 抵达关口后请求战前过场（一次性）
    ///
    /// 成功时置位可对话标志并把请求排入待播队列。
    pub fn poll_pre_fight(&self, ctx: &mut EncounterContext) -> Option<CutsceneRequest> {
        if ctx.map_id != self.map_id {
            return None;
        }
        if ctx.lifecycle.begin_pre_fight_dialogue() {
            ctx.can_talk = true;
            ctx.pending_cutscenes.push_back("pre_fight".to_string());
            Some(CutsceneRequest::PreFight)
        } else {
            None
        }
    }

    /// 头目离开后再次路过的追加对话（一次性）
    ///
    /// 消费战后终结转换置位的 `boss_fled` 标志，
    /// 由 `dialogue_after_leaving_shown` 闩锁保证至多触发一次。
    pub fn poll_after_leaving(&self, ctx: &mut EncounterContext) -> Option<CutsceneRequest> {
        if ctx.map_id != self.map_id || !ctx.boss_fled {
            return None;
        }
        if ctx.lifecycle.mark_dialogue_after_leaving() {
            ctx.can_talk = true;
            ctx.pending_cutscenes.push_back("after_leaving".to_string());
            Some(CutsceneRequest::AfterLeaving)
        } else {
            None
        }
    }

    /// 外部战斗结算通知胜利
    ///
    /// 一次性地请求战后过场，并上报头目击破用时；
    /// 发生记录写入时附带落盘指令。
    pub fn handle_victory(
        &self,
        ctx: &mut EncounterContext,
        keeper: &mut RecordKeeper,
        elapsed_ms: f64,
    ) -> VictoryOutcome {
        let mut commands = Vec::new();

        if ctx.map_id != self.map_id {
            return VictoryOutcome {
                request: None,
                commands,
            };
        }

        if keeper.record_boss_clear(&self.map_id, ctx.coins, elapsed_ms) {
            commands.push(Command::PersistRecords);
        }

        let request = if ctx.lifecycle.begin_post_fight_dialogue() {
            ctx.can_talk = true;
            ctx.pending_cutscenes.push_back("post_fight".to_string());
            Some(CutsceneRequest::PostFight)
        } else {
            None
        };

        VictoryOutcome { request, commands }
    }
}
