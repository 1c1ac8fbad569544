//! # Engine 模块
//!
//! 过场执行引擎。
//!
//! ## 执行模型
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │── handle_input(ctx, input) ─────►│ 游标变换 + 副作用派发
//!   │◄───────── Vec<Command> ──────────│
//!   │                                   │
//!   │── tick(ctx, dt_ms) ─────────────►│ 定时收尾（虚拟时钟）
//!   │◄───────── Vec<Command> ──────────│
//! ```
//!
//! 同一次推进内的顺序保证：扣费检查先于游标变换；
//! 派发器在游标到达新位置之后调用。
//!
//! ## 延迟动作与拆除
//!
//! 所有延迟动作（战前收尾 3000ms、结算转场 20ms、梦境重挂 1000ms）
//! 都走 [`TimerScheduler`]。提前结束过场不取消已登记的一次性定时器，
//! 它们到期后经过防御性检查降级为 no-op。

use serde::{Deserialize, Serialize};

use crate::command::{Command, TrackId};
use crate::cursor::DialogueCursor;
use crate::effects::{Effect, EffectTable, SideEffectDispatcher};
use crate::encounter::{EncounterContext, EncounterPhase};
use crate::error::RuntimeError;
use crate::input::AdvanceInput;
use crate::runtime::advancer;
use crate::scheduler::{TimerScheduler, TimerToken};
use crate::script::{Script, ScriptEntry};

/// 战前终结转换的延迟收尾（毫秒）
pub const PRE_FIGHT_ENGAGE_DELAY_MS: u64 = 3000;

/// 门槛未达路径进入结算画面的延迟（毫秒）
pub const GAME_OVER_DELAY_MS: u64 = 20;

/// 梦境节拍后重新挂上输入监听的延迟（毫秒）
pub const DREAM_REATTACH_DELAY_MS: u64 = 1000;

/// 战前背景过渡的固定时长参数（毫秒）
pub const BG_FADE_OUT_MS: u64 = 600;
pub const BG_HOLD_MS: u64 = 400;
pub const BG_FADE_IN_MS: u64 = 600;

/// 头目过场的终结音频配置
///
/// 每个遭遇一份，随剧本一起授权。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalCues {
    /// 战前终结转换播放的"战斗开始"提示音
    pub battle_cue: TrackId,
    /// 交战阶段循环播放的音轨
    pub engage_bgm: TrackId,
    /// 战后终结转换是否置位"头目已离开"标志
    pub sets_boss_fled: bool,
}

/// 过场执行引擎
///
/// 持有剧本、游标、副作用派发器和定时调度器；
/// 一个过场实例对应一个引擎实例，过场结束后整体丢弃。
pub struct CutsceneRuntime {
    script: Script,
    cursor: DialogueCursor,
    dispatcher: SideEffectDispatcher,
    scheduler: TimerScheduler,
    /// 头目过场的终结音频配置（通用过场为 None）
    cues: Option<TerminalCues>,
    /// 过场是否仍在进行
    active: bool,
    /// 输入监听是否挂上
    listeners_attached: bool,
}

impl CutsceneRuntime {
    /// 创建新的过场实例
    pub fn new(script: Script, table: EffectTable, cues: Option<TerminalCues>) -> Self {
        let cursor = DialogueCursor::new(&script);
        Self {
            script,
            cursor,
            dispatcher: SideEffectDispatcher::new(table),
            scheduler: TimerScheduler::new(),
            cues,
            active: true,
            listeners_attached: true,
        }
    }

    /// 过场是否仍在进行
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 输入监听是否挂上
    pub fn listeners_attached(&self) -> bool {
        self.listeners_attached
    }

    /// 对话游标（渲染层读取揭示进度）
    pub fn cursor(&self) -> &DialogueCursor {
        &self.cursor
    }

    /// 当前激活的台词（渲染层读取说话者与展示指令）
    pub fn current_entry(&self) -> Option<&ScriptEntry> {
        self.script.entry(self.cursor.line_index)
    }

    /// 剧本
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// 是否还有未到期的定时收尾
    ///
    /// 过场结束后 Host 据此决定是否继续 tick 直到定时器耗尽。
    pub fn has_pending_timers(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// 处理一次推进输入
    ///
    /// 前置压制（不是错误）：监听已分离或输入锁定时返回空指令。
    ///
    /// # 错误
    ///
    /// 过场已结束后仍派发输入返回 [`RuntimeError::CutsceneInactive`]。
    pub fn handle_input(
        &mut self,
        ctx: &mut EncounterContext,
        input: AdvanceInput,
    ) -> Result<Vec<Command>, RuntimeError> {
        if !self.active {
            return Err(RuntimeError::CutsceneInactive);
        }
        if !self.listeners_attached || self.cursor.input_locked {
            return Ok(Vec::new());
        }

        match input {
            AdvanceInput::Advance => Ok(self.advance_once(ctx)),
            AdvanceInput::SkipAhead => Ok(self.skip_ahead(ctx)),
        }
    }

    /// 推进虚拟时钟，执行到期的延迟动作
    pub fn tick(&mut self, ctx: &mut EncounterContext, dt_ms: u64) -> Vec<Command> {
        let mut commands = Vec::new();

        for token in self.scheduler.tick(dt_ms) {
            match token {
                TimerToken::EngageBoss => {
                    // 过场可能已被提前拆除（退回主菜单）——防御性 no-op
                    if !self.active {
                        continue;
                    }
                    self.active = false;
                    self.listeners_attached = false;
                    ctx.can_talk = false;
                    ctx.pending_cutscenes.clear();
                    if ctx.lifecycle.engage() {
                        if let Some(cues) = &self.cues {
                            commands.push(Command::PlayBgm {
                                track: cues.engage_bgm.clone(),
                                looping: true,
                            });
                        }
                    }
                    commands.push(Command::CutsceneEnded);
                }

                TimerToken::ShowGameOver => {
                    // 标志可能已被外部清掉——再确认一次
                    if ctx.requirement_failed {
                        commands.push(Command::ShowGameOver);
                    }
                }

                TimerToken::ReattachInput => {
                    if self.active {
                        self.cursor.input_locked = false;
                        self.listeners_attached = true;
                    }
                }
            }
        }

        commands
    }

    /// 提前结束过场（玩家中途退出到主菜单）
    ///
    /// 已登记的一次性定时器保留，到期后降级为防御性 no-op。
    pub fn end(&mut self) {
        self.active = false;
        self.listeners_attached = false;
    }

    fn advance_once(&mut self, ctx: &mut EncounterContext) -> Vec<Command> {
        let outcome = advancer::advance(&mut self.cursor, &self.script);
        let mut commands = Vec::new();

        if let Some(amount) = outcome.cash_out {
            ctx.coins = ctx.coins.saturating_sub(amount);
        }

        if outcome.terminal {
            self.terminal_transition(ctx, &mut commands);
            return commands;
        }

        // 副作用派发：游标已到达新位置，行完全揭示才会产生效果
        if let Some(entry) = self.script.entry(self.cursor.line_index) {
            let effects = self
                .dispatcher
                .fire(ctx.lifecycle.phase(), &self.cursor, entry);
            for effect in effects {
                self.apply_effect(effect, &mut commands);
            }
        }

        commands
    }

    /// 跳过路径：战前阶段的修饰键输入
    ///
    /// 把游标直接挪到最后一行并走同一套战前终结序列，
    /// 不要求玩家逐行推进。其他阶段 no-op。
    fn skip_ahead(&mut self, ctx: &mut EncounterContext) -> Vec<Command> {
        if ctx.lifecycle.phase() != EncounterPhase::PreFightDialogue {
            return Vec::new();
        }

        let last = self.script.last_index();
        if let Some(entry) = self.script.entry(last) {
            self.cursor.jump_to_line_end(last, entry);
        }

        let mut commands = Vec::new();
        self.pre_fight_terminal(&mut commands);
        commands
    }

    /// 终结转换：最后一行揭示完毕，按当前遭遇阶段分流
    fn terminal_transition(&mut self, ctx: &mut EncounterContext, commands: &mut Vec<Command>) {
        match ctx.lifecycle.phase() {
            EncounterPhase::PreFightDialogue => self.pre_fight_terminal(commands),
            EncounterPhase::PostFightDialogue => self.post_fight_terminal(ctx, commands),
            _ => self.generic_terminal(ctx, commands),
        }
    }

    /// 战前分支：分离输入 → 背景过渡 + 战斗提示音 → 3000ms 后延迟收尾
    fn pre_fight_terminal(&mut self, commands: &mut Vec<Command>) {
        self.listeners_attached = false;
        commands.push(Command::BackgroundTransition {
            fade_out_ms: BG_FADE_OUT_MS,
            hold_ms: BG_HOLD_MS,
            fade_in_ms: BG_FADE_IN_MS,
        });
        if let Some(cues) = &self.cues {
            commands.push(Command::PlaySfx {
                track: cues.battle_cue.clone(),
            });
        }
        self.scheduler
            .schedule(PRE_FIGHT_ENGAGE_DELAY_MS, TimerToken::EngageBoss);
    }

    /// 战后分支：立即结束，无延迟、无背景过渡
    fn post_fight_terminal(&mut self, ctx: &mut EncounterContext, commands: &mut Vec<Command>) {
        self.active = false;
        self.listeners_attached = false;
        ctx.can_talk = false;
        ctx.pending_cutscenes.clear();
        ctx.lifecycle.flee();
        if let Some(cues) = &self.cues {
            if cues.sets_boss_fled {
                ctx.boss_fled = true;
            }
        }
        commands.push(Command::CutsceneEnded);
    }

    /// 通用分支：立即结束；门槛未达时 20ms 后转入结算画面
    fn generic_terminal(&mut self, ctx: &mut EncounterContext, commands: &mut Vec<Command>) {
        self.active = false;
        self.listeners_attached = false;
        ctx.can_talk = false;
        ctx.pending_cutscenes.clear();
        if ctx.requirement_failed {
            self.scheduler
                .schedule(GAME_OVER_DELAY_MS, TimerToken::ShowGameOver);
        }
        commands.push(Command::CutsceneEnded);
    }

    fn apply_effect(&mut self, effect: Effect, commands: &mut Vec<Command>) {
        match effect {
            Effect::PlayAmbience(track) => commands.push(Command::PlayAmbience { track }),
            Effect::StopAmbience(track) => commands.push(Command::StopAmbience { track }),
            Effect::PlayBgm { track, looping } => {
                commands.push(Command::PlayBgm { track, looping })
            }
            Effect::StopBgm { fade_out_ms } => commands.push(Command::StopBgm { fade_out_ms }),
            Effect::PlaySfx(track) => commands.push(Command::PlaySfx { track }),
            Effect::DreamBeat { cue, flicker_ms } => {
                // 分离监听 → 提示音 + 闪烁 → 固定延迟后重挂
                self.listeners_attached = false;
                self.cursor.input_locked = true;
                commands.push(Command::PlaySfx { track: cue });
                commands.push(Command::ScreenFlicker {
                    duration_ms: flicker_ms,
                });
                self.scheduler
                    .schedule(DREAM_REATTACH_DELAY_MS, TimerToken::ReattachInput);
            }
        }
    }
}
