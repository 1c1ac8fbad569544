//! # Driver 模块
//!
//! 演示会话的主循环：stdin 命令 → 触发器/过场/记录 → Command 执行。
//!
//! ## 会话命令
//!
//! ```text
//! walk <x>    移动玩家到横向位置 x（触发点判定）
//! advance     推进对话（确认键）
//! skip        跳过剩余台词（修饰键，仅战前阶段）
//! tick <ms>   推进虚拟时钟
//! defeat      外部战斗结算：头目被击败
//! toll        与收费企鹅对话
//! cabin       小屋完全可见（全关通关上报点）
//! coins <n>   设置金币数
//! spawn       刷怪尝试（演示刷怪抑制）
//! records     查看最佳记录
//! pause / resume   切换暂停（输入前置条件演示）
//! quit        退出
//! ```

use std::io::BufRead;

use tracing::{debug, info, warn};

use cutscene_runtime::{
    AdvanceInput, Command, CutsceneRequest, CutsceneRuntime, EffectTable, EncounterContext,
    EncounterPhase, EncounterTrigger, InputGate, RecordKeeper,
};

use crate::executor::{CommandExecutor, ExecuteResult};
use crate::records_store::RecordsStore;
use crate::scene_loader::EncounterData;

/// 演示会话驱动
pub struct Driver {
    encounter: EncounterData,
    trigger: EncounterTrigger,
    ctx: EncounterContext,
    keeper: RecordKeeper,
    store: RecordsStore,
    executor: CommandExecutor,
    runtime: Option<CutsceneRuntime>,
    gate: InputGate,
    /// 交战计时（毫秒），交战开始时归零
    fight_clock_ms: Option<u64>,
    /// 关卡计时（毫秒）
    level_clock_ms: u64,
}

impl Driver {
    /// 创建驱动，恢复已持久化的最佳记录
    pub fn new(encounter: EncounterData, store: RecordsStore) -> anyhow::Result<Self> {
        let trigger = EncounterTrigger::new(encounter.map_id.clone(), encounter.gate_x)
            .with_required_flags(encounter.required_flags.clone());
        let ctx = EncounterContext::new(encounter.map_id.clone());

        let mut requirements = std::collections::BTreeMap::new();
        requirements.insert(encounter.map_id.clone(), encounter.coins_required);
        let keeper = RecordKeeper::with_table(requirements, store.load()?);

        Ok(Self {
            encounter,
            trigger,
            ctx,
            keeper,
            store,
            executor: CommandExecutor::new(),
            runtime: None,
            gate: InputGate::default(),
            fight_clock_ms: None,
            level_clock_ms: 0,
        })
    }

    /// 当前遭遇上下文（测试与状态检查用）
    pub fn ctx(&self) -> &EncounterContext {
        &self.ctx
    }

    /// 当前记录保管器（测试与状态检查用）
    pub fn keeper(&self) -> &RecordKeeper {
        &self.keeper
    }

    /// 主循环：逐行读取命令直到 quit 或 EOF
    pub fn run(&mut self, input: impl BufRead) -> anyhow::Result<()> {
        info!(map_id = %self.encounter.map_id, "演示会话开始，输入命令（quit 退出）");

        for line in input.lines() {
            let line = line?;
            if !self.handle_line(line.trim()) {
                break;
            }
        }

        info!("演示会话结束");
        Ok(())
    }

    /// 处理一条命令，返回是否继续会话
    pub fn handle_line(&mut self, line: &str) -> bool {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return true;
        };

        match verb {
            "walk" => match parts.next().and_then(|x| x.parse::<f32>().ok()) {
                Some(x) => self.handle_walk(x),
                None => warn!("用法: walk <x>"),
            },
            "advance" => self.forward_input(AdvanceInput::Advance),
            "skip" => self.forward_input(AdvanceInput::SkipAhead),
            "tick" => match parts.next().and_then(|ms| ms.parse::<u64>().ok()) {
                Some(ms) => self.handle_tick(ms),
                None => warn!("用法: tick <ms>"),
            },
            "defeat" => self.handle_defeat(),
            "toll" => self.start_toll(),
            "cabin" => self.handle_cabin(),
            "coins" => match parts.next().and_then(|n| n.parse::<u64>().ok()) {
                Some(n) => {
                    self.ctx.coins = n as u32;
                    info!(coins = self.ctx.coins, "金币已设置");
                }
                None => warn!("用法: coins <n>"),
            },
            "spawn" => self.handle_spawn_attempt(),
            "records" => info!(records = ?self.keeper.table(), "最佳记录"),
            "pause" => {
                self.gate.paused = true;
                info!("已暂停");
            }
            "resume" => {
                self.gate.paused = false;
                info!("已恢复");
            }
            "quit" => return false,
            other => warn!(command = %other, "未知命令"),
        }

        true
    }

    fn handle_walk(&mut self, x: f32) {
        self.ctx.player_x = x;
        debug!(player_x = x, "玩家移动");

        if self.trigger.poll_gate(&mut self.ctx) {
            info!("越过触发点，常规刷怪已抑制");
        }
        if self.runtime.is_none() && self.trigger.poll_pre_fight(&mut self.ctx).is_some() {
            self.start_pre_fight();
        }
    }

    /// 输入前置检查后把推进输入转发给激活的过场
    fn forward_input(&mut self, input: AdvanceInput) {
        if !self.gate.accepts_input() {
            debug!("输入前置条件未满足，忽略");
            return;
        }

        let commands = {
            let Some(runtime) = self.runtime.as_mut() else {
                debug!("当前没有激活的过场");
                return;
            };
            if !runtime.is_active() {
                return;
            }
            match runtime.handle_input(&mut self.ctx, input) {
                Ok(commands) => commands,
                Err(error) => {
                    warn!(error = %error, "过场输入被拒绝");
                    return;
                }
            }
        };

        self.process_commands(commands);

        // 渲染层视角：读取游标的揭示进度
        if let Some(runtime) = self.runtime.as_ref() {
            if let Some(entry) = runtime.current_entry() {
                debug!(
                    speaker = %entry.speaker,
                    revealed = %runtime.cursor().revealed_text(entry),
                    "台词揭示进度"
                );
            }
        }
    }

    fn handle_tick(&mut self, dt_ms: u64) {
        self.level_clock_ms += dt_ms;
        if let Some(ms) = self.fight_clock_ms.as_mut() {
            *ms += dt_ms;
        }

        let phase_before = self.ctx.lifecycle.phase();

        let mut commands = Vec::new();
        let mut drained = false;
        if let Some(runtime) = self.runtime.as_mut() {
            commands = runtime.tick(&mut self.ctx, dt_ms);
            drained = !runtime.is_active() && !runtime.has_pending_timers();
        }
        self.process_commands(commands);
        if drained {
            self.runtime = None;
        }

        // 延迟收尾可能把遭遇翻入交战阶段
        if phase_before != EncounterPhase::Engaged
            && self.ctx.lifecycle.phase() == EncounterPhase::Engaged
        {
            self.keeper.arm_boss_guard(&self.encounter.map_id);
            self.fight_clock_ms = Some(0);
            info!("交战开始，记录计时归零");
        }
    }

    fn handle_defeat(&mut self) {
        let Some(elapsed_ms) = self.fight_clock_ms.take() else {
            info!("当前没有进行中的战斗");
            return;
        };

        let outcome = self
            .trigger
            .handle_victory(&mut self.ctx, &mut self.keeper, elapsed_ms as f64);
        self.process_commands(outcome.commands);

        if outcome.request == Some(CutsceneRequest::PostFight) {
            self.start_post_fight();
        }
    }

    fn handle_cabin(&mut self) {
        if self.keeper.record_full_clear(
            &self.encounter.map_id,
            self.ctx.coins,
            self.level_clock_ms as f64,
        ) {
            info!(elapsed_ms = self.level_clock_ms, "全关通关新纪录");
            self.process_commands(vec![Command::PersistRecords]);
        }
    }

    /// 刷怪器视角：每次刷怪尝试前查询生命周期阶段
    fn handle_spawn_attempt(&mut self) {
        if self.ctx.lifecycle.suppresses_spawning() {
            info!(phase = ?self.ctx.lifecycle.phase(), "刷怪被抑制");
        } else {
            info!("刷出一只雪原小怪");
        }
    }

    fn start_pre_fight(&mut self) {
        match self.encounter.pre_fight.build("pre_fight") {
            Ok((script, table)) => {
                self.ctx.pending_cutscenes.pop_front();
                self.runtime = Some(CutsceneRuntime::new(
                    script,
                    table,
                    Some(self.encounter.cues.clone()),
                ));
                info!("战前过场开始");
            }
            Err(error) => warn!(error = %error, "战前过场构建失败"),
        }
    }

    fn start_post_fight(&mut self) {
        match self.encounter.post_fight.build("post_fight") {
            Ok((script, table)) => {
                self.ctx.pending_cutscenes.pop_front();
                self.runtime = Some(CutsceneRuntime::new(
                    script,
                    table,
                    Some(self.encounter.cues.clone()),
                ));
                info!("战后过场开始");
            }
            Err(error) => warn!(error = %error, "战后过场构建失败"),
        }
    }

    fn start_toll(&mut self) {
        if self.runtime.is_some() {
            info!("已有过场进行中");
            return;
        }
        let Some(toll) = self.encounter.toll.clone() else {
            info!("本地图没有收费过场");
            return;
        };

        match toll.build(
            "penguin_toll",
            self.encounter.coins_required,
            self.ctx.coins,
        ) {
            Ok((script, outcome)) => {
                if !outcome.requirement_met {
                    // 终结转换据此路由到结算画面
                    self.ctx.requirement_failed = true;
                }
                self.ctx.can_talk = true;
                self.runtime = Some(CutsceneRuntime::new(script, EffectTable::new(), None));
                info!(requirement_met = outcome.requirement_met, "收费过场开始");
            }
            Err(error) => warn!(error = %error, "收费过场构建失败"),
        }
    }

    fn process_commands(&mut self, commands: Vec<Command>) {
        for command in commands {
            match self.executor.execute(&command) {
                ExecuteResult::Ok => {}

                ExecuteResult::GameOver => {
                    // 演示会话里结算画面只是一条日志，状态保留供检查
                }

                ExecuteResult::PersistRequested => {
                    if let Err(error) = self.store.save(self.keeper.table()) {
                        warn!(error = %error, "最佳记录落盘失败");
                    }
                }

                ExecuteResult::CutsceneEnded => {
                    let drained = self
                        .runtime
                        .as_ref()
                        .map(|runtime| !runtime.has_pending_timers())
                        .unwrap_or(true);
                    if drained {
                        self.runtime = None;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_loader::demo_encounter;

    fn driver() -> Driver {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordsStore::new(dir.path().join("records.json"));
        // 故意泄漏 tempdir，保证落盘路径在整个测试期间有效
        std::mem::forget(dir);
        Driver::new(demo_encounter(), store).unwrap()
    }

    fn feed(driver: &mut Driver, lines: &[&str]) {
        for line in lines {
            assert!(driver.handle_line(line), "会话不应提前结束");
        }
    }

    #[test]
    fn test_scripted_full_encounter() {
        let mut driver = driver();
        feed(&mut driver, &["coins 45", "walk 900"]);
        assert_eq!(
            driver.ctx().lifecycle.phase(),
            EncounterPhase::PreFightDialogue
        );
        assert!(driver.ctx().lifecycle.suppresses_spawning());

        // 推进完战前对话（多余的 advance 被压制，无害）
        feed(&mut driver, &["advance"; 12]);
        feed(&mut driver, &["tick 3000"]);
        assert_eq!(driver.ctx().lifecycle.phase(), EncounterPhase::Engaged);

        // 战斗 45 秒后获胜
        feed(&mut driver, &["tick 45000", "defeat"]);
        assert_eq!(
            driver.ctx().lifecycle.phase(),
            EncounterPhase::PostFightDialogue
        );
        assert_eq!(
            driver.keeper().table().get("glacier").unwrap().boss_ms,
            Some(45_000)
        );

        // 推进完战后对话
        feed(&mut driver, &["advance"; 14]);
        assert_eq!(driver.ctx().lifecycle.phase(), EncounterPhase::Fled);
        assert!(driver.ctx().boss_fled);

        // 通关上报
        feed(&mut driver, &["cabin"]);
        assert!(
            driver
                .keeper()
                .table()
                .get("glacier")
                .unwrap()
                .clear_ms
                .is_some()
        );
    }

    #[test]
    fn test_scripted_toll_failure_routes_to_game_over() {
        let mut driver = driver();
        feed(&mut driver, &["coins 5", "toll"]);
        assert!(driver.ctx().requirement_failed);

        feed(&mut driver, &["advance"; 6]);
        feed(&mut driver, &["tick 20"]);

        // 结算转场后过场对象已回收
        assert!(driver.runtime.is_none());
    }

    #[test]
    fn test_paused_gate_blocks_input() {
        let mut driver = driver();
        feed(&mut driver, &["coins 45", "walk 900", "pause"]);

        let before = driver.runtime.as_ref().unwrap().cursor().char_index;
        feed(&mut driver, &["advance"]);
        let after = driver.runtime.as_ref().unwrap().cursor().char_index;
        assert_eq!(before, after);

        feed(&mut driver, &["resume", "advance"]);
        let resumed = driver.runtime.as_ref().unwrap().cursor().char_index;
        assert!(resumed > after);
    }

    #[test]
    fn test_quit_ends_session() {
        let mut driver = driver();
        assert!(!driver.handle_line("quit"));
    }
}
