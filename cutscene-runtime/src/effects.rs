//! # Effects 模块
//!
//! 按（遭遇阶段 × 行索引）查表的副作用派发器。
//!
//! ## 设计说明
//!
//! 逐场景差异压平为一张静态效果表，由同一个派发器消费，
//! 不为每个叙事场景写多态覆盖。表中不存在的索引不产生
//! 任何效果。
//!
//! 派发器只在当前行**完全揭示**的那一刻产生效果；同一行在未推进
//! 时的重复调用被一次性闩锁压制——逐帧重触发同一条音频提示是缺陷。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::command::TrackId;
use crate::cursor::DialogueCursor;
use crate::encounter::EncounterPhase;
use crate::script::ScriptEntry;

/// 单个副作用
///
/// 纯副作用动作：启停音轨、一次性音效，或梦境节拍序列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// 启动环境音
    PlayAmbience(TrackId),

    /// 停止环境音
    StopAmbience(TrackId),

    /// 启动前景音乐
    PlayBgm {
        /// 音轨标识
        track: TrackId,
        /// 是否循环
        looping: bool,
    },

    /// 停止前景音乐
    StopBgm {
        /// 淡出时长（毫秒）
        fade_out_ms: Option<u64>,
    },

    /// 播放一次性音效
    PlaySfx(TrackId),

    /// 梦境节拍
    ///
    /// 分离输入监听 → 播放提示音 → 定时屏幕闪烁 →
    /// 固定延迟后重新挂上监听。分离/重挂由引擎执行，
    /// 这里只携带数据。
    DreamBeat {
        /// 提示音
        cue: TrackId,
        /// 闪烁时长（毫秒）
        flicker_ms: u64,
    },
}

/// 效果表
///
/// 键为（遭遇阶段，行索引），每个遭遇一张，构建后只读。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectTable {
    rows: BTreeMap<(EncounterPhase, usize), Vec<Effect>>,
}

impl EffectTable {
    /// 创建空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一行的效果
    pub fn insert(&mut self, phase: EncounterPhase, line_index: usize, effects: Vec<Effect>) {
        self.rows.insert((phase, line_index), effects);
    }

    /// 链式登记（构建遭遇数据时使用）
    pub fn with(mut self, phase: EncounterPhase, line_index: usize, effects: Vec<Effect>) -> Self {
        self.insert(phase, line_index, effects);
        self
    }

    /// 查询一行的效果
    pub fn get(&self, phase: EncounterPhase, line_index: usize) -> Option<&[Effect]> {
        self.rows.get(&(phase, line_index)).map(Vec::as_slice)
    }
}

/// 副作用派发器
///
/// 每次推进后调用一次；当前行未完全揭示时 no-op。
#[derive(Debug, Clone, PartialEq)]
pub struct SideEffectDispatcher {
    table: EffectTable,
    /// 已触发的（阶段，行）集合——同一行的重复调用被压制
    fired: BTreeSet<(EncounterPhase, usize)>,
}

impl SideEffectDispatcher {
    /// 用效果表创建派发器
    pub fn new(table: EffectTable) -> Self {
        Self {
            table,
            fired: BTreeSet::new(),
        }
    }

    /// 尝试触发当前行的效果
    ///
    /// 返回需要执行的效果列表：
    ///
    /// - 当前行未完全揭示 → 空
    /// - 该（阶段，行）已触发过 → 空（一次性闩锁）
    /// - 表中无此索引 → 空
    pub fn fire(
        &mut self,
        phase: EncounterPhase,
        cursor: &DialogueCursor,
        entry: &ScriptEntry,
    ) -> Vec<Effect> {
        if !cursor.line_revealed(entry) {
            return Vec::new();
        }

        let key = (phase, cursor.line_index);
        if !self.fired.insert(key) {
            return Vec::new();
        }

        self.table
            .get(phase, cursor.line_index)
            .map(<[Effect]>::to_vec)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;

    fn setup(text: &str) -> (Script, DialogueCursor) {
        let script = Script::new("test", vec![ScriptEntry::new("旁白", text)]).unwrap();
        let cursor = DialogueCursor::new(&script);
        (script, cursor)
    }

    fn table() -> EffectTable {
        EffectTable::new().with(
            EncounterPhase::PreFightDialogue,
            0,
            vec![Effect::PlaySfx("rumble".to_string())],
        )
    }

    #[test]
    fn test_noop_while_line_incomplete() {
        let (script, mut cursor) = setup("abc");
        let mut dispatcher = SideEffectDispatcher::new(table());
        let entry = script.entry(0).unwrap();

        cursor.char_index = 1;
        assert!(
            dispatcher
                .fire(EncounterPhase::PreFightDialogue, &cursor, entry)
                .is_empty()
        );
    }

    #[test]
    fn test_fires_once_when_revealed() {
        let (script, mut cursor) = setup("abc");
        let mut dispatcher = SideEffectDispatcher::new(table());
        let entry = script.entry(0).unwrap();

        cursor.char_index = 3;
        let effects = dispatcher.fire(EncounterPhase::PreFightDialogue, &cursor, entry);
        assert_eq!(effects, vec![Effect::PlaySfx("rumble".to_string())]);

        // 同一行、同一揭示状态的重复调用被闩锁压制
        assert!(
            dispatcher
                .fire(EncounterPhase::PreFightDialogue, &cursor, entry)
                .is_empty()
        );
    }

    #[test]
    fn test_absent_index_is_noop() {
        let (script, mut cursor) = setup("abc");
        let mut dispatcher = SideEffectDispatcher::new(table());
        let entry = script.entry(0).unwrap();

        cursor.char_index = 3;
        // 表里只有 PreFightDialogue 的行 0，其他阶段查不到
        assert!(
            dispatcher
                .fire(EncounterPhase::PostFightDialogue, &cursor, entry)
                .is_empty()
        );
    }

    #[test]
    fn test_table_rows_are_phase_scoped() {
        let table = EffectTable::new()
            .with(
                EncounterPhase::PreFightDialogue,
                2,
                vec![Effect::PlayAmbience("wind".to_string())],
            )
            .with(
                EncounterPhase::PostFightDialogue,
                2,
                vec![Effect::StopAmbience("wind".to_string())],
            );

        assert_eq!(
            table.get(EncounterPhase::PreFightDialogue, 2),
            Some(&[Effect::PlayAmbience("wind".to_string())][..])
        );
        assert_eq!(
            table.get(EncounterPhase::PostFightDialogue, 2),
            Some(&[Effect::StopAmbience("wind".to_string())][..])
        );
        assert_eq!(table.get(EncounterPhase::Engaged, 2), None);
    }
}
