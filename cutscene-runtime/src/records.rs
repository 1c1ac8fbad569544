//! # Records 模块
//!
//! 最佳用时记录：头目击破用时与全关通关用时。
//!
//! ## 设计原则
//!
//! - 记录单调不增：已有值只会被**严格更小**的非负值覆盖
//! - 所有写入都经过比较交换操作，从不直接赋值
//! - 未知地图、金币门槛未达：静默 no-op，不写入、不请求落盘
//! - 同一场战斗内的重复上报由每场闩锁压制

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::encounter::MapId;

/// 单张地图的记录项
///
/// `None` 表示从未记录。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// 全关通关用时（毫秒）
    pub clear_ms: Option<u64>,
    /// 头目击破用时（毫秒）
    pub boss_ms: Option<u64>,
}

/// 记录表（按地图），可序列化供 Host 落盘
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTable {
    entries: BTreeMap<MapId, RecordEntry>,
}

impl RecordTable {
    /// 查询某张地图的记录
    pub fn get(&self, map_id: &str) -> Option<&RecordEntry> {
        self.entries.get(map_id)
    }

    /// 是否没有任何记录
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 记录保管器
///
/// 持有每张已知地图的金币门槛，执行带资格前置的比较交换写入。
/// 落盘本身由 Host 完成：操作返回是否发生写入，发生写入时调用方
/// 发出 [`Command::PersistRecords`]。
///
/// [`Command::PersistRecords`]: crate::command::Command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordKeeper {
    /// 已知地图 → 金币门槛
    requirements: BTreeMap<MapId, u32>,
    table: RecordTable,
    /// "本场战斗已上报"闩锁
    boss_guard: BTreeSet<MapId>,
    /// 全关通关的会话级单次闩锁
    full_clear_latch: BTreeSet<MapId>,
}

impl RecordKeeper {
    /// 用已知地图的门槛表创建保管器
    pub fn new(requirements: BTreeMap<MapId, u32>) -> Self {
        Self {
            requirements,
            table: RecordTable::default(),
            boss_guard: BTreeSet::new(),
            full_clear_latch: BTreeSet::new(),
        }
    }

    /// 从已持久化的记录表恢复
    pub fn with_table(requirements: BTreeMap<MapId, u32>, table: RecordTable) -> Self {
        Self {
            requirements,
            table,
            boss_guard: BTreeSet::new(),
            full_clear_latch: BTreeSet::new(),
        }
    }

    /// 当前记录表（供 Host 落盘）
    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    /// 新一场战斗开始，重新武装每场闩锁
    ///
    /// "一场战斗"是生命周期概念：遭遇翻入交战阶段时由外层调用。
    pub fn arm_boss_guard(&mut self, map_id: &str) {
        self.boss_guard.remove(map_id);
    }

    /// 上报头目击破用时
    ///
    /// 资格前置：地图已知、金币门槛满足、本场闩锁未置位。
    /// 负数钳到 0、向下取整；仅当新值严格更小（或此前无记录）时写入。
    /// 闩锁在资格满足时**无条件**置位——同场重复调用不会二次计数。
    ///
    /// 返回是否发生写入（调用方据此决定是否落盘）。
    pub fn record_boss_clear(&mut self, map_id: &str, coins: u32, elapsed_ms: f64) -> bool {
        let Some(&required) = self.requirements.get(map_id) else {
            return false;
        };
        if coins < required {
            return false;
        }
        if !self.boss_guard.insert(map_id.to_string()) {
            return false;
        }

        let elapsed = clamp_elapsed(elapsed_ms);
        let entry = self.table.entries.entry(map_id.to_string()).or_default();
        match entry.boss_ms {
            Some(best) if elapsed >= best => false,
            _ => {
                entry.boss_ms = Some(elapsed);
                true
            }
        }
    }

    /// 上报全关通关用时
    ///
    /// 与 [`record_boss_clear`](Self::record_boss_clear) 同形，
    /// 闩锁为会话级单次：同一会话内每张地图只接受一次上报。
    /// 触发时机（"小屋完全可见"条件首次成立）由 Host 侧判定。
    pub fn record_full_clear(&mut self, map_id: &str, coins: u32, elapsed_ms: f64) -> bool {
        let Some(&required) = self.requirements.get(map_id) else {
            return false;
        };
        if coins < required {
            return false;
        }
        if !self.full_clear_latch.insert(map_id.to_string()) {
            return false;
        }

        let elapsed = clamp_elapsed(elapsed_ms);
        let entry = self.table.entries.entry(map_id.to_string()).or_default();
        match entry.clear_ms {
            Some(best) if elapsed >= best => false,
            _ => {
                entry.clear_ms = Some(elapsed);
                true
            }
        }
    }
}

/// 钳到非负并向下取整
fn clamp_elapsed(elapsed_ms: f64) -> u64 {
    elapsed_ms.max(0.0).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keeper() -> RecordKeeper {
        let mut requirements = BTreeMap::new();
        requirements.insert("glacier".to_string(), 30);
        RecordKeeper::new(requirements)
    }

    #[test]
    fn test_first_record_writes() {
        let mut keeper = keeper();
        assert!(keeper.record_boss_clear("glacier", 50, 100.0));
        assert_eq!(keeper.table().get("glacier").unwrap().boss_ms, Some(100));
    }

    #[test]
    fn test_double_invocation_same_fight_is_idempotent() {
        let mut keeper = keeper();
        // 第一次：existing = None，写入并（由调用方）落盘
        assert!(keeper.record_boss_clear("glacier", 50, 100.0));
        // 同场第二次：闩锁已置位，不写入、不落盘
        assert!(!keeper.record_boss_clear("glacier", 50, 50.0));
        assert_eq!(keeper.table().get("glacier").unwrap().boss_ms, Some(100));
    }

    #[test]
    fn test_rearmed_fight_accepts_strictly_better_time() {
        let mut keeper = keeper();
        assert!(keeper.record_boss_clear("glacier", 50, 100.0));

        keeper.arm_boss_guard("glacier");
        assert!(keeper.record_boss_clear("glacier", 50, 80.0));
        assert_eq!(keeper.table().get("glacier").unwrap().boss_ms, Some(80));
    }

    #[test]
    fn test_never_increases_stored_value() {
        let mut keeper = keeper();
        assert!(keeper.record_boss_clear("glacier", 50, 500.0));

        keeper.arm_boss_guard("glacier");
        // 更差的成绩：不写入、不落盘
        assert!(!keeper.record_boss_clear("glacier", 50, 999.0));
        assert_eq!(keeper.table().get("glacier").unwrap().boss_ms, Some(500));

        keeper.arm_boss_guard("glacier");
        // 相等也不写入（必须严格更小）
        assert!(!keeper.record_boss_clear("glacier", 50, 500.0));
        assert_eq!(keeper.table().get("glacier").unwrap().boss_ms, Some(500));
    }

    #[test]
    fn test_negative_elapsed_clamps_to_zero() {
        let mut keeper = keeper();
        assert!(keeper.record_boss_clear("glacier", 50, -50.0));
        assert_eq!(keeper.table().get("glacier").unwrap().boss_ms, Some(0));
    }

    #[test]
    fn test_fractional_elapsed_floors() {
        let mut keeper = keeper();
        assert!(keeper.record_boss_clear("glacier", 50, 123.9));
        assert_eq!(keeper.table().get("glacier").unwrap().boss_ms, Some(123));
    }

    #[test]
    fn test_unknown_map_is_silent_noop() {
        let mut keeper = keeper();
        assert!(!keeper.record_boss_clear("volcano", 50, 100.0));
        assert!(!keeper.record_full_clear("volcano", 50, 100.0));
        assert!(keeper.table().is_empty());
    }

    #[test]
    fn test_unmet_requirement_is_silent_noop() {
        let mut keeper = keeper();
        assert!(!keeper.record_boss_clear("glacier", 10, 100.0));
        assert!(keeper.table().is_empty());
        // 闩锁未被消耗：凑够金币后同场仍可上报
        assert!(keeper.record_boss_clear("glacier", 30, 100.0));
    }

    #[test]
    fn test_full_clear_session_latch() {
        let mut keeper = keeper();
        assert!(keeper.record_full_clear("glacier", 50, 9000.0));
        // 会话级单次：同一会话内不再接受
        assert!(!keeper.record_full_clear("glacier", 50, 1000.0));
        assert_eq!(keeper.table().get("glacier").unwrap().clear_ms, Some(9000));
    }

    #[test]
    fn test_boss_and_clear_records_are_independent() {
        let mut keeper = keeper();
        assert!(keeper.record_boss_clear("glacier", 50, 100.0));
        assert!(keeper.record_full_clear("glacier", 50, 9000.0));

        let entry = keeper.table().get("glacier").unwrap();
        assert_eq!(entry.boss_ms, Some(100));
        assert_eq!(entry.clear_ms, Some(9000));
    }

    #[test]
    fn test_restore_from_persisted_table() {
        let mut keeper = keeper();
        assert!(keeper.record_boss_clear("glacier", 50, 100.0));
        let table = keeper.table().clone();

        let mut requirements = BTreeMap::new();
        requirements.insert("glacier".to_string(), 30);
        let mut restored = RecordKeeper::with_table(requirements, table);

        // 恢复后旧记录生效：更差成绩不覆盖
        assert!(!restored.record_boss_clear("glacier", 50, 200.0));
        assert_eq!(restored.table().get("glacier").unwrap().boss_ms, Some(100));
    }
}
