//! # Scheduler 模块
//!
//! 显式的定时任务抽象。
//!
//! ## 设计原则
//!
//! - Runtime 从不读取真实时钟；时间由 Host 在每帧 tick 时灌入
//! - 所有延迟动作都通过 `schedule(delay, token) → cancel(id)` 建模，
//!   没有发后不理的定时器；终结转换和梦境节拍因此可以用
//!   虚拟时钟测试，无需真实等待
//! - 到期顺序确定：先按到期时刻、再按登记顺序

use serde::{Deserialize, Serialize};

/// 定时任务载荷
///
/// 到期时由引擎解释执行，每个载荷对应一种延迟动作。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerToken {
    /// 战前终结转换的延迟收尾：结束过场并把遭遇翻入交战阶段
    EngageBoss,

    /// 门槛未达路径的延迟转场：进入结算画面
    ShowGameOver,

    /// 梦境节拍结束后重新挂上输入监听
    ReattachInput,
}

/// 定时任务句柄（用于取消）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PendingTimer {
    id: u64,
    token: TimerToken,
    due_ms: u64,
}

/// 虚拟时钟定时调度器
///
/// Host 每帧调用 [`tick`](Self::tick) 灌入流逝的毫秒数，
/// 调度器返回本帧到期的载荷。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerScheduler {
    now_ms: u64,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl TimerScheduler {
    /// 创建空调度器
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个一次性定时任务
    pub fn schedule(&mut self, delay_ms: u64, token: TimerToken) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(PendingTimer {
            id,
            token,
            due_ms: self.now_ms.saturating_add(delay_ms),
        });
        TimerId(id)
    }

    /// 取消定时任务
    ///
    /// 返回是否确实取消了一个尚未到期的任务。
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != id.0);
        self.pending.len() != before
    }

    /// 推进虚拟时钟，返回到期的载荷
    ///
    /// 同一帧到期的多个任务按（到期时刻，登记顺序）排序。
    pub fn tick(&mut self, dt_ms: u64) -> Vec<TimerToken> {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        let now = self.now_ms;

        let mut due: Vec<PendingTimer> = Vec::new();
        self.pending.retain(|timer| {
            if timer.due_ms <= now {
                due.push(timer.clone());
                false
            } else {
                true
            }
        });

        due.sort_by_key(|timer| (timer.due_ms, timer.id));
        due.into_iter().map(|timer| timer.token).collect()
    }

    /// 当前虚拟时刻（毫秒）
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// 是否还有未到期的任务
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
