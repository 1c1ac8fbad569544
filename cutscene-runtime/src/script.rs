//! # Script 模块
//!
//! 叙事剧本的数据模型。
//!
//! ## 设计说明
//!
//! - 剧本一经构建即不可变，播放顺序就是插入顺序
//! - 展示指令（立绘、耳语）对状态机完全不透明，原样透传给渲染层
//! - 不为每个"场景 × 地图"组合单写一个类型；全部场景共用
//!   参数化的 [`Script`]，逐场景差异下沉为数据
//! - 投币门槛分支（§ 收费过场）在**构建时**一次性决定，
//!   播放过程中不再回访

use serde::{Deserialize, Serialize};

use crate::error::ScriptError;

/// 立绘停靠位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortraitSlot {
    /// 左侧
    Left,
    /// 右侧
    Right,
}

/// 展示指令
///
/// 状态机对指令不做任何解释，只随台词透传给渲染层。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    /// 显示立绘
    Portrait {
        /// 立绘图片路径
        path: String,
        /// 停靠位
        slot: PortraitSlot,
    },

    /// 耳语样式（渲染层以小号/斜体呈现）
    Whisper,
}

/// 一条台词
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    /// 说话者名称
    pub speaker: String,
    /// 台词文本
    pub text: String,
    /// 展示指令列表
    #[serde(default)]
    pub directives: Vec<Directive>,
}

impl ScriptEntry {
    /// 创建无指令的台词
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            directives: Vec::new(),
        }
    }

    /// 附加展示指令
    pub fn with_directives(mut self, directives: Vec<Directive>) -> Self {
        self.directives = directives;
        self
    }

    /// 台词的字符数（按字符计，不是字节）
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// 一次性扣费标记
///
/// 收费过场中，某一行台词附带一次性的金币扣除。
/// 扣除由 [`DialogueCursor::cash_out_consumed`] 闩锁保护，
/// 同一行重复推进不会二次扣费。
///
/// [`DialogueCursor::cash_out_consumed`]: crate::cursor::DialogueCursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashOut {
    /// 附带扣费的行索引
    pub line_index: usize,
    /// 扣除的金币数
    pub amount: u32,
}

/// 收费分支的构建结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TollOutcome {
    /// 金币门槛是否满足
    ///
    /// 不满足时调用方应设置持久的"门槛未达"标志，
    /// 终结转换据此路由到结算画面。
    pub requirement_met: bool,
}

/// 叙事剧本
///
/// 有序的台词序列，长度 ≥ 1 是构建不变量——零行过场非法。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// 剧本标识符
    pub id: String,
    /// 台词列表（播放顺序）
    entries: Vec<ScriptEntry>,
    /// 一次性扣费标记（仅收费过场有）
    cash_out: Option<CashOut>,
}

impl Script {
    /// 创建新剧本
    ///
    /// # 错误
    ///
    /// 台词列表为空时返回 [`ScriptError::Empty`]。
    pub fn new(id: impl Into<String>, entries: Vec<ScriptEntry>) -> Result<Self, ScriptError> {
        if entries.is_empty() {
            return Err(ScriptError::Empty);
        }
        Ok(Self {
            id: id.into(),
            entries,
            cash_out: None,
        })
    }

    /// 附加一次性扣费标记
    ///
    /// # 错误
    ///
    /// 行索引越界时返回 [`ScriptError::CashOutOutOfRange`]。
    pub fn with_cash_out(mut self, cash_out: CashOut) -> Result<Self, ScriptError> {
        if cash_out.line_index >= self.entries.len() {
            return Err(ScriptError::CashOutOutOfRange {
                index: cash_out.line_index,
                len: self.entries.len(),
            });
        }
        self.cash_out = Some(cash_out);
        Ok(self)
    }

    /// 构建投币门槛过场（收费分支）
    ///
    /// 分支在构建时一次性决定，之后不再回访：
    ///
    /// - 门槛满足：`前奏 + 成交行 + 后续`，成交行附带一次性扣费
    /// - 门槛不满足：`前奏 + 拒绝子序列`，**后续整体省略**
    ///   （失败分支的剧本更短，而不是运行时逐次分支）
    ///
    /// # 参数
    ///
    /// - `prefix`: 报价前奏台词
    /// - `accepted`: "成交"台词（满足门槛时拼入）
    /// - `refusal`: "金币不足"子序列（不满足门槛时拼入）
    /// - `remainder`: 成交后的剩余剧情
    /// - `coins_required`: 金币门槛
    /// - `coins`: 玩家当前金币数
    pub fn toll(
        id: impl Into<String>,
        prefix: Vec<ScriptEntry>,
        accepted: ScriptEntry,
        refusal: Vec<ScriptEntry>,
        remainder: Vec<ScriptEntry>,
        coins_required: u32,
        coins: u32,
    ) -> Result<(Self, TollOutcome), ScriptError> {
        let requirement_met = coins >= coins_required;

        let script = if requirement_met {
            let accepted_index = prefix.len();
            let mut entries = prefix;
            entries.push(accepted);
            entries.extend(remainder);
            Self::new(id, entries)?.with_cash_out(CashOut {
                line_index: accepted_index,
                amount: coins_required,
            })?
        } else {
            let mut entries = prefix;
            entries.extend(refusal);
            Self::new(id, entries)?
        };

        Ok((script, TollOutcome { requirement_met }))
    }

    /// 获取指定索引的台词
    pub fn entry(&self, index: usize) -> Option<&ScriptEntry> {
        self.entries.get(index)
    }

    /// 台词数量（恒 ≥ 1）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 最后一行的索引
    pub fn last_index(&self) -> usize {
        self.entries.len() - 1
    }

    /// 一次性扣费标记
    pub fn cash_out(&self) -> Option<&CashOut> {
        self.cash_out.as_ref()
    }

    /// 全部台词的字符总数（推进调用次数上界的基数）
    pub fn total_char_count(&self) -> usize {
        self.entries.iter().map(ScriptEntry::char_len).sum()
    }
}
