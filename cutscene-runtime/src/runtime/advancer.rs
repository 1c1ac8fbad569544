//! # Advancer 模块
//!
//! 揭示推进算法：一次"推进"输入对应一次游标变换。
//!
//! ## 执行顺序
//!
//! 同一次调用内，一次性扣费检查**先于**游标位置变换：
//!
//! 1. 扣费一次性效果（`cash_out_consumed` 闩锁保护）
//! 2. 停在停顿标记上 → 逐字符推进一步
//! 3. 行内 → 跳到下一个停顿标记并停住，无标记则整行揭示
//! 4. 行已揭示且还有后续 → 进入下一行
//! 5. 最后一行已揭示 → 报告终结，由引擎走终结转换
//!
//! ## 完成信号
//!
//! 完成信号是同步的：第 3 步把行揭示完时，结果里直接带上
//! `line_completed`。没有任何"整行已揭示"的周期轮询。

use crate::cursor::DialogueCursor;
use crate::script::Script;

/// 一次推进的结果
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdvanceOutcome {
    /// 本次触发的一次性扣费金额
    pub cash_out: Option<u32>,

    /// 当前行在本次调用中变为完全揭示
    pub line_completed: bool,

    /// 本次进入的新行索引
    pub entered_line: Option<usize>,

    /// 游标已在最后一行且整行揭示——终结转换的触发点
    pub terminal: bool,
}

/// 推进一步
///
/// 唯一允许改写游标位置的入口。输入锁定期间的压制由调用方
/// 的前置检查负责，本函数不做重复检查。
pub fn advance(cursor: &mut DialogueCursor, script: &Script) -> AdvanceOutcome {
    let mut outcome = AdvanceOutcome::default();

    let Some(entry) = script.entry(cursor.line_index) else {
        // 游标越界只可能源于外部篡改；防御性不动作
        return outcome;
    };
    let len = entry.char_len();

    // 1. 一次性扣费：行完全揭示后的下一次推进触发，闩锁防止二次扣费
    if let Some(cash_out) = script.cash_out() {
        if cash_out.line_index == cursor.line_index
            && cursor.line_revealed(entry)
            && !cursor.cash_out_consumed
        {
            cursor.cash_out_consumed = true;
            outcome.cash_out = Some(cash_out.amount);
        }
    }

    if cursor.awaiting_continuation {
        // 2. 停顿解除：逐字符走一步
        cursor.awaiting_continuation = false;
        cursor.char_index = (cursor.char_index + 1).min(len);
        outcome.line_completed = cursor.char_index >= len;
    } else if cursor.char_index < len {
        // 3. 行内推进：跳到下一个停顿标记，无标记则整行揭示
        match next_pause_mark(&entry.text, cursor.char_index) {
            Some(position) => {
                cursor.char_index = position;
                cursor.awaiting_continuation = true;
            }
            None => {
                cursor.char_index = len;
                outcome.line_completed = true;
            }
        }
    } else if cursor.line_index < script.last_index() {
        // 4. 进入下一行
        let next = cursor.line_index + 1;
        if let Some(next_entry) = script.entry(next) {
            cursor.enter_line(next, next_entry);
            outcome.entered_line = Some(next);
            // 零长度行立即满足完成检查
            outcome.line_completed = next_entry.char_len() == 0;
        }
    } else {
        // 5. 终结
        outcome.terminal = true;
    }

    outcome
}

/// 当前位置之后的第一个停顿标记（字面 `.`）
///
/// 只认**严格大于** `after` 的位置，索引按字符计。
fn next_pause_mark(text: &str, after: usize) -> Option<usize> {
    text.chars()
        .enumerate()
        .find(|&(index, ch)| index > after && ch == '.')
        .map(|(index, _)| index)
}
