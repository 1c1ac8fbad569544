//! # Cursor 模块
//!
//! 单个过场实例的对话游标。
//!
//! ## 设计原则
//!
//! - 游标在过场激活时创建、过场结束时丢弃，不跨会话持久化
//! - 只有推进算法（[`advancer`]）可以改写游标位置
//! - `char_index` 按**字符**计数，不是字节——台词可能含多字节文本
//!
//! [`advancer`]: crate::runtime::advancer

use serde::{Deserialize, Serialize};

use crate::script::{Script, ScriptEntry};

/// 对话游标
///
/// 记录当前激活的是哪一行、这一行揭示了多少。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueCursor {
    /// 当前行索引，∈ `[0, script.len() - 1]`
    pub line_index: usize,

    /// 当前行已揭示的字符数，∈ `[0, 当前行字符数]`
    ///
    /// 等于当前行字符数时表示整行已完全揭示。
    pub char_index: usize,

    /// 是否停在停顿标记上，等待一次逐字符推进
    pub awaiting_continuation: bool,

    /// 输入锁
    ///
    /// 梦境节拍与终结序列会分离输入；锁定期间外部的推进调用
    /// 必须是 no-op（由调用方的前置检查压制，而不是抛错）。
    pub input_locked: bool,

    /// 一次性扣费是否已触发（仅收费过场使用）
    pub cash_out_consumed: bool,

    /// 当前行的分词缓存
    ///
    /// 渲染层做分段着色揭示时使用，换行时重算。
    words: Vec<String>,
}

impl DialogueCursor {
    /// 在剧本开头创建游标
    pub fn new(script: &Script) -> Self {
        let words = script
            .entry(0)
            .map(|entry| split_words(&entry.text))
            .unwrap_or_default();
        Self {
            line_index: 0,
            char_index: 0,
            awaiting_continuation: false,
            input_locked: false,
            cash_out_consumed: false,
            words,
        }
    }

    /// 进入指定行的开头
    ///
    /// 重置行内状态并重算分词缓存。
    pub fn enter_line(&mut self, index: usize, entry: &ScriptEntry) {
        self.line_index = index;
        self.char_index = 0;
        self.awaiting_continuation = false;
        self.cash_out_consumed = false;
        self.words = split_words(&entry.text);
    }

    /// 跳到指定行的末尾（整行已揭示）
    ///
    /// 战前跳过路径使用：先把游标挪到最后一行，再走终结序列。
    pub fn jump_to_line_end(&mut self, index: usize, entry: &ScriptEntry) {
        self.enter_line(index, entry);
        self.char_index = entry.char_len();
    }

    /// 当前行是否已完全揭示
    pub fn line_revealed(&self, entry: &ScriptEntry) -> bool {
        self.char_index >= entry.char_len()
    }

    /// 当前行已揭示的文本片段
    ///
    /// 按字符边界切片，多字节文本安全。
    pub fn revealed_text<'a>(&self, entry: &'a ScriptEntry) -> &'a str {
        entry
            .text
            .char_indices()
            .nth(self.char_index)
            .map(|(byte_index, _)| &entry.text[..byte_index])
            .unwrap_or(&entry.text)
    }

    /// 当前行的分词缓存
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(lines: &[&str]) -> Script {
        Script::new(
            "test",
            lines
                .iter()
                .map(|text| ScriptEntry::new("旁白", *text))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_cursor_starts_at_origin() {
        let script = script(&["one two", "three"]);
        let cursor = DialogueCursor::new(&script);

        assert_eq!(cursor.line_index, 0);
        assert_eq!(cursor.char_index, 0);
        assert!(!cursor.awaiting_continuation);
        assert!(!cursor.input_locked);
        assert!(!cursor.cash_out_consumed);
        assert_eq!(cursor.words(), ["one", "two"]);
    }

    #[test]
    fn test_enter_line_recomputes_words() {
        let script = script(&["one two", "three four five"]);
        let mut cursor = DialogueCursor::new(&script);
        cursor.char_index = 7;
        cursor.cash_out_consumed = true;

        cursor.enter_line(1, script.entry(1).unwrap());

        assert_eq!(cursor.line_index, 1);
        assert_eq!(cursor.char_index, 0);
        assert!(!cursor.cash_out_consumed);
        assert_eq!(cursor.words(), ["three", "four", "five"]);
    }

    #[test]
    fn test_revealed_text_respects_char_boundaries() {
        let script = script(&["雪山小屋"]);
        let mut cursor = DialogueCursor::new(&script);
        let entry = script.entry(0).unwrap();

        assert_eq!(cursor.revealed_text(entry), "");

        cursor.char_index = 2;
        assert_eq!(cursor.revealed_text(entry), "雪山");

        cursor.char_index = 4;
        assert_eq!(cursor.revealed_text(entry), "雪山小屋");
        assert!(cursor.line_revealed(entry));
    }

    #[test]
    fn test_zero_length_line_is_immediately_revealed() {
        let script = script(&[""]);
        let cursor = DialogueCursor::new(&script);
        assert!(cursor.line_revealed(script.entry(0).unwrap()));
    }

    #[test]
    fn test_jump_to_line_end() {
        let script = script(&["one", "final line"]);
        let mut cursor = DialogueCursor::new(&script);

        cursor.jump_to_line_end(1, script.entry(1).unwrap());

        assert_eq!(cursor.line_index, 1);
        assert!(cursor.line_revealed(script.entry(1).unwrap()));
    }
}
