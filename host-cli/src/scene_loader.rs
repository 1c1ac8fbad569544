//! # SceneLoader 模块
//!
//! 授权遭遇数据的加载与转换。
//!
//! ## 设计说明
//!
//! 剧本内容（角色名、台词文本、立绘摆位）是静态配置数据，不是逻辑；
//! 这里把 JSON 文件反序列化成核心类型，并提供一份内置的演示遭遇
//! 作为找不到数据文件时的回退。

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use cutscene_runtime::{
    Directive, Effect, EffectTable, EncounterPhase, PortraitSlot, Script, ScriptEntry,
    TerminalCues, TollOutcome,
};

/// 效果表的一行（JSON 表示）
#[derive(Debug, Clone, Deserialize)]
pub struct EffectRow {
    /// 生效的遭遇阶段
    pub phase: EncounterPhase,
    /// 行索引
    pub line_index: usize,
    /// 触发的效果列表
    pub effects: Vec<Effect>,
}

/// 一段过场的授权数据
#[derive(Debug, Clone, Deserialize)]
pub struct SceneData {
    /// 台词列表
    pub entries: Vec<ScriptEntry>,
    /// 效果表行
    #[serde(default)]
    pub effects: Vec<EffectRow>,
}

impl SceneData {
    /// 转换为剧本与效果表
    pub fn build(&self, id: &str) -> anyhow::Result<(Script, EffectTable)> {
        let script = Script::new(id, self.entries.clone())
            .with_context(|| format!("过场 '{id}' 的剧本非法"))?;
        let mut table = EffectTable::new();
        for row in &self.effects {
            table.insert(row.phase, row.line_index, row.effects.clone());
        }
        Ok((script, table))
    }
}

/// 收费过场的授权数据
#[derive(Debug, Clone, Deserialize)]
pub struct TollData {
    /// 报价前奏
    pub prefix: Vec<ScriptEntry>,
    /// "成交"台词
    pub accepted: ScriptEntry,
    /// "金币不足"子序列
    pub refusal: Vec<ScriptEntry>,
    /// 成交后的剩余剧情
    pub remainder: Vec<ScriptEntry>,
}

impl TollData {
    /// 按玩家当前金币构建收费剧本（构建时一次性分支）
    pub fn build(
        &self,
        id: &str,
        coins_required: u32,
        coins: u32,
    ) -> anyhow::Result<(Script, TollOutcome)> {
        Script::toll(
            id,
            self.prefix.clone(),
            self.accepted.clone(),
            self.refusal.clone(),
            self.remainder.clone(),
            coins_required,
            coins,
        )
        .with_context(|| format!("收费过场 '{id}' 的剧本非法"))
    }
}

/// 一张地图的完整遭遇数据
#[derive(Debug, Clone, Deserialize)]
pub struct EncounterData {
    /// 地图标识
    pub map_id: String,
    /// 触发点横向位置
    pub gate_x: f32,
    /// 额外要求的剧情标志
    #[serde(default)]
    pub required_flags: Vec<String>,
    /// 金币门槛（记录资格与收费过场共用）
    pub coins_required: u32,
    /// 终结音频配置
    pub cues: TerminalCues,
    /// 战前过场
    pub pre_fight: SceneData,
    /// 战后过场
    pub post_fight: SceneData,
    /// 收费过场（可选）
    #[serde(default)]
    pub toll: Option<TollData>,
}

/// 从 JSON 文件加载遭遇数据
pub fn load_encounter(path: impl AsRef<Path>) -> anyhow::Result<EncounterData> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取遭遇数据文件: {}", path.display()))?;
    let data: EncounterData = serde_json::from_str(&content)
        .with_context(|| format!("遭遇数据解析失败: {}", path.display()))?;
    info!(
        map_id = %data.map_id,
        pre_lines = data.pre_fight.entries.len(),
        post_lines = data.post_fight.entries.len(),
        "遭遇数据加载完成"
    );
    Ok(data)
}

/// 内置演示遭遇：冰川地图的海象王
pub fn demo_encounter() -> EncounterData {
    let line = |speaker: &str, text: &str| ScriptEntry::new(speaker, text);

    EncounterData {
        map_id: "glacier".to_string(),
        gate_x: 800.0,
        required_flags: Vec::new(),
        coins_required: 30,
        cues: TerminalCues {
            battle_cue: "battle_start".to_string(),
            engage_bgm: "boss_theme".to_string(),
            sets_boss_fled: true,
        },
        pre_fight: SceneData {
            entries: vec![
                line("海象王", "你竟然穿过了风雪走到这里...").with_directives(vec![
                    Directive::Portrait {
                        path: "portraits/walrus_king.png".to_string(),
                        slot: PortraitSlot::Right,
                    },
                ]),
                line("主角", "把村子的灯芯还回来。"),
                line("海象王", "那就用实力说话吧！"),
            ],
            effects: vec![EffectRow {
                phase: EncounterPhase::PreFightDialogue,
                line_index: 0,
                effects: vec![Effect::PlayAmbience("blizzard".to_string())],
            }],
        },
        post_fight: SceneData {
            entries: vec![
                line("海象王", "记住这一天......").with_directives(vec![Directive::Whisper]),
                line("主角", "灯芯回来了，回家吧。"),
            ],
            effects: vec![EffectRow {
                phase: EncounterPhase::PostFightDialogue,
                line_index: 0,
                effects: vec![Effect::StopAmbience("blizzard".to_string())],
            }],
        },
        toll: Some(TollData {
            prefix: vec![line("企鹅", "过桥费 30 枚金币，一口价。")],
            accepted: line("企鹅", "成交，过去吧。"),
            refusal: vec![line("企鹅", "钱不够，回去吧。")],
            remainder: vec![line("企鹅", "前面风雪很大，当心。")],
        }),
    }
}
