//! # Script 模块
//!
//! JSON 对话脚本：每条对话由说话者、若干文本行和可选语音组成。
//!
//! ## 说话者名字的所有权
//!
//! - `speaker_borrowed = false`：每次推进都新建一个名字文本，所有权交给回看缓冲
//! - `speaker_borrowed = true`：名字来自脚本持有的角色名表，回看只借用，
//!   由脚本在 [`DialogueScript::release`] 中统一释放

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;
use vn_ui::{Engine, SpeakerName, TextBackend, TextHandle};

use crate::backend::HeadlessBackend;

/// 一条对话
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DialogueEntry {
    pub speaker: Option<String>,
    pub speaker_borrowed: bool,
    /// 空字符串表示空行，不创建文本
    pub lines: Vec<String>,
    pub voice: String,
}

/// 按顺序推进的对话脚本
#[derive(Debug)]
pub struct DialogueScript {
    entries: Vec<DialogueEntry>,
    cursor: usize,
    /// 脚本持有的角色名文本，供借用
    character_names: HashMap<String, TextHandle>,
}

impl DialogueScript {
    pub fn new(entries: Vec<DialogueEntry>) -> Self {
        Self {
            entries,
            cursor: 0,
            character_names: HashMap::new(),
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let entries: Vec<DialogueEntry> = serde_json::from_str(json).context("对话脚本解析失败")?;
        Ok(Self::new(entries))
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("对话脚本读取失败: {}", path.display()))?;
        Self::from_json(&content).with_context(|| path.display().to_string())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// 尚未推进的对话数
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// 推进一条对话：暂存名字与语音，再提交文本行
    ///
    /// 返回写入的槽位；脚本已结束时返回 `None`。
    pub fn advance(&mut self, engine: &mut Engine<HeadlessBackend>) -> Option<usize> {
        let entry = self.entries.get(self.cursor)?;
        self.cursor += 1;

        let backend = &mut engine.backend;
        let name = entry.speaker.as_deref().map(|speaker| {
            if entry.speaker_borrowed {
                let handle = self
                    .character_names
                    .entry(speaker.to_string())
                    .or_insert_with(|| backend.create_text(speaker));
                SpeakerName::Borrowed(handle.as_text_ref())
            } else {
                SpeakerName::Owned(backend.create_text(speaker))
            }
        });

        let backlog = &mut engine.state.backlog;
        backlog.stage_name(name, backend);
        backlog.stage_voice(&entry.voice);

        let lines = entry
            .lines
            .iter()
            .map(|line| (!line.is_empty()).then(|| backend.create_text(line)))
            .collect();
        let slot = backlog.commit(lines, backend);

        debug!(entry = self.cursor - 1, slot = slot, "推进对话");
        Some(slot)
    }

    /// 释放脚本持有的角色名文本
    pub fn release<T: TextBackend>(&mut self, text: &mut T) {
        for (_, handle) in self.character_names.drain() {
            text.free_text(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vn_ui::UiConfig;

    fn engine() -> Engine<HeadlessBackend> {
        let mut config = UiConfig::default();
        config.backlog.capacity = 4;
        Engine::new(config, HeadlessBackend::new("voice"))
    }

    const SCRIPT: &str = r#"[
        { "speaker": "旁白", "lines": ["第一句", "", "第三句"], "voice": "v001.ogg" },
        { "speaker": "红叶", "speaker_borrowed": true, "lines": ["你好"] },
        { "speaker": "红叶", "speaker_borrowed": true, "lines": ["再见"] },
        { "lines": ["没有说话者"] }
    ]"#;

    #[test]
    fn test_advance_commits_entries() {
        let mut engine = engine();
        let mut script = DialogueScript::from_json(SCRIPT).unwrap();
        assert_eq!(script.entry_count(), 4);

        assert_eq!(script.advance(&mut engine), Some(0));
        let record = engine.state.backlog.record(0).unwrap();
        assert!(record.name().is_some_and(|n| n.is_owned()));
        assert_eq!(record.voice(), "v001.ogg");
        assert_eq!(record.line_slots().len(), 3);
        assert_eq!(record.lines().count(), 2);

        while script.advance(&mut engine).is_some() {}
        assert_eq!(script.remaining(), 0);
        assert_eq!(engine.state.backlog.len(), 4);
        assert!(engine.state.backlog.record(3).unwrap().name().is_none());
    }

    #[test]
    fn test_borrowed_names_are_shared() {
        let mut engine = engine();
        let mut script = DialogueScript::from_json(SCRIPT).unwrap();
        for _ in 0..3 {
            script.advance(&mut engine);
        }

        let first = engine.state.backlog.record(1).unwrap().name().unwrap();
        let second = engine.state.backlog.record(2).unwrap().name().unwrap();
        assert!(!first.is_owned());
        assert_eq!(first.text(), second.text());
        let content = engine.backend.text_content(first.text().id());
        assert_eq!(content, Some("红叶"));
    }

    #[test]
    fn test_release_leaves_no_live_text() {
        let mut engine = engine();
        let mut script = DialogueScript::from_json(SCRIPT).unwrap();
        while script.advance(&mut engine).is_some() {}

        engine.shutdown();
        // 借用的角色名仍由脚本持有
        assert_eq!(engine.backend.live_texts(), 1);

        script.release(&mut engine.backend);
        assert_eq!(engine.backend.live_texts(), 0);
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dialogue.json");
        std::fs::write(&path, "[{ \"lines\": 3 }]").unwrap();

        let err = DialogueScript::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("dialogue.json"));
    }
}
