//! # Trace 模块
//!
//! 输入轨迹：每帧一份输入快照，外加在没有活动界面时交给宿主默认逻辑的动作。

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use vn_ui::InputSnapshot;

/// 宿主默认逻辑的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameAction {
    /// 推进到下一条对话
    Advance,
    /// 打开对话回看
    OpenBacklog,
}

/// 一帧输入
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TraceFrame {
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default)]
    pub input: InputSnapshot,
    #[serde(default)]
    pub action: Option<FrameAction>,
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

pub fn parse_trace(json: &str) -> anyhow::Result<Vec<TraceFrame>> {
    serde_json::from_str(json).context("输入轨迹解析失败")
}

pub fn load_trace(path: impl AsRef<Path>) -> anyhow::Result<Vec<TraceFrame>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("输入轨迹读取失败: {}", path.display()))?;
    parse_trace(&content).with_context(|| path.display().to_string())
}
