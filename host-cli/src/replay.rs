//! # Replay 模块
//!
//! 按输入轨迹逐帧驱动引擎。
//!
//! ## 帧流程
//!
//! ```text
//! begin_frame(input)
//!   ├─ 有活动界面 → Engine::update（语音错误记录后继续，出错前的改动照常重绘）
//!   └─ 否则       → 宿主默认逻辑（advance / open_backlog）
//! 需要重绘 → Engine::draw → 统计 / 输出绘制调用
//! ```

use std::fmt;
use std::io::Write;

use anyhow::Context;
use tracing::{debug, info, warn};
use vn_ui::{DrawCall, Engine, UiError};

use crate::backend::HeadlessBackend;
use crate::script::DialogueScript;
use crate::trace::{FrameAction, TraceFrame};

/// 回放统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub redraws: usize,
    /// 推进过的对话数
    pub committed: usize,
    /// 结束时回看缓冲中的记录数
    pub retained: usize,
    pub voices_played: usize,
    pub voice_errors: usize,
    pub draw_calls: usize,
    /// 结束后仍未释放的文本句柄
    pub leaked_texts: usize,
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "帧数:       {}", self.frames)?;
        writeln!(f, "重绘:       {}", self.redraws)?;
        writeln!(f, "推进对话:   {}", self.committed)?;
        writeln!(f, "回看记录:   {}", self.retained)?;
        writeln!(f, "语音播放:   {}", self.voices_played)?;
        writeln!(f, "语音错误:   {}", self.voice_errors)?;
        writeln!(f, "绘制调用:   {}", self.draw_calls)?;
        write!(f, "未释放文本: {}", self.leaked_texts)
    }
}

/// 回放器
pub struct Replay<W> {
    engine: Engine<HeadlessBackend>,
    script: DialogueScript,
    /// 为 `Some` 时每个绘制调用输出一行 JSON
    dump: Option<W>,
    summary: ReplaySummary,
}

impl<W: Write> Replay<W> {
    pub fn new(engine: Engine<HeadlessBackend>, script: DialogueScript, dump: Option<W>) -> Self {
        Self {
            engine,
            script,
            dump,
            summary: ReplaySummary::default(),
        }
    }

    /// 回放全部帧，结束时关闭引擎并释放所有文本
    pub fn run(mut self, frames: &[TraceFrame]) -> anyhow::Result<ReplaySummary> {
        for (index, frame) in frames.iter().enumerate() {
            self.step(index, frame)?;
        }

        self.summary.retained = self.engine.state.backlog.len();
        self.summary.voices_played = self.engine.backend.played().len();

        self.engine.shutdown();
        self.script.release(&mut self.engine.backend);
        self.summary.leaked_texts = self.engine.backend.live_texts();
        if self.summary.leaked_texts > 0 {
            warn!(count = self.summary.leaked_texts, "存在未释放的文本句柄");
        }

        info!(
            frames = self.summary.frames,
            redraws = self.summary.redraws,
            remaining = self.script.remaining(),
            "回放结束"
        );
        Ok(self.summary)
    }

    fn step(&mut self, index: usize, frame: &TraceFrame) -> anyhow::Result<()> {
        self.summary.frames += 1;
        self.engine.begin_frame(frame.input);

        let redraw = if self.engine.screen_enabled() {
            if frame.action.is_some() {
                debug!(frame = index, "界面激活中，忽略宿主动作");
            }
            match self.engine.update(frame.dt) {
                Ok(redraw) => redraw,
                Err(UiError::Audio(e)) => {
                    warn!(frame = index, error = %e, "语音播放失败，继续回放");
                    self.summary.voice_errors += 1;
                    self.engine.take_redraw_request()
                }
                Err(e) => return Err(e).with_context(|| format!("第 {} 帧更新失败", index)),
            }
        } else {
            self.run_action(index, frame.action)
        };

        if redraw {
            self.summary.redraws += 1;
            self.engine.draw();
            let calls = self.engine.backend.take_calls();
            self.summary.draw_calls += calls.len();
            self.dump_calls(index, &calls)?;
        }
        Ok(())
    }

    /// 没有活动界面时的宿主默认逻辑，返回是否需要重绘
    fn run_action(&mut self, index: usize, action: Option<FrameAction>) -> bool {
        match action {
            Some(FrameAction::Advance) => {
                if self.script.advance(&mut self.engine).is_some() {
                    self.summary.committed += 1;
                } else {
                    debug!(frame = index, "对话脚本已结束");
                }
                false
            }
            Some(FrameAction::OpenBacklog) => {
                self.engine.open_backlog();
                true
            }
            None => false,
        }
    }

    fn dump_calls(&mut self, index: usize, calls: &[DrawCall]) -> anyhow::Result<()> {
        let Some(out) = self.dump.as_mut() else {
            return Ok(());
        };
        for call in calls {
            let content = match call {
                DrawCall::Text { text, .. } => self.engine.backend.text_content(*text),
                _ => None,
            };
            let line = serde_json::json!({
                "frame": index,
                "call": call,
                "content": content,
            });
            writeln!(out, "{}", line).context("绘制调用输出失败")?;
        }
        Ok(())
    }
}
