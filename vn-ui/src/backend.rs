//! # Backend 模块
//!
//! 文本、矩形填充、音频三类外部协作方的接口。
//!
//! ## 设计说明
//!
//! - 核心只追踪文本句柄的所有权，从不读取其内容
//! - `TextHandle` 只能移动，释放时被消耗，因此同一句柄不可能被释放两次
//! - `TextRef` 是可复制的只读引用，只能用于绘制
//! - `RecordingBackend` 把所有调用记录在内存中，供无窗口宿主和测试使用

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// 轴对齐矩形（x, y, w, h）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// 绘制层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawLayer {
    /// 背景层（遮罩、高亮条）
    Background,
    /// UI 元素层（文字）
    UiElement,
}

/// 拥有所有权的文本句柄
///
/// 由文本后端创建。不实现 `Clone`：交给 [`TextBackend::free_text`] 后即失效。
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TextHandle(u64);

impl TextHandle {
    /// 由后端用内部编号铸造句柄
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }

    /// 借出一个只读引用
    pub fn as_text_ref(&self) -> TextRef {
        TextRef(self.0)
    }
}

/// 不拥有所有权的文本引用，只能绘制，不能释放
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRef(u64);

impl TextRef {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// 文本渲染协作方
pub trait TextBackend {
    /// 在 (x, y) 处绘制一段已排版的文本
    fn draw_text(
        &mut self,
        text: TextRef,
        x: f32,
        y: f32,
        color: Color,
        alpha: f32,
        layer: DrawLayer,
    );

    /// 释放文本句柄
    fn free_text(&mut self, text: TextHandle);
}

/// 矩形填充协作方
pub trait RectBackend {
    fn fill_rects(&mut self, rects: &[Rect], color: Color, alpha: f32, layer: DrawLayer);

    /// 重绘遮罩下方的游戏画面
    fn draw_background(&mut self) {}
}

/// 音频协作方
pub trait AudioBackend {
    fn play_voice(&mut self, filename: &str) -> Result<(), AudioError>;
}

/// 一次被记录的绘制调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCall {
    Background,
    Rects {
        rects: Vec<Rect>,
        color: Color,
        alpha: f32,
        layer: DrawLayer,
    },
    Text {
        text: u64,
        x: f32,
        y: f32,
        color: Color,
        alpha: f32,
        layer: DrawLayer,
    },
}

impl DrawCall {
    /// 单行摘要，用于日志和快照
    pub fn summary(&self) -> String {
        match self {
            DrawCall::Background => "background".to_string(),
            DrawCall::Rects {
                rects, color, alpha, ..
            } => {
                let parts: Vec<String> = rects
                    .iter()
                    .map(|r| format!("{} {} {} {}", r.x, r.y, r.w, r.h))
                    .collect();
                format!(
                    "rect [{}] rgb({},{},{}) a={}",
                    parts.join("; "),
                    color.r,
                    color.g,
                    color.b,
                    alpha
                )
            }
            DrawCall::Text { text, x, y, .. } => format!("text #{} at {} {}", text, x, y),
        }
    }
}

/// 内存记录后端
///
/// 铸造文本句柄、记录绘制调用、释放的句柄与语音请求。
/// 语音文件只有通过 [`RecordingBackend::add_voice`] 登记后才视为存在。
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_text_id: u64,
    texts: Vec<String>,
    calls: Vec<DrawCall>,
    freed: Vec<u64>,
    voices: HashSet<String>,
    played: Vec<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一段文本并返回其所有权句柄
    pub fn create_text(&mut self, content: impl Into<String>) -> TextHandle {
        let id = self.next_text_id;
        self.next_text_id += 1;
        self.texts.push(content.into());
        TextHandle::new(id)
    }

    /// 查询句柄对应的文本内容
    pub fn text_content(&self, id: u64) -> Option<&str> {
        self.texts.get(id as usize).map(String::as_str)
    }

    /// 登记一个可播放的语音文件
    pub fn add_voice(&mut self, filename: impl Into<String>) {
        self.voices.insert(filename.into());
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// 取走已记录的绘制调用
    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn freed(&self) -> &[u64] {
        &self.freed
    }

    pub fn played(&self) -> &[String] {
        &self.played
    }

    /// 已创建但尚未释放的句柄数
    pub fn live_texts(&self) -> usize {
        self.texts.len() - self.freed.len()
    }
}

impl TextBackend for RecordingBackend {
    fn draw_text(
        &mut self,
        text: TextRef,
        x: f32,
        y: f32,
        color: Color,
        alpha: f32,
        layer: DrawLayer,
    ) {
        self.calls.push(DrawCall::Text {
            text: text.id(),
            x,
            y,
            color,
            alpha,
            layer,
        });
    }

    fn free_text(&mut self, text: TextHandle) {
        self.freed.push(text.id());
    }
}

impl RectBackend for RecordingBackend {
    fn fill_rects(&mut self, rects: &[Rect], color: Color, alpha: f32, layer: DrawLayer) {
        self.calls.push(DrawCall::Rects {
            rects: rects.to_vec(),
            color,
            alpha,
            layer,
        });
    }

    fn draw_background(&mut self) {
        self.calls.push(DrawCall::Background);
    }
}

impl AudioBackend for RecordingBackend {
    fn play_voice(&mut self, filename: &str) -> Result<(), AudioError> {
        if !self.voices.contains(filename) {
            return Err(AudioError::NotFound {
                path: filename.to_string(),
            });
        }
        self.played.push(filename.to_string());
        Ok(())
    }
}
