//! # Backlog 模块
//!
//! 对话回看的固定容量环形缓冲，以及在虚拟化列表中展示它的数据来源。
//!
//! ## 设计原则
//!
//! - 脚本解释器分多次调用暂存说话者名字和语音文件名，`commit` 时一次性
//!   连同文本行移入写游标所在的槽位，然后清空暂存区
//! - 写游标总是指向最久未写入的槽位；写满后直接覆盖最旧的记录，
//!   覆盖前先释放该槽位拥有的文本句柄，因此 `commit` 永不失败
//! - 槽位编号直接作为列表的 [`NodeHandle::Index`]，遍历时不分配内存
//! - 只驻留内存，不负责持久化
//!
//! ## 遍历方向
//!
//! ```text
//! iterate_backward: 槽位 - 1（更早的记录），列表的 next
//! iterate_forward:  槽位 + 1（更新的记录），列表的 previous
//! ```

use std::fmt;

use tracing::{debug, info, warn};

use crate::backend::{AudioBackend, Color, DrawLayer, TextBackend, TextHandle, TextRef};
use crate::config::UiConfig;
use crate::engine::EngineState;
use crate::error::{UiError, UiResult};
use crate::list::{LayoutDirection, ListSource, ListView, NodeHandle};

/// 语音文件名缓冲的字节容量
pub const VOICE_FILENAME_CAPACITY: usize = 64;

/// 定长内联的语音文件名，空串表示没有语音
///
/// 超长的文件名在 UTF-8 字符边界处截断。
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VoiceFilename {
    buf: [u8; VOICE_FILENAME_CAPACITY],
    len: usize,
}

impl VoiceFilename {
    pub const fn empty() -> Self {
        Self {
            buf: [0; VOICE_FILENAME_CAPACITY],
            len: 0,
        }
    }

    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(VOICE_FILENAME_CAPACITY);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut buf = [0; VOICE_FILENAME_CAPACITY];
        buf[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self { buf, len: end }
    }

    pub fn as_str(&self) -> &str {
        let bytes = &self.buf[..self.len];
        std::str::from_utf8(bytes).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for VoiceFilename {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for VoiceFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VoiceFilename")
            .field(&self.as_str())
            .finish()
    }
}

/// 说话者名字
///
/// `Owned` 的句柄随记录一起释放；`Borrowed` 属于别处（例如对话框缓存），只用于绘制。
#[derive(Debug, PartialEq)]
pub enum SpeakerName {
    Owned(TextHandle),
    Borrowed(TextRef),
}

impl SpeakerName {
    pub fn text(&self) -> TextRef {
        match self {
            SpeakerName::Owned(handle) => handle.as_text_ref(),
            SpeakerName::Borrowed(text) => *text,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, SpeakerName::Owned(_))
    }

    fn release<T: TextBackend + ?Sized>(self, text: &mut T) {
        match self {
            SpeakerName::Owned(handle) => text.free_text(handle),
            SpeakerName::Borrowed(_) => {}
        }
    }
}

/// 一条回看记录
#[derive(Debug, Default)]
pub struct BacklogRecord {
    /// 文本行（`None` 为从未写入；行内 `None` 绘制时跳过）
    lines: Option<Box<[Option<TextHandle>]>>,
    name: Option<SpeakerName>,
    voice: VoiceFilename,
}

impl BacklogRecord {
    /// 自上次回绕以来是否写入过
    pub fn is_committed(&self) -> bool {
        self.lines.is_some()
    }

    /// 所有行槽位（含空行）
    pub fn line_slots(&self) -> &[Option<TextHandle>] {
        self.lines.as_deref().unwrap_or_default()
    }

    /// 需要绘制的行
    pub fn lines(&self) -> impl Iterator<Item = TextRef> + '_ {
        self.line_slots()
            .iter()
            .flatten()
            .map(TextHandle::as_text_ref)
    }

    pub fn name(&self) -> Option<&SpeakerName> {
        self.name.as_ref()
    }

    pub fn voice(&self) -> &str {
        self.voice.as_str()
    }

    fn release<T: TextBackend + ?Sized>(&mut self, text: &mut T) {
        if let Some(name) = self.name.take() {
            name.release(text);
        }
        if let Some(lines) = self.lines.take() {
            for line in lines.into_vec().into_iter().flatten() {
                text.free_text(line);
            }
        }
        self.voice = VoiceFilename::empty();
    }
}

/// 对话回看环形缓冲
#[derive(Debug)]
pub struct Backlog {
    records: Box<[BacklogRecord]>,
    /// 下一个要覆盖的槽位
    write_cursor: usize,
    pending_name: Option<SpeakerName>,
    pending_voice: VoiceFilename,
}

impl Backlog {
    /// 创建容量为 `capacity` 的缓冲
    ///
    /// # Panics
    ///
    /// `capacity` 为 0 时 panic。
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Backlog 容量至少为 1");
        Self {
            records: (0..capacity).map(|_| BacklogRecord::default()).collect(),
            write_cursor: 0,
            pending_name: None,
            pending_voice: VoiceFilename::empty(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// 暂存下一条记录的语音文件名
    pub fn stage_voice(&mut self, filename: &str) {
        self.pending_voice = VoiceFilename::new(filename);
    }

    /// 暂存下一条记录的说话者名字，已暂存的名字若为 `Owned` 先释放
    pub fn stage_name<T: TextBackend + ?Sized>(&mut self, name: Option<SpeakerName>, text: &mut T) {
        if let Some(old) = std::mem::replace(&mut self.pending_name, name) {
            old.release(text);
        }
    }

    /// 当前暂存的名字
    pub fn pending_name(&self) -> Option<&SpeakerName> {
        self.pending_name.as_ref()
    }

    /// 把暂存区与文本行写入写游标所在槽位，返回该槽位
    pub fn commit<T: TextBackend + ?Sized>(
        &mut self,
        lines: Vec<Option<TextHandle>>,
        text: &mut T,
    ) -> usize {
        let slot = self.write_cursor;
        let record = &mut self.records[slot];

        if record.is_committed() {
            debug!(slot = slot, "覆盖最旧的回看记录");
        }
        record.release(text);

        let line_count = lines.len();
        record.name = self.pending_name.take();
        record.lines = Some(lines.into_boxed_slice());
        record.voice = std::mem::take(&mut self.pending_voice);

        debug!(slot = slot, lines = line_count, voice = %record.voice.as_str(), "写入回看记录");

        self.write_cursor = (slot + 1) % self.capacity();
        slot
    }

    /// 更早的一条记录
    ///
    /// 当前槽位已是写游标（写满后的最旧记录），或前一个槽位从未写入时返回 `None`。
    pub fn iterate_backward(&self, index: usize) -> Option<usize> {
        if index >= self.capacity() || index == self.write_cursor {
            return None;
        }
        let candidate = if index == 0 {
            self.capacity() - 1
        } else {
            index - 1
        };
        self.records[candidate].is_committed().then_some(candidate)
    }

    /// 更新的一条记录
    ///
    /// 下一个槽位是写游标（即将回绕到最旧）或从未写入时返回 `None`。
    pub fn iterate_forward(&self, index: usize) -> Option<usize> {
        if index >= self.capacity() {
            return None;
        }
        let candidate = (index + 1) % self.capacity();
        if candidate == self.write_cursor {
            return None;
        }
        self.records[candidate].is_committed().then_some(candidate)
    }

    /// 最近写入的槽位（写游标 - 1）
    pub fn most_recent(&self) -> usize {
        if self.write_cursor == 0 {
            self.capacity() - 1
        } else {
            self.write_cursor - 1
        }
    }

    pub fn record(&self, index: usize) -> Option<&BacklogRecord> {
        self.records.get(index)
    }

    /// 从最新到最旧遍历有效记录
    pub fn iter_recent(&self) -> impl Iterator<Item = (usize, &BacklogRecord)> + '_ {
        let start = self.most_recent();
        let first = self.records[start].is_committed().then_some(start);
        std::iter::successors(first, move |&i| self.iterate_backward(i))
            .map(move |i| (i, &self.records[i]))
    }

    /// 有效记录数
    pub fn len(&self) -> usize {
        self.records.iter().filter(|r| r.is_committed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 释放所有拥有的文本句柄（包括暂存区），缓冲回到初始状态
    pub fn release_all<T: TextBackend + ?Sized>(&mut self, text: &mut T) {
        if let Some(name) = self.pending_name.take() {
            name.release(text);
        }
        self.pending_voice = VoiceFilename::empty();
        for record in self.records.iter_mut() {
            record.release(text);
        }
        self.write_cursor = 0;
    }
}

/// 对话回看界面的数据来源
///
/// 负载为空：记录全部存放在 [`EngineState::backlog`] 中。
#[derive(Debug, Default)]
pub struct BacklogView;

impl BacklogView {
    /// 创建锚定在最新记录、倒序布局（最新在底部）的列表
    pub fn open(config: &UiConfig, backlog: &Backlog) -> ListView<BacklogView> {
        let anchor = backlog.most_recent();
        info!(anchor = anchor, records = backlog.len(), "打开对话回看");
        ListView::new(
            BacklogView,
            NodeHandle::Index(anchor),
            LayoutDirection::BottomUp,
            config.backlog.nodes_per_screen,
            &config.viewport,
        )
    }
}

impl<B> ListSource<B> for BacklogView
where
    B: TextBackend + AudioBackend,
{
    fn next(&self, state: &EngineState, node: NodeHandle) -> Option<NodeHandle> {
        state
            .backlog
            .iterate_backward(node.index()?)
            .map(NodeHandle::Index)
    }

    fn previous(&self, state: &EngineState, node: NodeHandle) -> Option<NodeHandle> {
        state
            .backlog
            .iterate_forward(node.index()?)
            .map(NodeHandle::Index)
    }

    fn draw_node(&self, state: &EngineState, backend: &mut B, node: NodeHandle, y: f32) {
        let Some(record) = node.index().and_then(|i| state.backlog.record(i)) else {
            return;
        };

        let font_size = state.config.font_size;
        let layer = DrawLayer::UiElement;
        let mut y = y + font_size;

        if let Some(name) = record.name() {
            backend.draw_text(name.text(), 0.0, y, Color::WHITE, 1.0, layer);
            y += font_size;
        }

        for line in record.lines() {
            backend.draw_text(line, 0.0, y, Color::WHITE, 1.0, layer);
            y += font_size;
        }
    }

    fn ok(&mut self, state: &mut EngineState, backend: &mut B, node: NodeHandle) -> UiResult<()> {
        let Some(record) = node.index().and_then(|i| state.backlog.record(i)) else {
            return Ok(());
        };
        if record.voice.is_empty() {
            return Ok(());
        }

        let voice = record.voice;
        info!(voice = %voice.as_str(), "回看语音播放");
        backend.play_voice(voice.as_str()).map_err(|e| {
            warn!(voice = %voice.as_str(), error = %e, "回看语音播放失败");
            UiError::from(e)
        })
    }

    fn destroy(&mut self, _state: &mut EngineState, _backend: &mut B) {
        debug!("关闭对话回看");
    }
}
