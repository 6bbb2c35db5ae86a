//! # Backend 模块
//!
//! 无窗口后端：文本与矩形调用交给 [`RecordingBackend`] 记录，
//! 语音播放只检查 `voice_dir` 下的文件是否存在且格式受支持。
//! `voice_dir` 本身不是目录时视为音频设备不可用。

use std::path::{Path, PathBuf};

use vn_ui::{
    AudioBackend, AudioError, Color, DrawCall, DrawLayer, RecordingBackend, Rect, RectBackend,
    TextBackend, TextHandle, TextRef,
};

/// 支持的语音格式
const SUPPORTED_VOICE_EXTENSIONS: &[&str] = &["ogg", "wav", "mp3", "flac"];

/// 无窗口后端
#[derive(Debug)]
pub struct HeadlessBackend {
    recorder: RecordingBackend,
    voice_dir: PathBuf,
    played: Vec<PathBuf>,
}

impl HeadlessBackend {
    pub fn new(voice_dir: impl Into<PathBuf>) -> Self {
        Self {
            recorder: RecordingBackend::new(),
            voice_dir: voice_dir.into(),
            played: Vec::new(),
        }
    }

    pub fn create_text(&mut self, content: &str) -> TextHandle {
        self.recorder.create_text(content)
    }

    pub fn text_content(&self, id: u64) -> Option<&str> {
        self.recorder.text_content(id)
    }

    /// 取走本帧的绘制调用
    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        self.recorder.take_calls()
    }

    /// 已播放的语音（完整路径）
    pub fn played(&self) -> &[PathBuf] {
        &self.played
    }

    pub fn live_texts(&self) -> usize {
        self.recorder.live_texts()
    }

    pub fn voice_dir(&self) -> &Path {
        &self.voice_dir
    }
}

impl TextBackend for HeadlessBackend {
    fn draw_text(
        &mut self,
        text: TextRef,
        x: f32,
        y: f32,
        color: Color,
        alpha: f32,
        layer: DrawLayer,
    ) {
        self.recorder.draw_text(text, x, y, color, alpha, layer);
    }

    fn free_text(&mut self, text: TextHandle) {
        self.recorder.free_text(text);
    }
}

impl RectBackend for HeadlessBackend {
    fn fill_rects(&mut self, rects: &[Rect], color: Color, alpha: f32, layer: DrawLayer) {
        self.recorder.fill_rects(rects, color, alpha, layer);
    }

    fn draw_background(&mut self) {
        self.recorder.draw_background();
    }
}

impl AudioBackend for HeadlessBackend {
    fn play_voice(&mut self, filename: &str) -> Result<(), AudioError> {
        if !self.voice_dir.is_dir() {
            return Err(AudioError::Device {
                message: format!("语音目录不可用: {}", self.voice_dir.display()),
            });
        }

        let path = self.voice_dir.join(filename);
        let display = path.display().to_string();

        if !path.is_file() {
            return Err(AudioError::NotFound { path: display });
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !SUPPORTED_VOICE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AudioError::Unsupported {
                path: display,
                message: format!("扩展名 '{extension}' 不受支持"),
            });
        }

        self.played.push(path);
        Ok(())
    }
}
