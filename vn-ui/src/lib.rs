//! # VN UI
//!
//! Visual Novel Engine 的模态界面核心：单槽位界面宿主、虚拟化列表和对话回看缓冲。
//!
//! ## 架构概述
//!
//! `vn-ui` 是纯逻辑库，不依赖任何窗口、渲染或音频库。
//! 文本绘制、矩形填充、语音播放都通过 [`backend`] 中的 trait 交给宿主实现：
//!
//! ```text
//! 游戏主循环                      vn-ui
//!   │                              │
//!   │──── begin_frame(snapshot) ──►│
//!   │──── update(dt) ─────────────►│ ScreenHost → ListView → BacklogView
//!   │◄─── 是否需要重绘 ────────────│
//!   │──── draw() ─────────────────►│ ──► TextBackend / RectBackend
//!   │                              │
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! use vn_ui::{Engine, RecordingBackend, SpeakerName, UiConfig, UiError};
//!
//! let mut engine = Engine::new(UiConfig::default(), RecordingBackend::new());
//!
//! // 解释器写入一条对话
//! let name = engine.backend.create_text("角色A");
//! engine.state.backlog.stage_name(Some(SpeakerName::Owned(name)), &mut engine.backend);
//! let line = engine.backend.create_text("你好");
//! engine.state.backlog.commit(vec![Some(line)], &mut engine.backend);
//!
//! // 打开回看并逐帧驱动
//! engine.open_backlog();
//! loop {
//!     engine.begin_frame(poll_input());
//!     let redraw = match engine.update(dt) {
//!         Ok(redraw) => redraw,
//!         // 语音失败不关闭界面，出错前的改动照常重绘
//!         Err(UiError::Audio(_)) => engine.take_redraw_request(),
//!         Err(e) => return Err(e),
//!     };
//!     if redraw {
//!         engine.draw();
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`screen`]：模态界面宿主
//! - [`list`]：虚拟化列表
//! - [`backlog`]：对话回看环形缓冲与其列表数据来源
//! - [`engine`]：引擎上下文
//! - [`input`]：输入快照
//! - [`backend`]：外部协作方接口与内存记录后端
//! - [`config`]：界面配置
//! - [`error`]：错误类型定义

pub mod backend;
pub mod backlog;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod list;
pub mod screen;

// 重导出核心类型
pub use backend::{
    AudioBackend, Color, DrawCall, DrawLayer, RecordingBackend, Rect, RectBackend, TextBackend,
    TextHandle, TextRef,
};
pub use backlog::{Backlog, BacklogRecord, BacklogView, SpeakerName, VoiceFilename};
pub use config::{BacklogConfig, UiConfig, ViewportConfig};
pub use engine::{Engine, EngineState};
pub use error::{AudioError, ConfigError, UiError, UiResult};
pub use input::{Button, InputSnapshot, InputState, PointerPos};
pub use list::{LayoutDirection, ListSource, ListView, NodeHandle};
pub use screen::{Screen, ScreenHost, ScreenUpdate};
