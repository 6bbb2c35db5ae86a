//! # Engine 模块
//!
//! 引擎上下文：持有界面宿主槽位、共享状态和后端。
//!
//! ## 帧流程
//!
//! ```text
//! begin_frame(snapshot)   输入快照只采集一次
//!        │
//! update(dt)  ──有活动界面──► ScreenHost::update ──► Screen::update
//!        │                     （否则由宿主运行自己的默认逻辑）
//! draw()      ──有活动界面──► Screen::draw
//! ```
//!
//! 界面宿主槽位是引擎上下文的普通字段，不是全局单例；
//! 分发时把 `state` 和 `backend` 分别借给界面。

use tracing::info;

use crate::backend::{AudioBackend, RectBackend, TextBackend};
use crate::backlog::{Backlog, BacklogView};
use crate::config::UiConfig;
use crate::error::UiResult;
use crate::input::{InputSnapshot, InputState};
use crate::screen::{Screen, ScreenHost};

/// 界面可以读写的引擎状态
#[derive(Debug)]
pub struct EngineState {
    pub config: UiConfig,
    pub input: InputState,
    pub backlog: Backlog,
    /// 本帧是否需要重绘；与 `update` 的返回值分开，出错时也不会丢失
    redraw_requested: bool,
}

impl EngineState {
    pub fn new(config: UiConfig) -> Self {
        let backlog = Backlog::new(config.backlog.capacity.max(1));
        Self {
            config,
            input: InputState::new(),
            backlog,
            redraw_requested: false,
        }
    }

    /// 请求在本帧结束后重绘
    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    /// 取出并清除重绘请求
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }
}

/// 引擎上下文
pub struct Engine<B> {
    pub state: EngineState,
    pub backend: B,
    screens: ScreenHost<B>,
}

impl<B> Engine<B> {
    /// 创建引擎，配置需事先通过 [`UiConfig::validate`]
    pub fn new(config: UiConfig, backend: B) -> Self {
        Self {
            state: EngineState::new(config),
            backend,
            screens: ScreenHost::new(),
        }
    }

    /// 开始新的一帧
    pub fn begin_frame(&mut self, snapshot: InputSnapshot) {
        self.state.input.advance(snapshot);
    }

    /// 是否有活动界面（有则宿主应跳过默认逐帧逻辑）
    pub fn screen_enabled(&self) -> bool {
        self.screens.enabled()
    }

    /// 进入模态界面
    ///
    /// # Panics
    ///
    /// 已有活动界面时 panic。
    pub fn enter_screen(&mut self, screen: Box<dyn Screen<B>>) {
        self.screens.enter(screen);
    }

    /// 更新活动界面，返回是否需要重绘
    ///
    /// 返回 `Err` 时，界面在出错前做出的改动仍可能需要重绘，
    /// 调用方应再通过 [`Engine::take_redraw_request`] 取出重绘请求。
    pub fn update(&mut self, dt: f32) -> UiResult<bool> {
        self.screens.update(&mut self.state, &mut self.backend, dt)
    }

    /// 取出并清除尚未被 `update` 消费的重绘请求
    pub fn take_redraw_request(&mut self) -> bool {
        self.state.take_redraw_request()
    }

    /// 绘制活动界面
    pub fn draw(&mut self) {
        self.screens.draw(&self.state, &mut self.backend);
    }
}

impl<B> Engine<B>
where
    B: TextBackend + RectBackend + AudioBackend + 'static,
{
    /// 打开对话回看
    ///
    /// # Panics
    ///
    /// 已有活动界面时 panic。
    pub fn open_backlog(&mut self) {
        let view = BacklogView::open(&self.state.config, &self.state.backlog);
        self.enter_screen(Box::new(view));
    }

    /// 关闭活动界面并释放回看缓冲持有的所有文本句柄
    pub fn shutdown(&mut self) {
        self.screens.close(&mut self.state, &mut self.backend);
        self.state.backlog.release_all(&mut self.backend);
        info!("引擎已关闭");
    }
}
