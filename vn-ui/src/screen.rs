//! # Screen 模块
//!
//! 单槽位的模态界面宿主。
//!
//! ## 设计说明
//!
//! - 同一时刻最多只有一个活动界面，不是导航栈，没有"返回上一层"
//! - 活动界面存在时，引擎跳过自己的默认逐帧逻辑，完全交给界面处理
//! - 槽位被占用时再次 `enter` 属于调用方 bug，直接 panic
//! - `exit` 只丢弃界面，不调用 `destroy`；界面持有的外部资源需先自行释放

use tracing::debug;

use crate::engine::EngineState;
use crate::error::UiResult;

/// 一帧更新后界面给出的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenUpdate {
    /// 无变化
    Idle,
    /// 需要重绘
    Redraw,
    /// 界面已结束（已释放自身资源），宿主在同一帧内清空槽位
    Exit,
}

/// 模态界面
///
/// `B` 为宿主提供的后端（文本、矩形、音频协作方的组合）。
pub trait Screen<B> {
    /// 每帧更新
    ///
    /// 返回 `Err` 前若界面已有可见改动，应先调用 [`EngineState::request_redraw`]。
    fn update(&mut self, state: &mut EngineState, backend: &mut B, dt: f32)
    -> UiResult<ScreenUpdate>;

    /// 绘制
    fn draw(&self, state: &EngineState, backend: &mut B);

    /// 释放界面持有的外部资源
    fn destroy(&mut self, state: &mut EngineState, backend: &mut B);
}

/// 模态界面宿主
pub struct ScreenHost<B> {
    active: Option<Box<dyn Screen<B>>>,
}

impl<B> Default for ScreenHost<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> ScreenHost<B> {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// 进入界面
    ///
    /// # Panics
    ///
    /// 已有活动界面时 panic。
    pub fn enter(&mut self, screen: Box<dyn Screen<B>>) {
        assert!(
            self.active.is_none(),
            "ScreenHost::enter: 已有活动界面，不支持嵌套进入"
        );
        debug!("进入模态界面");
        self.active = Some(screen);
    }

    /// 清空槽位（不调用 `destroy`）
    pub fn exit(&mut self) {
        if self.active.take().is_some() {
            debug!("退出模态界面");
        }
    }

    /// 先 `destroy` 再 `exit`，用于引擎关闭等外部强制结束的场合
    pub fn close(&mut self, state: &mut EngineState, backend: &mut B) {
        if let Some(mut screen) = self.active.take() {
            screen.destroy(state, backend);
            debug!("关闭模态界面");
        }
    }

    /// 分发每帧更新，返回是否需要重绘
    ///
    /// 界面通过返回值或 [`EngineState::request_redraw`] 请求重绘，两者在成功时合并消费；
    /// 出错时重绘请求留在 `state` 中。没有活动界面时为空操作。
    pub fn update(&mut self, state: &mut EngineState, backend: &mut B, dt: f32) -> UiResult<bool> {
        let Some(screen) = self.active.as_mut() else {
            return Ok(false);
        };

        let update = screen.update(state, backend, dt)?;
        let requested = state.take_redraw_request();
        match update {
            ScreenUpdate::Idle => Ok(requested),
            ScreenUpdate::Redraw => Ok(true),
            ScreenUpdate::Exit => {
                self.exit();
                Ok(true)
            }
        }
    }

    /// 分发绘制
    pub fn draw(&self, state: &EngineState, backend: &mut B) {
        if let Some(screen) = self.active.as_ref() {
            screen.draw(state, backend);
        }
    }

    /// 是否有活动界面
    pub fn enabled(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiConfig;
    use crate::error::AudioError;
    use std::cell::Cell;
    use std::rc::Rc;

    /// 计数用的假界面
    struct CountingScreen {
        updates: Rc<Cell<u32>>,
        destroyed: Rc<Cell<bool>>,
        exit_after: u32,
    }

    impl Screen<Vec<&'static str>> for CountingScreen {
        fn update(
            &mut self,
            _state: &mut EngineState,
            _backend: &mut Vec<&'static str>,
            _dt: f32,
        ) -> UiResult<ScreenUpdate> {
            self.updates.set(self.updates.get() + 1);
            if self.updates.get() >= self.exit_after {
                Ok(ScreenUpdate::Exit)
            } else {
                Ok(ScreenUpdate::Redraw)
            }
        }

        fn draw(&self, _state: &EngineState, backend: &mut Vec<&'static str>) {
            backend.push("draw");
        }

        fn destroy(&mut self, _state: &mut EngineState, _backend: &mut Vec<&'static str>) {
            self.destroyed.set(true);
        }
    }

    /// 只通过状态请求重绘的界面，第二帧起更新失败
    struct RequestingScreen {
        frames: u32,
    }

    impl Screen<Vec<&'static str>> for RequestingScreen {
        fn update(
            &mut self,
            state: &mut EngineState,
            _backend: &mut Vec<&'static str>,
            _dt: f32,
        ) -> UiResult<ScreenUpdate> {
            self.frames += 1;
            state.request_redraw();
            if self.frames > 1 {
                return Err(AudioError::Device {
                    message: "无设备".to_string(),
                }
                .into());
            }
            Ok(ScreenUpdate::Idle)
        }

        fn draw(&self, _state: &EngineState, _backend: &mut Vec<&'static str>) {}

        fn destroy(&mut self, _state: &mut EngineState, _backend: &mut Vec<&'static str>) {}
    }

    fn counting(exit_after: u32) -> (CountingScreen, Rc<Cell<u32>>, Rc<Cell<bool>>) {
        let updates = Rc::new(Cell::new(0));
        let destroyed = Rc::new(Cell::new(false));
        let screen = CountingScreen {
            updates: updates.clone(),
            destroyed: destroyed.clone(),
            exit_after,
        };
        (screen, updates, destroyed)
    }

    #[test]
    fn test_inactive_host_is_noop() {
        let mut host: ScreenHost<Vec<&'static str>> = ScreenHost::new();
        let mut state = EngineState::new(UiConfig::default());
        let mut backend = Vec::new();

        assert!(!host.enabled());
        assert_eq!(host.update(&mut state, &mut backend, 0.016), Ok(false));
        host.draw(&state, &mut backend);
        assert!(backend.is_empty());
    }

    #[test]
    fn test_dispatch_and_exit() {
        let mut host: ScreenHost<Vec<&'static str>> = ScreenHost::new();
        let mut state = EngineState::new(UiConfig::default());
        let mut backend = Vec::new();
        let (screen, updates, destroyed) = counting(2);

        host.enter(Box::new(screen));
        assert!(host.enabled());

        assert_eq!(host.update(&mut state, &mut backend, 0.016), Ok(true));
        host.draw(&state, &mut backend);
        assert_eq!(backend, vec!["draw"]);

        // 第二帧界面请求退出，同一帧内槽位被清空
        assert_eq!(host.update(&mut state, &mut backend, 0.016), Ok(true));
        assert!(!host.enabled());
        assert_eq!(updates.get(), 2);
        // 宿主的 exit 不会替界面调用 destroy
        assert!(!destroyed.get());
    }

    #[test]
    fn test_redraw_request_survives_error() {
        let mut host: ScreenHost<Vec<&'static str>> = ScreenHost::new();
        let mut state = EngineState::new(UiConfig::default());
        let mut backend = Vec::new();
        host.enter(Box::new(RequestingScreen { frames: 0 }));

        // 成功时请求被合并进返回值并清除
        assert_eq!(host.update(&mut state, &mut backend, 0.016), Ok(true));
        assert!(!state.take_redraw_request());

        // 出错时请求留在状态里
        assert!(host.update(&mut state, &mut backend, 0.016).is_err());
        assert!(state.take_redraw_request());
        assert!(host.enabled());
    }

    #[test]
    fn test_close_calls_destroy() {
        let mut host: ScreenHost<Vec<&'static str>> = ScreenHost::new();
        let mut state = EngineState::new(UiConfig::default());
        let mut backend = Vec::new();
        let (screen, _, destroyed) = counting(10);

        host.enter(Box::new(screen));
        host.close(&mut state, &mut backend);
        assert!(destroyed.get());
        assert!(!host.enabled());
    }

    #[test]
    #[should_panic(expected = "已有活动界面")]
    fn test_nested_enter_panics() {
        let mut host: ScreenHost<Vec<&'static str>> = ScreenHost::new();
        let (a, _, _) = counting(1);
        let (b, _, _) = counting(1);
        host.enter(Box::new(a));
        host.enter(Box::new(b));
    }
}
