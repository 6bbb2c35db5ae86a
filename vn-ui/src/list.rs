//! # 虚拟化列表界面
//!
//! 在固定视口内展示一个等高、惰性遍历、长度不限的节点序列。
//!
//! ## 设计说明
//!
//! - 序列归调用方所有，列表只通过 [`NodeHandle`] 和 [`ListSource`] 的
//!   `next` / `previous` 访问它，从不解引用或释放句柄
//! - `anchor` 是最靠近视口起始边的节点；连续滚动量 `scroll_offset`
//!   每帧结束时归一化到一个节点高度以内，多出的部分转换为锚点移动
//! - `selection_offset` 是高亮节点相对锚点的步数，只在绘制或确认时才沿链表走到
//! - 倒序布局（第一个节点贴底、向上生长）下，连续增量取反、上下键互换，
//!   因此"下"始终指向序列后方
//!
//! ## 行坐标
//!
//! ```text
//! 正序: y(r) = scroll_offset + r * node_height
//! 倒序: y(r) = viewport_height - (1 + r) * node_height - scroll_offset
//! ```

use tracing::debug;

use crate::backend::{Color, DrawLayer, Rect, RectBackend};
use crate::config::ViewportConfig;
use crate::engine::EngineState;
use crate::error::UiResult;
use crate::input::{Button, InputState};
use crate::screen::{Screen, ScreenUpdate};

/// 滚轮每格滚动的节点高度比例
const WHEEL_STEP_RATIO: f32 = 0.5;

/// 遮罩与高亮条的透明度
const OVERLAY_ALPHA: f32 = 0.5;

/// 节点句柄
///
/// 对列表不透明。数组实现的序列使用 `Index`，其它实现可用 `Key` 携带自己的编号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeHandle {
    Index(usize),
    Key(u64),
}

impl NodeHandle {
    pub fn index(self) -> Option<usize> {
        match self {
            NodeHandle::Index(i) => Some(i),
            NodeHandle::Key(_) => None,
        }
    }
}

/// 布局方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutDirection {
    /// 第一个节点在顶部，向下生长
    #[default]
    TopDown,
    /// 第一个节点贴底，向上生长
    BottomUp,
}

/// 列表的数据来源
///
/// 实现者自身即列表持有的负载，列表结束时通过 `destroy` 释放。
/// 遍历与绘制回调被视为对调用方状态全定义，`None` 只表示"没有更多节点"。
pub trait ListSource<B> {
    /// 序列中的下一个节点
    fn next(&self, state: &EngineState, node: NodeHandle) -> Option<NodeHandle>;

    /// 序列中的上一个节点
    fn previous(&self, state: &EngineState, node: NodeHandle) -> Option<NodeHandle>;

    /// 在行顶部 y 处绘制节点
    fn draw_node(&self, state: &EngineState, backend: &mut B, node: NodeHandle, y: f32);

    /// 确认选中的节点
    fn ok(
        &mut self,
        _state: &mut EngineState,
        _backend: &mut B,
        _node: NodeHandle,
    ) -> UiResult<()> {
        Ok(())
    }

    /// 释放负载
    fn destroy(&mut self, _state: &mut EngineState, _backend: &mut B) {}
}

/// 虚拟化列表
pub struct ListView<S> {
    source: S,
    direction: LayoutDirection,
    viewport_width: f32,
    viewport_height: f32,
    node_height: f32,
    anchor: NodeHandle,
    scroll_offset: f32,
    selection_offset: i32,
}

impl<S> ListView<S> {
    /// 创建列表
    ///
    /// `nodes_per_screen` 决定节点高度（视口高度 / 每屏节点数），为 0 时按 1 处理。
    pub fn new(
        source: S,
        anchor: NodeHandle,
        direction: LayoutDirection,
        nodes_per_screen: usize,
        viewport: &ViewportConfig,
    ) -> Self {
        let nodes_per_screen = nodes_per_screen.max(1);
        Self {
            source,
            direction,
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            node_height: viewport.height / nodes_per_screen as f32,
            anchor,
            scroll_offset: 0.0,
            selection_offset: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn direction(&self) -> LayoutDirection {
        self.direction
    }

    pub fn node_height(&self) -> f32 {
        self.node_height
    }

    pub fn anchor(&self) -> NodeHandle {
        self.anchor
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn selection_offset(&self) -> i32 {
        self.selection_offset
    }

    /// 相对锚点第 `rel` 行的顶部 y
    pub fn row_y(&self, rel: i32) -> f32 {
        let rel = rel as f32;
        match self.direction {
            LayoutDirection::TopDown => self.scroll_offset + rel * self.node_height,
            LayoutDirection::BottomUp => {
                self.viewport_height - (1.0 + rel) * self.node_height - self.scroll_offset
            }
        }
    }

    fn row_step(&self) -> f32 {
        match self.direction {
            LayoutDirection::TopDown => self.node_height,
            LayoutDirection::BottomUp => -self.node_height,
        }
    }

    fn row_visible(&self, y: f32) -> bool {
        match self.direction {
            LayoutDirection::TopDown => y < self.viewport_height,
            LayoutDirection::BottomUp => y > -self.node_height,
        }
    }

    /// 把屏幕方向的增量换算成序列方向
    fn mirror(&self, delta: f32) -> f32 {
        match self.direction {
            LayoutDirection::TopDown => delta,
            LayoutDirection::BottomUp => -delta,
        }
    }

    /// 合并拖动与滚轮：滚轮幅度更大时按半个节点高度一格，否则按像素拖动
    fn fuse_delta(&self, input: &InputState) -> f32 {
        let drag = input.drag_delta();
        let wheel = input.wheel_delta();
        if wheel.abs() > drag.abs() {
            wheel * self.node_height * WHEEL_STEP_RATIO
        } else {
            drag
        }
    }
}

impl<S> ListView<S> {
    /// 按序列方向的增量滚动（正值朝 `previous`）
    fn scroll_by<B>(&mut self, state: &EngineState, delta: f32)
    where
        S: ListSource<B>,
    {
        if !delta.is_finite() || delta == 0.0 {
            return;
        }

        let blocked = if delta > 0.0 {
            self.source.previous(state, self.anchor).is_none()
        } else {
            self.source.next(state, self.anchor).is_none()
        };
        if blocked {
            self.scroll_offset = 0.0;
            return;
        }

        self.scroll_offset += delta;
        self.renormalize::<B>(state);
    }

    /// 把 `scroll_offset` 收回 (-node_height, node_height)，超出部分转换为锚点移动
    fn renormalize<B>(&mut self, state: &EngineState)
    where
        S: ListSource<B>,
    {
        while self.scroll_offset >= self.node_height {
            self.scroll_offset -= self.node_height;
            match self.source.previous(state, self.anchor) {
                Some(prev) => {
                    self.anchor = prev;
                    self.selection_offset += 1;
                }
                None => {
                    self.scroll_offset = 0.0;
                    break;
                }
            }
        }

        while self.scroll_offset <= -self.node_height {
            self.scroll_offset += self.node_height;
            match self.source.next(state, self.anchor) {
                Some(next) => {
                    self.anchor = next;
                    self.selection_offset -= 1;
                }
                None => {
                    self.scroll_offset = 0.0;
                    break;
                }
            }
        }
    }

    /// 鼠标 y 所在的行（相对锚点），不在任何已显示的行上时为 `None`
    fn row_at<B>(&self, state: &EngineState, pointer_y: f32) -> Option<i32>
    where
        S: ListSource<B>,
    {
        let contains = |top: f32| pointer_y >= top && pointer_y < top + self.node_height;

        if self.source.previous(state, self.anchor).is_some() && contains(self.row_y(-1)) {
            return Some(-1);
        }

        let mut y = self.row_y(0);
        let mut node = self.anchor;
        let mut rel = 0;
        while self.row_visible(y) {
            if contains(y) {
                return Some(rel);
            }
            y += self.row_step();
            node = self.source.next(state, node)?;
            rel += 1;
        }
        None
    }

    /// 从锚点走 `selection_offset` 步得到选中的节点
    pub fn selected_node<B>(&self, state: &EngineState) -> Option<NodeHandle>
    where
        S: ListSource<B>,
    {
        let mut node = self.anchor;
        if self.selection_offset >= 0 {
            for _ in 0..self.selection_offset {
                node = self.source.next(state, node)?;
            }
        } else {
            for _ in 0..self.selection_offset.unsigned_abs() {
                node = self.source.previous(state, node)?;
            }
        }
        Some(node)
    }
}

impl<S, B> Screen<B> for ListView<S>
where
    S: ListSource<B>,
    B: RectBackend,
{
    fn update(
        &mut self,
        state: &mut EngineState,
        backend: &mut B,
        _dt: f32,
    ) -> UiResult<ScreenUpdate> {
        let input = state.input;

        if input.just_pressed(Button::Cancel) {
            self.destroy(state, backend);
            return Ok(ScreenUpdate::Exit);
        }

        let before = (self.anchor, self.scroll_offset, self.selection_offset);

        if input.current.pointer_down || input.wheel_delta() != 0.0 {
            let delta = self.mirror(self.fuse_delta(&input));
            self.scroll_by::<B>(state, delta);
        }

        let mut up = input.just_pressed(Button::Up);
        let mut down = input.just_pressed(Button::Down);
        if self.direction == LayoutDirection::BottomUp {
            std::mem::swap(&mut up, &mut down);
        }
        if up {
            self.selection_offset -= 1;
        }
        if down {
            self.selection_offset += 1;
        }

        if input.pointer_moved()
            && let Some(pointer) = input.current.pointer
            && let Some(rel) = self.row_at::<B>(state, pointer.y)
        {
            self.selection_offset = rel;
        }

        // 确认回调可能出错，重绘请求要在它之前登记
        if (self.anchor, self.scroll_offset, self.selection_offset) != before {
            state.request_redraw();
        }

        if input.just_pressed(Button::Ok)
            && let Some(node) = self.selected_node::<B>(state)
        {
            self.source.ok(state, backend, node)?;
        }

        Ok(if state.take_redraw_request() {
            ScreenUpdate::Redraw
        } else {
            ScreenUpdate::Idle
        })
    }

    fn draw(&self, state: &EngineState, backend: &mut B) {
        backend.draw_background();

        let width = self.viewport_width;
        let selection_y = self.row_y(self.selection_offset);
        backend.fill_rects(
            &[Rect::new(0.0, 0.0, width, self.viewport_height)],
            Color::BLACK,
            OVERLAY_ALPHA,
            DrawLayer::Background,
        );
        backend.fill_rects(
            &[Rect::new(0.0, selection_y, width, self.node_height)],
            Color::WHITE,
            OVERLAY_ALPHA,
            DrawLayer::Background,
        );
        backend.fill_rects(
            &[Rect::new(0.0, self.row_y(0), width, self.node_height)],
            Color::RED,
            OVERLAY_ALPHA,
            DrawLayer::Background,
        );

        if let Some(prev) = self.source.previous(state, self.anchor) {
            self.source.draw_node(state, backend, prev, self.row_y(-1));
        }

        let mut y = self.row_y(0);
        let mut node = self.anchor;
        while self.row_visible(y) {
            self.source.draw_node(state, backend, node, y);
            y += self.row_step();
            match self.source.next(state, node) {
                Some(next) => node = next,
                None => break,
            }
        }
    }

    fn destroy(&mut self, state: &mut EngineState, backend: &mut B) {
        debug!(anchor = ?self.anchor, "列表界面结束");
        self.source.destroy(state, backend);
    }
}
