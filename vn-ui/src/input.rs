//! # Input 模块
//!
//! 每帧采集一次的输入快照。
//!
//! ## 设计说明
//!
//! - 宿主在帧开始时提交一份 `InputSnapshot`，上一帧的快照自动保留为 `previous`
//! - 边沿触发（刚按下）与鼠标位移都由两份快照对比得出，帧内不会读到半更新的状态
//! - 鼠标位置不可用时（例如触屏抬起）为 `None`

use serde::{Deserialize, Serialize};

/// 离散按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    Ok,
    Cancel,
}

/// 鼠标位置
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerPos {
    pub x: f32,
    pub y: f32,
}

impl PointerPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 单帧输入快照（电平状态）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub ok: bool,
    pub cancel: bool,
    /// 鼠标位置（None 表示不可用）
    pub pointer: Option<PointerPos>,
    /// 鼠标左键是否按住
    pub pointer_down: bool,
    /// 本帧滚轮增量，正值向上
    pub wheel_delta: f32,
}

impl InputSnapshot {
    pub fn button(&self, button: Button) -> bool {
        match button {
            Button::Up => self.up,
            Button::Down => self.down,
            Button::Ok => self.ok,
            Button::Cancel => self.cancel,
        }
    }
}

/// 当前帧与上一帧的输入
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    pub current: InputSnapshot,
    pub previous: InputSnapshot,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进入新的一帧
    pub fn advance(&mut self, snapshot: InputSnapshot) {
        self.previous = self.current;
        self.current = snapshot;
    }

    /// 本帧刚按下
    pub fn just_pressed(&self, button: Button) -> bool {
        self.current.button(button) && !self.previous.button(button)
    }

    /// 鼠标本帧是否移动（两帧位置都可用且不相等）
    pub fn pointer_moved(&self) -> bool {
        match (self.current.pointer, self.previous.pointer) {
            (Some(cur), Some(prev)) => cur != prev,
            _ => false,
        }
    }

    /// 按住鼠标时的纵向拖动距离（当前 y - 上一帧 y）
    pub fn drag_delta(&self) -> f32 {
        if !self.current.pointer_down {
            return 0.0;
        }
        match (self.current.pointer, self.previous.pointer) {
            (Some(cur), Some(prev)) => cur.y - prev.y,
            _ => 0.0,
        }
    }

    pub fn wheel_delta(&self) -> f32 {
        self.current.wheel_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_pressed_is_edge_triggered() {
        let mut input = InputState::new();
        input.advance(InputSnapshot {
            down: true,
            ..Default::default()
        });
        assert!(input.just_pressed(Button::Down));

        // 持续按住不再触发
        input.advance(InputSnapshot {
            down: true,
            ..Default::default()
        });
        assert!(!input.just_pressed(Button::Down));
        assert!(!input.just_pressed(Button::Up));
    }

    #[test]
    fn test_drag_delta_requires_button() {
        let mut input = InputState::new();
        input.advance(InputSnapshot {
            pointer: Some(PointerPos::new(10.0, 100.0)),
            ..Default::default()
        });
        input.advance(InputSnapshot {
            pointer: Some(PointerPos::new(10.0, 130.0)),
            ..Default::default()
        });
        assert!(input.pointer_moved());
        assert_eq!(input.drag_delta(), 0.0);

        input.advance(InputSnapshot {
            pointer: Some(PointerPos::new(10.0, 110.0)),
            pointer_down: true,
            ..Default::default()
        });
        assert_eq!(input.drag_delta(), -20.0);
    }

    #[test]
    fn test_pointer_unavailable() {
        let mut input = InputState::new();
        input.advance(InputSnapshot {
            pointer: Some(PointerPos::new(0.0, 0.0)),
            pointer_down: true,
            ..Default::default()
        });
        input.advance(InputSnapshot {
            pointer: None,
            pointer_down: true,
            ..Default::default()
        });
        assert!(!input.pointer_moved());
        assert_eq!(input.drag_delta(), 0.0);
    }

    #[test]
    fn test_snapshot_deserialize_defaults() {
        let snapshot: InputSnapshot = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(snapshot.ok);
        assert!(!snapshot.cancel);
        assert_eq!(snapshot.pointer, None);
        assert_eq!(snapshot.wheel_delta, 0.0);
    }
}
