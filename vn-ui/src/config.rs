//! # Config 模块
//!
//! 界面相关配置项。所有字段都有默认值，配置文件里可以只写需要覆盖的部分。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 界面配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// 视口尺寸
    #[serde(default)]
    pub viewport: ViewportConfig,

    /// 字号（同时用作回看文本行高）
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// 对话回看配置
    #[serde(default)]
    pub backlog: BacklogConfig,
}

/// 视口配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: f32,

    #[serde(default = "default_viewport_height")]
    pub height: f32,
}

/// 对话回看配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogConfig {
    /// 环形缓冲容量（记录条数）
    #[serde(default = "default_backlog_capacity")]
    pub capacity: usize,

    /// 每屏显示的记录数
    #[serde(default = "default_nodes_per_screen")]
    pub nodes_per_screen: usize,
}

// 默认值函数
fn default_font_size() -> f32 {
    24.0
}

fn default_viewport_width() -> f32 {
    640.0
}

fn default_viewport_height() -> f32 {
    480.0
}

fn default_backlog_capacity() -> usize {
    64
}

fn default_nodes_per_screen() -> usize {
    3
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            font_size: default_font_size(),
            backlog: BacklogConfig::default(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            capacity: default_backlog_capacity(),
            nodes_per_screen: default_nodes_per_screen(),
        }
    }
}

impl UiConfig {
    /// 从 JSON 文本解析
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::InvalidValue {
            field: "<root>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &str, message: &str) -> ConfigError {
            ConfigError::InvalidValue {
                field: field.to_string(),
                message: message.to_string(),
            }
        }

        fn positive(value: f32) -> bool {
            value.is_finite() && value > 0.0
        }

        if !positive(self.viewport.width) {
            return Err(invalid("viewport.width", "必须大于 0"));
        }
        if !positive(self.viewport.height) {
            return Err(invalid("viewport.height", "必须大于 0"));
        }
        if !positive(self.font_size) {
            return Err(invalid("font_size", "必须大于 0"));
        }
        if self.backlog.capacity == 0 {
            return Err(invalid("backlog.capacity", "至少为 1"));
        }
        if self.backlog.nodes_per_screen == 0 {
            return Err(invalid("backlog.nodes_per_screen", "至少为 1"));
        }
        Ok(())
    }
}
