//! # Error 模块
//!
//! 定义 vn-ui 中使用的错误类型。
//!
//! 注意：进入界面时槽位已被占用属于调用方 bug，直接 panic，不在此列。

use thiserror::Error;

/// 音频协作方返回的错误
///
/// 语音播放失败时原样向上传递，列表与回看缓冲不做额外处理。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// 语音文件不存在
    #[error("语音文件未找到: {path}")]
    NotFound { path: String },

    /// 无法解码的音频格式
    #[error("不支持的音频格式: {path} - {message}")]
    Unsupported { path: String, message: String },

    /// 音频设备不可用
    #[error("音频设备错误: {message}")]
    Device { message: String },
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 字段取值无效
    #[error("配置项 '{field}' 的值无效 - {message}")]
    InvalidValue { field: String, message: String },
}

/// vn-ui 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UiError {
    /// 音频错误
    #[error("音频错误: {0}")]
    Audio(#[from] AudioError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type UiResult<T> = Result<T, UiError>;
