//! # Config 模块
//!
//! 无窗口宿主的配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use vn_ui::UiConfig;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// 界面配置
    #[serde(default)]
    pub ui: UiConfig,

    /// 语音文件目录
    #[serde(default = "default_voice_dir")]
    pub voice_dir: PathBuf,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_voice_dir() -> PathBuf {
    PathBuf::from("voice")
}

pub fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ui: UiConfig::default(),
            voice_dir: default_voice_dir(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 读取并校验配置文件
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("配置文件读取失败: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("配置文件解析失败: {}", path.display()))?;
        config
            .ui
            .validate()
            .with_context(|| format!("配置文件校验失败: {}", path.display()))?;
        Ok(config)
    }

    /// 文件不存在时返回默认配置，存在但无效时报错
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }
}
