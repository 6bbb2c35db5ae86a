//! # host-cli
//!
//! 无窗口宿主：读取对话脚本与输入轨迹，逐帧驱动引擎，输出统计。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p host-cli -- --script demos/dialogue.json --trace demos/trace.json
//! cargo run -p host-cli -- --config demos/config.json \
//!     --script demos/dialogue.json --trace demos/trace.json --dump
//! ```

mod backend;
mod config;
mod replay;
mod script;
mod trace;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use vn_ui::Engine;

use backend::HeadlessBackend;
use config::AppConfig;
use replay::Replay;
use script::DialogueScript;

#[derive(Parser, Debug)]
#[command(name = "host-cli")]
#[command(about = "无窗口宿主 - 按输入轨迹回放对话与回看界面")]
#[command(version)]
struct Args {
    /// 配置文件（默认：config.json，不存在时使用默认配置）
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 对话脚本（JSON）
    #[arg(short, long)]
    script: PathBuf,

    /// 输入轨迹（JSON）
    #[arg(short, long)]
    trace: PathBuf,

    /// 语音目录，覆盖配置文件
    #[arg(long)]
    voice_dir: Option<PathBuf>,

    /// 日志级别，覆盖配置文件
    #[arg(long)]
    log_level: Option<String>,

    /// 把每个绘制调用以 JSON 行输出到 stdout
    #[arg(long)]
    dump: bool,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("host-cli error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn real_main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load_or_default(&args.config)?;
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &args.voice_dir {
        config.voice_dir = dir.clone();
    }

    init_logging(&config.log_level)?;
    if !args.config.exists() {
        warn!(path = %args.config.display(), "配置文件不存在，使用默认配置");
    }

    let script = DialogueScript::load(&args.script)?;
    let frames = trace::load_trace(&args.trace)?;

    let backend = HeadlessBackend::new(&config.voice_dir);
    info!(
        script = %args.script.display(),
        entries = script.entry_count(),
        frames = frames.len(),
        voice_dir = %backend.voice_dir().display(),
        "开始回放"
    );

    let engine = Engine::new(config.ui, backend);
    let dump = args.dump.then(io::stdout);
    let summary = Replay::new(engine, script, dump).run(&frames)?;

    if args.dump {
        eprintln!("{summary}");
    } else {
        println!("{summary}");
    }
    Ok(())
}

/// 初始化日志，输出到 stderr
fn init_logging(level: &str) -> anyhow::Result<()> {
    let level: tracing::Level = level
        .parse()
        .with_context(|| format!("无效的日志级别: {level}"))?;

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    Ok(())
}
