//! # xtask - 开发辅助工具
//!
//! ## 命令
//!
//! - `check-all`: 依次运行格式检查、clippy、全部测试，任一步失败即停止
//! - `replay-check`: 检查回放用例（JSON 语法）并逐个用 host-cli 回放

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::Context;
use walkdir::WalkDir;

/// `check-all` 的门禁步骤：（说明，cargo 参数）
const GATES: &[(&str, &[&str])] = &[
    ("格式检查", &["fmt", "--all", "--", "--check"]),
    ("clippy", &["clippy", "--workspace", "--all-targets"]),
    ("测试", &["test", "--workspace"]),
];

fn cargo(args: &[&str]) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(args);
    cmd
}

/// 运行一个子进程步骤，非零退出视为失败
fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status().with_context(|| step.to_string())?;
    anyhow::ensure!(status.success(), "{step} 失败（{status}）");
    Ok(())
}

fn check_all() -> anyhow::Result<()> {
    for (step, args) in GATES {
        run(step, &mut cargo(args))?;
    }
    eprintln!("\n全部门禁通过");
    Ok(())
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("xtask error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("check-all") => check_all(),
        Some("replay-check") => replay_check(args.next().as_deref()),
        None | Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }
        Some(other) => anyhow::bail!("未知的 xtask 子命令: {other}"),
    }
}

fn print_help() {
    eprintln!(
        r#"用法: cargo xtask <命令>

命令:
  check-all               fmt --check、clippy、test 门禁
  replay-check [目录]     回放目录下的输入轨迹（默认 demos/）

回放用例:
  每个 trace*.json 是一条输入轨迹，同目录需有 dialogue.json，
  可选 config.json。

别名（.cargo/config.toml）: cargo check-all, cargo replay-check"#
    );
}

//=============================================================================
// replay-check 命令实现
//=============================================================================

/// 一条回放用例
struct ReplayCase {
    trace: PathBuf,
    script: PathBuf,
    config: Option<PathBuf>,
}

/// 执行回放检查
fn replay_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or("demos"));
    if !root.is_dir() {
        anyhow::bail!(
            "用例目录不存在: {}\n请在 workspace 根目录运行，或指定用例目录",
            root.display()
        );
    }

    let json_files = collect_files(&root, is_json)?;
    let mut syntax_errors = 0;
    for file in &json_files {
        if let Err(e) = check_json(file) {
            eprintln!("[ERROR] {}: {e:#}", file.display());
            syntax_errors += 1;
        }
    }
    if syntax_errors > 0 {
        anyhow::bail!("{syntax_errors} 个 JSON 文件无法解析");
    }

    let cases = collect_cases(&json_files)?;
    if cases.is_empty() {
        eprintln!("未找到输入轨迹（trace*.json）");
        return Ok(());
    }

    eprintln!("==> 回放 {} 条用例...", cases.len());

    let mut failed = 0;
    for case in &cases {
        let mut cmd = cargo(&["run", "-q", "-p", "host-cli", "--"]);
        if let Some(config) = &case.config {
            cmd.arg("--config").arg(config);
        }
        cmd.arg("--script").arg(&case.script);
        cmd.arg("--trace").arg(&case.trace);

        if let Err(e) = run(&format!("replay {}", case.trace.display()), &mut cmd) {
            eprintln!("[ERROR] {e:#}");
            failed += 1;
        }
    }

    eprintln!("─────────────────────────────────────────────────────");
    if failed > 0 {
        eprintln!("❌ {} / {} 条用例失败", failed, cases.len());
        anyhow::bail!("回放检查失败");
    }
    eprintln!("✅ {} 条用例全部通过", cases.len());
    Ok(())
}

/// 递归收集满足条件的文件（排序后返回）
fn collect_files(dir: &Path, filter: impl Fn(&Path) -> bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() && filter(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn check_json(file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)?;
    serde_json::from_str::<serde_json::Value>(&content)?;
    Ok(())
}

/// 由 trace*.json 及其同目录文件组成用例
fn collect_cases(json_files: &[PathBuf]) -> anyhow::Result<Vec<ReplayCase>> {
    let mut cases = Vec::new();
    for trace in json_files {
        let is_trace = trace
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("trace"));
        if !is_trace {
            continue;
        }

        let dir = trace.parent().unwrap_or_else(|| Path::new("."));
        let script = dir.join("dialogue.json");
        if !script.is_file() {
            anyhow::bail!("{} 缺少同目录的 dialogue.json", trace.display());
        }
        let config = Some(dir.join("config.json")).filter(|p| p.is_file());

        cases.push(ReplayCase {
            trace: trace.clone(),
            script,
            config,
        });
    }
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_cases_pairs_sibling_files() {
        let dir = tempfile::tempdir().unwrap();
        let case_dir = dir.path().join("intro");
        std::fs::create_dir(&case_dir).unwrap();
        std::fs::write(case_dir.join("dialogue.json"), "[]").unwrap();
        std::fs::write(case_dir.join("trace.json"), "[]").unwrap();
        std::fs::write(case_dir.join("trace_wheel.json"), "[]").unwrap();

        let files = collect_files(dir.path(), is_json).unwrap();
        assert_eq!(files.len(), 3);

        let cases = collect_cases(&files).unwrap();
        assert_eq!(cases.len(), 2);
        let script = case_dir.join("dialogue.json");
        assert!(cases.iter().all(|c| c.script == script));
        assert!(cases.iter().all(|c| c.config.is_none()));
    }

    #[test]
    fn test_collect_cases_requires_dialogue() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("trace.json"), "[]").unwrap();

        let files = collect_files(dir.path(), |_| true).unwrap();
        assert!(collect_cases(&files).is_err());
    }

    #[test]
    fn test_check_json_reports_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "[{").unwrap();
        assert!(check_json(&bad).is_err());
    }
}
