//! Subcommand handlers

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use tracing::info;

use crate::runtime::{open_projects, open_registry, Runtime};
use heatrix_core::{Diagnostic, PluginEntry, UiAnchor};
use heatrix_foundation::HostConfig;

/// 보고서 출력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Html,
    Markdown,
}

impl ReportFormat {
    fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Markdown => "md",
        }
    }
}

// ============================================================================
// run
// ============================================================================

/// 시작 → 탭/진단 출력 → 저장
pub fn run(config: HostConfig) -> Result<()> {
    let mut runtime = Runtime::open(config)?;
    let report = runtime.start()?;

    println!("\nHeatrix ({})\n", runtime.host().theme());
    println!("{:<4} {:<24} {:<10}", "TAB", "TITLE", "OWNER");
    println!("{}", "-".repeat(40));
    for (i, tab) in runtime.ui().tabs().iter().enumerate() {
        println!("{:<4} {:<24} {:<10}", i + 1, tab.title, tab.owner);
    }

    if !report.skipped.is_empty() {
        println!("\nDisabled: {}", report.skipped.join(", "));
    }
    print_diagnostics(runtime.host().diagnostics().active());

    runtime.shutdown()
}

fn print_diagnostics<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
    let mut printed = false;
    for d in diagnostics {
        if !printed {
            println!("\nDiagnostics:");
            printed = true;
        }
        println!(
            "  [{}] {} {}: {}",
            d.stage,
            d.at.format("%H:%M:%S"),
            d.plugin.as_deref().unwrap_or("-"),
            d.message
        );
    }
}

// ============================================================================
// report
// ============================================================================

/// 시작 후 통합 보고서 기록 (경로가 없으면 stdout)
pub fn report(config: HostConfig, out: Option<PathBuf>, format: ReportFormat) -> Result<()> {
    let mut runtime = Runtime::open(config)?;
    runtime.start()?;

    let title = runtime.config().resolved_report_title().to_string();
    let doc = runtime.host_mut().generate_report(&title);
    let text = match format {
        ReportFormat::Html => doc.to_html(),
        ReportFormat::Markdown => doc.to_markdown(),
    };

    match out {
        Some(mut path) => {
            if path.extension().is_none() {
                path.set_extension(format.extension());
            }
            std::fs::write(&path, text)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
            println!("Report with {} sections: {}", doc.blocks.len(), path.display());
        }
        None => print!("{}", text),
    }

    print_diagnostics(runtime.host().diagnostics().active());
    runtime.shutdown()
}

// ============================================================================
// plugins
// ============================================================================

/// 레지스트리 목록 (시작 후 상태 포함)
pub fn plugins_list(config: HostConfig) -> Result<()> {
    let mut runtime = Runtime::open(config)?;
    runtime.start()?;
    let entries = runtime.host().entries(runtime.registry());

    if entries.is_empty() {
        println!("No plugins registered.");
    } else {
        println!(
            "\n{:<26} {:<26} {:<12} {:<8} {}",
            "ID", "NAME", "VERSION", "REPORT", "STATUS"
        );
        println!("{}", "-".repeat(90));
        for entry in &entries {
            print_entry(entry);
        }
        println!();
    }

    runtime.shutdown()
}

fn print_entry(entry: &PluginEntry) {
    println!(
        "{:<26} {:<26} {:<12} {:<8} {}",
        entry.id,
        entry.name,
        entry.version.as_deref().unwrap_or("-"),
        if entry.in_report { "yes" } else { "no" },
        entry.status
    );
}

/// 활성화 플래그 변경 후 저장
pub fn plugins_set_enabled(config: HostConfig, id: &str, enabled: bool) -> Result<()> {
    let (registry, _) = open_registry(&config)?;
    if !registry.contains(id) {
        bail!("Unknown plugin '{}'", id);
    }

    registry.set_enabled(id, enabled)?;
    registry.persist()?;

    let state = if enabled { "enabled" } else { "disabled" };
    info!("Plugin {} {}", id, state);
    println!("Plugin '{}' {} (takes effect on next start).", id, state);
    Ok(())
}

// ============================================================================
// projects
// ============================================================================

pub fn projects_list(config: HostConfig) -> Result<()> {
    let projects = open_projects(&config)?;
    let current = projects.current().map(|p| p.id);
    let summaries = projects.list();

    if summaries.is_empty() {
        println!("No projects yet. Use 'heatrix projects create <name>'.");
        return Ok(());
    }

    println!("\n  {:<38} {:<24} {:<17}", "ID", "NAME", "UPDATED");
    println!("{}", "-".repeat(82));
    for p in summaries {
        let marker = if current.as_deref() == Some(p.id.as_str()) { "*" } else { " " };
        println!(
            "{} {:<38} {:<24} {:<17}",
            marker,
            p.id,
            p.name,
            p.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!();
    Ok(())
}

/// 새 프로젝트 생성 (이전 프로젝트에 도구 상태 저장, 새 프로젝트는 기본값)
pub fn projects_create(config: HostConfig, name: &str) -> Result<()> {
    let mut runtime = Runtime::open(config)?;
    runtime.start()?;

    let project = runtime.host_mut().create_project(name)?;
    println!("Created project '{}' ({})", project.name, project.id);

    runtime.shutdown()
}

/// 현재 프로젝트 전환 (실행 중인 도구 상태를 먼저 저장)
pub fn projects_select(config: HostConfig, id: &str) -> Result<()> {
    let mut runtime = Runtime::open(config)?;
    runtime.start()?;

    let restored = runtime.host_mut().switch_project(id)?;
    info!("Restored {} plugin states", restored);

    let name = runtime
        .host()
        .context()
        .projects()
        .current()
        .map(|p| p.name)
        .unwrap_or_default();
    println!("Selected project '{}'", name);

    runtime.shutdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> HostConfig {
        HostConfig::new().data_dir(dir.path())
    }

    #[test]
    fn test_create_keeps_tool_state_per_project() {
        let dir = TempDir::new().unwrap();

        projects_create(config(&dir), "Halle 1").unwrap();
        {
            let projects = open_projects(&config(&dir)).unwrap();
            projects
                .put(
                    "elektrik",
                    serde_json::json!({ "inputs": { "voltage": 400.0, "current": 32.0, "phase": "three" } }),
                )
                .unwrap();
            projects.save().unwrap();
        }

        projects_create(config(&dir), "Halle 2").unwrap();

        let projects = open_projects(&config(&dir)).unwrap();
        let list = projects.list();
        let first = list.iter().find(|p| p.name == "Halle 1").unwrap();
        let current = projects.current_project().unwrap();
        assert_eq!(current.name, "Halle 2");
        assert_eq!(current.plugin_data["elektrik"]["inputs"]["voltage"], 230.0);

        projects.select(&first.id).unwrap();
        assert_eq!(
            projects.get("elektrik").unwrap()["inputs"]["voltage"],
            400.0
        );
    }

    #[test]
    fn test_plugins_list_saves_project_state() {
        let dir = TempDir::new().unwrap();
        {
            let projects = open_projects(&config(&dir)).unwrap();
            projects.create("Halle 1").unwrap();
            assert!(projects.get("isolierung").is_none());
        }

        plugins_list(config(&dir)).unwrap();

        // 종료 시 실행 중인 도구 상태가 기록됨
        let projects = open_projects(&config(&dir)).unwrap();
        assert!(projects.get("isolierung").is_some());
        assert!(projects.get("elektrik").is_some());
    }
}
