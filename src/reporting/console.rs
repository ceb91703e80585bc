//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the step's progress to the console: the resolved
//! configuration, every external command before it runs, exported variables
//! and the final summary. All text goes through i18n.
//!
//! 此模块在控制台打印步骤的进度：解析后的配置、每个外部命令（在运行前）、
//! 导出的变量以及最终摘要。所有文本均经过国际化处理。

use colored::*;
use std::path::Path;

use crate::core::config::StepConfig;
use crate::core::models::{RunReport, Workspace};
use crate::core::profile::{CoverageProfile, CoverageSummary};
use crate::infra::command::ToolCommand;
use crate::infra::t;

/// Prints the resolved configuration.
///
/// # Output Format / 输出格式
/// ```text
/// Configs:
/// - packages: ./...
/// - layout: deploy
/// - deploy dir: /bitrise/deploy
/// - junit source: profile
/// - export: envman
/// ```
pub fn print_config(config: &StepConfig) {
    println!("{}", t!("config.banner").cyan().bold());
    println!("- {}: {}", t!("config.packages"), config.packages.raw().trim());
    println!("- {}: {}", t!("config.layout"), config.layout);
    let deploy_dir = config
        .deploy_dir
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("- {}: {}", t!("config.deploy_dir"), deploy_dir);
    println!("- {}: {}", t!("config.junit_source"), config.junit_source);
    println!("- {}: {}", t!("config.export"), config.export);
}

/// Prints a command line the way a shell prompt would show it.
pub fn print_command(cmd: &ToolCommand) {
    println!("{} {}", "$".dimmed(), cmd.printable());
}

pub fn print_workspace(workspace: &Workspace) {
    if let Some(scratch) = &workspace.scratch_dir {
        println!(
            "{}",
            t!("run.scratch_dir", path = scratch.display()).dimmed()
        );
    }
    println!(
        "{}",
        t!("run.artifact_dir", path = workspace.artifact_dir.display()).dimmed()
    );
}

/// Announces a successfully exported variable.
pub fn print_done(key: &str, path: &Path) {
    println!(
        "{}",
        t!("run.artifact_exported", key = key, path = path.display()).green()
    );
}

pub fn print_warning(message: &str) {
    println!("{} {}", "warning:".yellow().bold(), message.yellow());
}

pub fn print_coverage(summary: &CoverageSummary) {
    println!(
        "\n{}",
        t!("run.total_coverage", coverage = summary).bold()
    );
}

/// Prints the end-of-run summary.
///
/// 打印运行结束时的摘要。
pub fn print_run_summary(report: &RunReport) {
    println!("\n{}", t!("summary.banner").bold());
    println!(
        "  - {:<36} {}",
        t!("summary.invocations"),
        report.test_invocations
    );
    if let Some(coverage) = &report.coverage {
        println!("  - {:<36} {}", t!("summary.coverage"), coverage);
    }
    for artifact in &report.published {
        println!("  - {:<36} {}", artifact.key, artifact.path.display());
    }
    println!("\n{}", t!("summary.success").green().bold());
}

/// Prints per-file and total coverage of a profile, like `go tool cover -func`.
///
/// # Output Format / 输出格式
/// ```text
/// mode: atomic
/// example.com/pkg/a.go                                   75.0% (3/4)
/// total                                                  75.0% (3/4)
/// ```
pub fn print_profile_report(profile: &CoverageProfile) {
    println!("{}", format!("mode: {}", profile.mode).dimmed());
    for (file, summary) in profile.file_summaries() {
        println!(
            "{:<60} {:>6.1}% ({}/{})",
            file,
            summary.percent(),
            summary.covered,
            summary.statements
        );
    }
    let total = profile.summary();
    let line = format!(
        "{:<60} {:>6.1}% ({}/{})",
        t!("summary.total"),
        total.percent(),
        total.covered,
        total.statements
    );
    println!("{}", line.bold());
}
