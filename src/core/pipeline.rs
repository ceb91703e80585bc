//! # Step Pipeline Module / 步骤流水线模块
//!
//! This module drives a run from a resolved [`StepConfig`] to published
//! artifacts. The stages run strictly in order; the first failure aborts the
//! run and nothing after it is executed.
//!
//! 此模块将一次运行从已解析的 [`StepConfig`] 推进到已发布的产物。
//! 各阶段严格按顺序执行；第一个失败会中止运行，之后的步骤都不会执行。
//!
//! ```text
//! Configured -> DependencyEnsured -> WorkspaceReady -> [TestRun -> Aggregated]*
//!            -> HtmlReportReady -> JunitReportReady -> Published
//! ```

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::core::aggregate::append_package_profile;
use crate::core::config::{JunitSource, StepConfig, WorkspaceLayout};
use crate::core::models::{
    failure_reason, ArtifactPaths, FailureReason, OrFail, PublishedArtifact, RunReport, Stage, StepFailure,
    COVERAGE_REPORT_KEY, HTML_REPORT_KEY, JUNIT_REPORT_KEY,
};
use crate::core::profile::{CoverageProfile, CoverageSummary};
use crate::core::workspace::{prepare_artifacts, prepare_workspace, reset_package_profile};
use crate::infra::command::{ensure_success, CommandOutcome, Executor, ToolCommand};
use crate::infra::export::export_value;
use crate::infra::t;
use crate::reporting::console;

/// Builds the `go test` invocation for the given packages.
///
/// # Arguments
/// * `go` - The `go` program
/// * `profile` - Where the coverage profile is written
/// * `packages` - Package paths or patterns, appended in order
pub fn go_test_command(go: &str, profile: &Path, packages: &[String]) -> ToolCommand {
    ToolCommand::new(go)
        .arg("test")
        .arg("-v")
        .arg("-race")
        .arg(format!("-coverprofile={}", profile.display()))
        .arg("-covermode=atomic")
        .args(packages.iter().cloned())
}

/// Builds the `go tool cover -html` invocation.
pub fn html_report_command(go: &str, profile: &Path, output: &Path) -> ToolCommand {
    ToolCommand::new(go)
        .args(["tool", "cover"])
        .arg(format!("-html={}", profile.display()))
        .arg("-o")
        .arg(output.display().to_string())
}

/// Runs the whole step with the given executor.
pub struct Pipeline<'a, E: Executor> {
    config: &'a StepConfig,
    executor: &'a E,
    stage: Stage,
}

impl<'a, E: Executor> Pipeline<'a, E> {
    pub fn new(config: &'a StepConfig, executor: &'a E) -> Self {
        Self {
            config,
            executor,
            stage: Stage::Configured,
        }
    }

    /// Executes every stage in order.
    ///
    /// # Returns
    /// A [`RunReport`] on success; the first failure otherwise
    pub async fn run(mut self) -> Result<RunReport> {
        self.ensure_junit_converter().await?;
        self.stage = Stage::DependencyEnsured;

        println!("\n{}", t!("run.preparing_workspace").cyan());
        let workspace = prepare_workspace(self.config)?;
        let artifacts = prepare_artifacts(self.config, &workspace)?;
        self.stage = Stage::WorkspaceReady;
        console::print_workspace(&workspace);

        println!("\n{}", t!("run.running_go_test").cyan());
        let test_invocations = self.run_tests(&artifacts).await?;

        let coverage = self.inspect_profile(&artifacts.coverage_profile);

        self.render_html(&artifacts).await?;
        self.stage = Stage::HtmlReportReady;

        self.render_junit(&artifacts).await?;
        self.stage = Stage::JunitReportReady;

        let published = self.publish(&artifacts).await?;
        self.stage = Stage::Published;

        Ok(RunReport {
            workspace,
            artifacts,
            test_invocations,
            published,
            coverage,
            stage: self.stage,
        })
    }

    /// Makes sure the JUnit converter is on the search path, installing it if allowed.
    async fn ensure_junit_converter(&self) -> Result<()> {
        let tools = &self.config.tools;
        if self.is_installed(&tools.junit_report).await {
            return Ok(());
        }

        if !self.config.install_missing_tools {
            return Err(StepFailure::new(
                FailureReason::Precondition,
                format!("{} is not installed and installation is disabled", tools.junit_report),
            )
            .into());
        }

        let cmd = ToolCommand::new(&tools.go)
            .arg("install")
            .arg(&tools.junit_report_package);
        println!(
            "\n{}",
            t!("run.installing_tool", name = &tools.junit_report).cyan()
        );
        console::print_command(&cmd);

        let outcome = self.invoke(&cmd, self.executor.capture(&cmd)).await?;
        if !outcome.success() {
            return Err(StepFailure::new(
                FailureReason::ExternalTool,
                format!(
                    "failed to install {}: {}",
                    tools.junit_report,
                    outcome.trimmed_output()
                ),
            )
            .into());
        }
        Ok(())
    }

    /// A tool counts as installed when the lookup succeeds with non-empty output.
    async fn is_installed(&self, name: &str) -> bool {
        let cmd = ToolCommand::new(&self.config.tools.which).arg(name);
        match self.executor.capture(&cmd).await {
            Ok(outcome) => outcome.success() && !outcome.trimmed_output().is_empty(),
            Err(_) => false,
        }
    }

    /// Runs `go test` once, or once per package for the aggregate layout.
    ///
    /// # Returns
    /// The number of invocations performed
    async fn run_tests(&mut self, artifacts: &ArtifactPaths) -> Result<usize> {
        let go = &self.config.tools.go;
        let packages = self.config.packages.elements();
        let tee = artifacts.test_log.as_deref();

        if self.config.layout != WorkspaceLayout::Aggregate {
            let cmd = go_test_command(go, &artifacts.coverage_profile, packages);
            self.run_go_test(&cmd, tee).await?;
            self.stage = Stage::TestRun;
            return Ok(1);
        }

        let package_profile = artifacts.test_profile_target().to_path_buf();
        for (i, package) in packages.iter().enumerate() {
            println!(
                "{}",
                t!(
                    "run.testing_package",
                    index = i + 1,
                    total = packages.len(),
                    name = package
                )
                .blue()
            );
            reset_package_profile(&package_profile)?;

            let cmd = go_test_command(go, &package_profile, std::slice::from_ref(package));
            self.run_go_test(&cmd, tee).await?;
            self.stage = Stage::TestRun;

            append_package_profile(&package_profile, &artifacts.coverage_profile)?;
            self.stage = Stage::Aggregated;
        }
        Ok(packages.len())
    }

    async fn run_go_test(&self, cmd: &ToolCommand, tee: Option<&Path>) -> Result<()> {
        console::print_command(cmd);
        let outcome = self.invoke(cmd, self.executor.stream(cmd, tee)).await?;
        ensure_success(cmd, &outcome)
            .map_err(|e| e.context(t!("run.go_test_failed").to_string()))
    }

    /// Parses the final profile and logs its totals. Problems are only warned
    /// about; `go tool cover` stays the authority on the format.
    fn inspect_profile(&self, profile: &Path) -> Option<CoverageSummary> {
        match CoverageProfile::load(profile) {
            Ok(parsed) => {
                let summary = parsed.summary();
                console::print_coverage(&summary);
                Some(summary)
            }
            Err(e) => {
                console::print_warning(&format!(
                    "{}: {:#}",
                    t!("run.profile_unreadable"),
                    e
                ));
                None
            }
        }
    }

    async fn render_html(&self, artifacts: &ArtifactPaths) -> Result<()> {
        let cmd = html_report_command(
            &self.config.tools.go,
            &artifacts.coverage_profile,
            &artifacts.html_report,
        );
        println!("\n{}", t!("run.generating_html").cyan());
        console::print_command(&cmd);
        let outcome = self.invoke(&cmd, self.executor.stream(&cmd, None)).await?;
        ensure_success(&cmd, &outcome)
    }

    async fn render_junit(&self, artifacts: &ArtifactPaths) -> Result<()> {
        let source = match (self.config.junit_source, &artifacts.test_log) {
            (JunitSource::TestOutput, Some(log)) => log.as_path(),
            _ => artifacts.coverage_profile.as_path(),
        };
        let cmd = ToolCommand::new(&self.config.tools.junit_report);

        println!("\n{}", t!("run.generating_junit").cyan());
        println!(
            "$ {} < {} > {}",
            cmd.printable(),
            source.display(),
            artifacts.junit_report.display()
        );
        let outcome = self
            .invoke(&cmd, self.executor.pipe(&cmd, source, &artifacts.junit_report))
            .await?;
        ensure_success(&cmd, &outcome)
    }

    /// Exports every artifact path in order, stopping at the first failure.
    async fn publish(&self, artifacts: &ArtifactPaths) -> Result<Vec<PublishedArtifact>> {
        let entries = [
            (COVERAGE_REPORT_KEY, &artifacts.coverage_profile),
            (HTML_REPORT_KEY, &artifacts.html_report),
            (JUNIT_REPORT_KEY, &artifacts.junit_report),
        ];

        let mut published = Vec::with_capacity(entries.len());
        for (key, path) in entries {
            let value = path.display().to_string();
            export_value(
                self.executor,
                &self.config.export,
                &self.config.tools.envman,
                key,
                &value,
            )
            .await
            .or_fail(FailureReason::Export, || format!("Failed to export {key}={value}"))?;

            console::print_done(key, path);
            published.push(PublishedArtifact {
                key: key.to_string(),
                path: path.clone(),
            });
        }
        Ok(published)
    }

    /// Awaits an executor call. Unclassified errors (e.g. a failed spawn)
    /// become tool failures; classified ones, such as a tee log that cannot
    /// be written, keep their reason.
    async fn invoke(
        &self,
        cmd: &ToolCommand,
        call: impl std::future::Future<Output = Result<CommandOutcome>>,
    ) -> Result<CommandOutcome> {
        match call.await {
            Err(e) if failure_reason(&e).is_none() => {
                Err(e).or_fail(FailureReason::ExternalTool, || {
                    format!("Failed to run `{}`", cmd.program)
                })
            }
            other => other,
        }
    }
}

/// Convenience wrapper: runs the pipeline and returns its report.
pub async fn run_step<E: Executor>(config: &StepConfig, executor: &E) -> Result<RunReport> {
    Pipeline::new(config, executor).run().await
}
