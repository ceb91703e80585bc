//! # Data Models Module / 数据模型模块
//!
//! This module defines the data structures shared across the step: the
//! failure taxonomy, the pipeline stages, the artifact paths of a run and the
//! final run report.
//!
//! 此模块定义了整个步骤中共享的数据结构：失败分类、流水线阶段、
//! 一次运行的产物路径以及最终的运行报告。

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::profile::CoverageSummary;

/// Environment variable holding the path of the raw (or aggregated) coverage profile.
pub const COVERAGE_REPORT_KEY: &str = "GO_CODE_COVERAGE_REPORT_PATH";
/// Environment variable holding the path of the HTML coverage report.
pub const HTML_REPORT_KEY: &str = "GO_CODE_COVERAGE_HTML_REPORT_PATH";
/// Environment variable holding the path of the JUnit XML report.
pub const JUNIT_REPORT_KEY: &str = "GO_CODE_COVERAGE_JUNIT_REPORT_PATH";

/// File names of the artifacts written into the artifact directory.
pub const COVERAGE_PROFILE_FILE: &str = "cover_profile.out";
pub const HTML_REPORT_FILE: &str = "cover_profile.html";
pub const JUNIT_REPORT_FILE: &str = "cover_profile.xml";
pub const PACKAGE_PROFILE_FILE: &str = "package_cover_profile.out";
pub const TEST_LOG_FILE: &str = "go_test_output.log";

/// Enumerates the possible reasons for a step failure.
/// Every failure is fatal; the reason only makes the diagnostic clearer.
///
/// 枚举步骤失败的可能原因。
/// 所有失败都是致命的；原因仅用于使诊断信息更清晰。
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FailureReason {
    /// A required input, such as the package specifier, is empty.
    /// 必需的输入（例如包说明符）为空。
    MissingConfiguration,
    /// The environment does not satisfy a precondition (e.g. unset deploy dir).
    /// 环境不满足前置条件（例如未设置部署目录）。
    Precondition,
    /// Creating, reading, appending or deleting a file or directory failed.
    /// 创建、读取、追加或删除文件或目录失败。
    FileSystem,
    /// An external tool could not be spawned or exited with a non-zero status.
    /// 外部工具无法启动或以非零状态退出。
    ExternalTool,
    /// The environment export mechanism failed to record a value.
    /// 环境变量导出机制未能记录某个值。
    Export,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureReason::MissingConfiguration => "missing configuration",
            FailureReason::Precondition => "precondition failed",
            FailureReason::FileSystem => "file system error",
            FailureReason::ExternalTool => "external tool failed",
            FailureReason::Export => "export failed",
        };
        f.write_str(label)
    }
}

/// A classified, fatal step failure carried inside an `anyhow::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub reason: FailureReason,
    pub message: String,
}

impl StepFailure {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StepFailure {}

/// Returns the failure reason of an error produced by the step, if it has one.
pub fn failure_reason(err: &anyhow::Error) -> Option<FailureReason> {
    err.downcast_ref::<StepFailure>().map(|f| f.reason)
}

/// Converts any error into a classified [`StepFailure`].
///
/// 将任意错误转换为带分类的 [`StepFailure`]。
pub trait OrFail<T> {
    fn or_fail<F>(self, reason: FailureReason, message: F) -> anyhow::Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> OrFail<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn or_fail<F>(self, reason: FailureReason, message: F) -> anyhow::Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let source: anyhow::Error = e.into();
            anyhow::Error::new(StepFailure::new(
                reason,
                format!("{}: {:#}", message(), source),
            ))
        })
    }
}

/// The linear sequence of states a run walks through.
/// 一次运行所经历的线性状态序列。
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Stage {
    Configured,
    DependencyEnsured,
    WorkspaceReady,
    TestRun,
    Aggregated,
    HtmlReportReady,
    JunitReportReady,
    Published,
}

/// Directories resolved for a run.
///
/// `scratch_dir` only exists for layouts that keep per-package transient
/// profiles or write everything into the OS temp dir. Both paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub scratch_dir: Option<PathBuf>,
    pub artifact_dir: PathBuf,
}

/// Absolute paths of every file a run produces.
/// 一次运行所产生的每个文件的绝对路径。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Final (possibly aggregated) coverage profile / 最终（可能已聚合的）覆盖率文件
    pub coverage_profile: PathBuf,
    /// HTML report generated by `go tool cover` / 由 `go tool cover` 生成的 HTML 报告
    pub html_report: PathBuf,
    /// JUnit XML report / JUnit XML 报告
    pub junit_report: PathBuf,
    /// Transient per-package profile, aggregate layout only / 临时的单包覆盖率文件，仅聚合布局
    pub package_profile: Option<PathBuf>,
    /// Captured `go test` output, when it feeds the JUnit converter / 捕获的 `go test` 输出
    pub test_log: Option<PathBuf>,
}

impl ArtifactPaths {
    /// The file `go test` writes its profile into for each invocation.
    pub fn test_profile_target(&self) -> &Path {
        self.package_profile
            .as_deref()
            .unwrap_or(&self.coverage_profile)
    }
}

/// One value handed to the export mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArtifact {
    pub key: String,
    pub path: PathBuf,
}

/// Summary of a successful run.
/// 一次成功运行的摘要。
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub workspace: Workspace,
    pub artifacts: ArtifactPaths,
    /// Number of `go test` invocations performed.
    pub test_invocations: usize,
    pub published: Vec<PublishedArtifact>,
    /// Coverage totals, when the final profile could be parsed.
    pub coverage: Option<CoverageSummary>,
    pub stage: Stage,
}
