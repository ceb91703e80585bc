//! # Workspace Preparation Module / 工作区准备模块
//!
//! Resolves the directories of a run for the selected layout and
//! pre-creates the files the test command writes into.
//!
//! 根据所选布局解析一次运行的目录，并预先创建测试命令要写入的文件。

use anyhow::Result;
use std::path::Path;

use crate::core::config::{JunitSource, StepConfig, WorkspaceLayout};
use crate::core::models::{
    ArtifactPaths, FailureReason, StepFailure, Workspace, COVERAGE_PROFILE_FILE, HTML_REPORT_FILE,
    JUNIT_REPORT_FILE, PACKAGE_PROFILE_FILE, TEST_LOG_FILE,
};
use crate::infra::fs;

/// Resolves and creates the directories for `config.layout`.
///
/// - `temp`: one fresh scratch dir holds everything.
/// - `deploy`: the deploy dir holds everything.
/// - `aggregate`: package profiles go to a fresh scratch dir, the rest to the deploy dir.
pub fn prepare_workspace(config: &StepConfig) -> Result<Workspace> {
    let scratch_dir = if config.layout.uses_scratch_dir() {
        Some(fs::create_scratch_dir()?)
    } else {
        None
    };

    let artifact_dir = match (config.layout, &scratch_dir) {
        (WorkspaceLayout::Temp, Some(scratch)) => scratch.clone(),
        _ => {
            let deploy_dir = config.deploy_dir.as_deref().ok_or_else(|| {
                StepFailure::new(
                    FailureReason::Precondition,
                    format!("The '{}' layout requires a deploy directory", config.layout),
                )
            })?;
            fs::ensure_dir(deploy_dir)?
        }
    };

    Ok(Workspace {
        scratch_dir,
        artifact_dir,
    })
}

/// Computes the artifact paths and pre-creates the ones a tool writes into.
///
/// The final profile is truncated, so re-running in the same deploy dir
/// never appends to a previous run's aggregate.
///
/// 计算产物路径，并预先创建工具将写入的文件。
/// 最终覆盖率文件会被截断，因此在同一部署目录中重复运行不会追加到上一次运行的聚合结果上。
pub fn prepare_artifacts(config: &StepConfig, workspace: &Workspace) -> Result<ArtifactPaths> {
    let dir = workspace.artifact_dir.as_path();

    let package_profile = match (config.layout, &workspace.scratch_dir) {
        (WorkspaceLayout::Aggregate, Some(scratch)) => Some(scratch.join(PACKAGE_PROFILE_FILE)),
        _ => None,
    };
    let test_log = match config.junit_source {
        JunitSource::TestOutput => Some(dir.join(TEST_LOG_FILE)),
        JunitSource::Profile => None,
    };

    let paths = ArtifactPaths {
        coverage_profile: dir.join(COVERAGE_PROFILE_FILE),
        html_report: dir.join(HTML_REPORT_FILE),
        junit_report: dir.join(JUNIT_REPORT_FILE),
        package_profile,
        test_log,
    };

    fs::create_empty_file(&paths.coverage_profile)?;
    if let Some(log) = &paths.test_log {
        fs::create_empty_file(log)?;
    }
    // The package profile is (re)created right before each invocation.
    Ok(paths)
}

/// Resets the transient package profile before the next `go test` writes to it.
pub fn reset_package_profile(path: &Path) -> Result<()> {
    fs::create_empty_file(path)
}
