//! # Configuration Module / 配置模块
//!
//! Builds the single [`StepConfig`] a run works from. Values are layered, from
//! lowest to highest precedence: built-in defaults, an optional TOML config
//! file, process environment variables, and command-line flags.
//!
//! 构建一次运行所使用的唯一 [`StepConfig`]。配置按优先级从低到高分层：
//! 内置默认值、可选的 TOML 配置文件、进程环境变量以及命令行参数。

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::models::{FailureReason, StepFailure};
use crate::infra::export::ExportTarget;

/// Environment variable holding the package specifier.
pub const PACKAGES_ENV: &str = "packages";
/// Environment variable holding the pipeline's deploy directory.
pub const DEPLOY_DIR_ENV: &str = "BITRISE_DEPLOY_DIR";
/// Environment variable selecting the workspace layout.
pub const LAYOUT_ENV: &str = "coverage_layout";

/// One or more Go package paths (or patterns such as `./...`) to test.
///
/// 一个或多个要测试的 Go 包路径（或 `./...` 之类的模式）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    raw: String,
    elements: Vec<String>,
}

impl PackageSpec {
    /// Parses a specifier. Elements are separated by newlines or whitespace.
    /// Returns a `MissingConfiguration` failure for an empty or blank input.
    pub fn parse(raw: &str) -> Result<Self> {
        let elements: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
        if elements.is_empty() {
            return Err(StepFailure::new(
                FailureReason::MissingConfiguration,
                format!("Required input not defined: {PACKAGES_ENV}"),
            )
            .into());
        }
        Ok(Self {
            raw: raw.to_string(),
            elements,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }
}

/// Where scratch files and final artifacts are written.
/// 临时文件和最终产物的写入位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspaceLayout {
    /// Everything in a unique directory under the OS temp dir; one `go test` call.
    /// Needs nothing but the package specifier.
    /// 所有内容写入系统临时目录下的唯一子目录；只调用一次 `go test`。只需要包说明符。
    #[default]
    Temp,
    /// Everything directly in the deploy directory; one `go test` call.
    /// 所有内容直接写入部署目录；只调用一次 `go test`。
    Deploy,
    /// One `go test` call per package, profiles merged into the deploy directory.
    /// 每个包调用一次 `go test`，覆盖率文件合并到部署目录。
    Aggregate,
}

impl WorkspaceLayout {
    pub fn requires_deploy_dir(self) -> bool {
        matches!(self, WorkspaceLayout::Deploy | WorkspaceLayout::Aggregate)
    }

    pub fn uses_scratch_dir(self) -> bool {
        matches!(self, WorkspaceLayout::Temp | WorkspaceLayout::Aggregate)
    }
}

impl FromStr for WorkspaceLayout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "temp" => Ok(WorkspaceLayout::Temp),
            "deploy" => Ok(WorkspaceLayout::Deploy),
            "aggregate" => Ok(WorkspaceLayout::Aggregate),
            other => bail!("unknown layout '{other}' (expected temp, deploy or aggregate)"),
        }
    }
}

impl fmt::Display for WorkspaceLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkspaceLayout::Temp => "temp",
            WorkspaceLayout::Deploy => "deploy",
            WorkspaceLayout::Aggregate => "aggregate",
        })
    }
}

/// What is fed into `go-junit-report` on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JunitSource {
    /// The raw coverage profile.
    #[default]
    Profile,
    /// The verbose `go test` output captured while streaming it.
    TestOutput,
}

impl FromStr for JunitSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "profile" => Ok(JunitSource::Profile),
            "test-output" => Ok(JunitSource::TestOutput),
            other => bail!("unknown junit source '{other}' (expected profile or test-output)"),
        }
    }
}

impl fmt::Display for JunitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JunitSource::Profile => "profile",
            JunitSource::TestOutput => "test-output",
        })
    }
}

/// Programs invoked by the step.
/// 步骤所调用的程序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// The `go` binary.
    pub go: String,
    /// The JUnit converter binary.
    pub junit_report: String,
    /// Module path handed to `go install` when the converter is missing.
    pub junit_report_package: String,
    /// Bitrise's environment manager, used by the `envman` export target.
    pub envman: String,
    /// Path lookup command.
    pub which: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            go: "go".to_string(),
            junit_report: "go-junit-report".to_string(),
            junit_report_package: "github.com/jstemmer/go-junit-report@latest".to_string(),
            envman: "envman".to_string(),
            which: "which".to_string(),
        }
    }
}

/// The on-disk TOML config file. Every key is optional.
///
/// 磁盘上的 TOML 配置文件。所有键都是可选的。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub packages: Option<String>,
    #[serde(default)]
    pub layout: Option<WorkspaceLayout>,
    #[serde(default)]
    pub deploy_dir: Option<String>,
    #[serde(default)]
    pub junit_source: Option<JunitSource>,
    #[serde(default)]
    pub export: Option<String>,
    #[serde(default)]
    pub install_missing_tools: Option<bool>,
    #[serde(default)]
    pub tools: ToolPaths,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub packages: Option<String>,
    pub layout: Option<WorkspaceLayout>,
    pub deploy_dir: Option<PathBuf>,
    pub junit_source: Option<JunitSource>,
    pub export: Option<ExportTarget>,
    pub no_install: bool,
}

/// The fully resolved configuration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepConfig {
    pub packages: PackageSpec,
    pub layout: WorkspaceLayout,
    /// Set whenever the layout requires it; may also be set for `temp`.
    pub deploy_dir: Option<PathBuf>,
    pub junit_source: JunitSource,
    pub export: ExportTarget,
    pub install_missing_tools: bool,
    pub tools: ToolPaths,
}

impl StepConfig {
    /// Resolves the configuration from its layers.
    ///
    /// `env` looks up an environment variable; pass `|k| std::env::var(k).ok()`
    /// for the real process environment.
    ///
    /// 从各配置层解析出最终配置。
    /// `env` 用于查找环境变量；对真实进程环境请传入 `|k| std::env::var(k).ok()`。
    pub fn resolve<F>(file: ConfigFile, env: F, overrides: Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let raw_packages = overrides
            .packages
            .or_else(|| non_empty(PACKAGES_ENV))
            .or(file.packages)
            .unwrap_or_default();
        let packages = PackageSpec::parse(&raw_packages)?;

        let layout = match overrides.layout {
            Some(layout) => layout,
            None => match non_empty(LAYOUT_ENV) {
                Some(value) => value
                    .parse()
                    .with_context(|| format!("Invalid value for {LAYOUT_ENV}"))?,
                None => file.layout.unwrap_or_default(),
            },
        };

        let deploy_dir = match overrides.deploy_dir {
            Some(dir) => Some(dir),
            None => non_empty(DEPLOY_DIR_ENV)
                .or(file.deploy_dir)
                .map(|dir| expand_path(&dir))
                .transpose()?,
        };

        if layout.requires_deploy_dir() && deploy_dir.is_none() {
            return Err(StepFailure::new(
                FailureReason::Precondition,
                format!("{DEPLOY_DIR_ENV} is not set, but the '{layout}' layout requires it"),
            )
            .into());
        }

        let export = match overrides.export {
            Some(target) => target,
            None => match file.export {
                Some(value) => value.parse().context("Invalid 'export' in config file")?,
                None => ExportTarget::default(),
            },
        };

        Ok(StepConfig {
            packages,
            layout,
            deploy_dir,
            junit_source: overrides
                .junit_source
                .or(file.junit_source)
                .unwrap_or_default(),
            export,
            install_missing_tools: !overrides.no_install
                && file.install_missing_tools.unwrap_or(true),
            tools: file.tools,
        })
    }
}

/// Expands `~` and `$VAR` references in a user-supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand path: {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Reads and parses a TOML config file.
///
/// # Arguments
/// * `path` - Path to the config file
///
/// # Returns
/// The parsed [`ConfigFile`], or an error naming the file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
