//! # Environment Export Module / 环境变量导出模块
//!
//! Persists key/value pairs so that later pipeline steps can read them.
//!
//! 持久化键值对，以便后续流水线步骤读取。

use anyhow::{bail, Context, Result};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use crate::infra::command::{ensure_success, Executor, ToolCommand};

/// The mechanism used to hand values to downstream steps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportTarget {
    /// `envman add --key KEY --value VALUE`
    #[default]
    Envman,
    /// Print `KEY=VALUE` on stdout.
    Stdout,
    /// Append `KEY=VALUE` lines to a file, like `$GITHUB_ENV`.
    File(PathBuf),
}

impl FromStr for ExportTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "envman" => Ok(ExportTarget::Envman),
            "stdout" => Ok(ExportTarget::Stdout),
            _ => match s.strip_prefix("file:") {
                Some(path) if !path.is_empty() => {
                    Ok(ExportTarget::File(crate::core::config::expand_path(path)?))
                }
                _ => bail!("unknown export target '{s}' (expected envman, stdout or file:<path>)"),
            },
        }
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportTarget::Envman => f.write_str("envman"),
            ExportTarget::Stdout => f.write_str("stdout"),
            ExportTarget::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// Persists one value through the configured target.
///
/// # Arguments
/// * `executor` - Runs `envman` for the envman target
/// * `target` - Where the value goes
/// * `envman` - Program name of the environment manager
/// * `key` / `value` - The pair to persist
pub async fn export_value<E: Executor>(
    executor: &E,
    target: &ExportTarget,
    envman: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    match target {
        ExportTarget::Envman => {
            let cmd = ToolCommand::new(envman)
                .args(["add", "--key", key, "--value", value]);
            let outcome = executor.capture(&cmd).await?;
            ensure_success(&cmd, &outcome)?;
        }
        ExportTarget::Stdout => {
            println!("{key}={value}");
        }
        ExportTarget::File(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open env file: {}", path.display()))?;
            writeln!(file, "{key}={value}")
                .with_context(|| format!("Failed to write env file: {}", path.display()))?;
        }
    }
    Ok(())
}
