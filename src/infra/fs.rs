//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for file system operations,
//! such as creating the scratch directory, the deploy directory and
//! the empty artifact files a run writes into.
//!
//! 此模块提供文件系统操作的实用功能，
//! 如创建临时目录、部署目录以及一次运行要写入的空产物文件。

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::models::{FailureReason, OrFail};

/// Prefix of the scratch directory created under the OS temp dir.
pub const TEMP_DIR_PREFIX: &str = "go-test-coverage";

/// Creates a uniquely named directory under the OS temp dir and keeps it.
///
/// The directory is intentionally not removed when the process exits; the CI
/// system (or the next run) owns it afterwards.
///
/// # Returns
/// The absolute path of the new directory
pub fn create_scratch_dir() -> Result<PathBuf> {
    let temp_dir = tempfile::Builder::new()
        .prefix(TEMP_DIR_PREFIX)
        .tempdir()
        .or_fail(FailureReason::FileSystem, || {
            "Failed to create tmp dir for code coverage reports".to_string()
        })?;

    absolute_path(&temp_dir.keep())
}

/// Creates a directory and its parents if missing, with a permissive mode on
/// Unix, and returns its canonical path.
///
/// # Arguments
/// * `path` - Directory to create
///
/// # Returns
/// The canonicalized absolute path
pub fn ensure_dir(path: &Path) -> Result<PathBuf> {
    if !is_directory(path) {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o777);
        }
        builder.create(path).or_fail(FailureReason::FileSystem, || {
            format!("Failed to create directory: {}", path.display())
        })?;
    }

    absolute_path(path)
}

/// Creates (or truncates) a zero-length file.
///
/// Used before a long-running tool writes to `path`, so permission or path
/// errors surface immediately.
pub fn create_empty_file(path: &Path) -> Result<()> {
    fs::File::create(path).or_fail(FailureReason::FileSystem, || {
        format!("Failed to create file: {}", path.display())
    })?;
    Ok(())
}

/// Checks if a path exists and is a directory.
///
/// # Arguments
/// * `path` - Path to check
///
/// # Returns
/// `true` if the path exists and is a directory, `false` otherwise
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// Gets the absolute path from a potentially relative path.
///
/// # Arguments
/// * `path` - Path to canonicalize
///
/// # Returns
/// Canonicalized absolute path, or an error if the path doesn't exist
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).or_fail(FailureReason::FileSystem, || {
        format!("Failed to resolve path: {}", path.display())
    })
}
