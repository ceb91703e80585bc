//! # Coverage Aggregation Module / 覆盖率聚合模块
//!
//! Used by the aggregate layout: after each per-package `go test`, the package
//! profile is appended verbatim to the aggregate profile and then removed.
//! No deduplication is done; packages are assumed to cover disjoint files.
//!
//! 供聚合布局使用：每次单包 `go test` 之后，包覆盖率文件会被原样追加到聚合文件中，
//! 然后删除。不做去重；假定各包覆盖的源文件互不相交。

use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::core::models::{FailureReason, OrFail};

/// Appends `package_profile` to `aggregate` (creating it if absent) and
/// deletes `package_profile`.
///
/// # Returns
/// The number of bytes appended
pub fn append_package_profile(package_profile: &Path, aggregate: &Path) -> Result<usize> {
    let content = fs::read_to_string(package_profile).or_fail(FailureReason::FileSystem, || {
        format!("Failed to read package coverage profile: {}", package_profile.display())
    })?;

    let mut target = OpenOptions::new()
        .create(true)
        .append(true)
        .open(aggregate)
        .or_fail(FailureReason::FileSystem, || {
            format!("Failed to open coverage profile: {}", aggregate.display())
        })?;
    target
        .write_all(content.as_bytes())
        .or_fail(FailureReason::FileSystem, || {
            format!("Failed to append to coverage profile: {}", aggregate.display())
        })?;

    fs::remove_file(package_profile).or_fail(FailureReason::FileSystem, || {
        format!("Failed to remove package coverage profile: {}", package_profile.display())
    })?;

    Ok(content.len())
}
