//! # Summary Command Module / 摘要命令模块
//!
//! Prints per-file and total statement coverage of an existing profile.
//!
//! 打印已有覆盖率文件的逐文件及总体语句覆盖率。

use anyhow::Result;
use std::path::Path;

use crate::core::profile::CoverageProfile;
use crate::reporting::print_profile_report;

/// Parses `profile` and prints its coverage; fails on a malformed profile.
pub fn execute(profile: &Path) -> Result<()> {
    let parsed = CoverageProfile::load(profile)?;
    print_profile_report(&parsed);
    Ok(())
}
