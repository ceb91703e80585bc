//! # Coverage Profile Module / 覆盖率文件模块
//!
//! Parses the line-oriented profile written by `go test -coverprofile`:
//!
//! ```text
//! mode: atomic
//! example.com/pkg/file.go:12.34,15.2 3 1
//! ```
//!
//! A profile produced by concatenating several package profiles repeats the
//! `mode:` header; repeated headers are accepted as long as the mode agrees.
//!
//! 解析 `go test -coverprofile` 写出的按行组织的覆盖率文件。
//! 由多个包的覆盖率文件拼接而成的文件会重复 `mode:` 头部；只要模式一致即可接受。

use anyhow::{anyhow, bail, Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const MODE_PREFIX: &str = "mode: ";

/// Coverage counting mode recorded in the profile header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverMode {
    Set,
    Count,
    Atomic,
}

impl FromStr for CoverMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "set" => Ok(CoverMode::Set),
            "count" => Ok(CoverMode::Count),
            "atomic" => Ok(CoverMode::Atomic),
            other => bail!("unknown cover mode '{other}'"),
        }
    }
}

impl fmt::Display for CoverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CoverMode::Set => "set",
            CoverMode::Count => "count",
            CoverMode::Atomic => "atomic",
        })
    }
}

/// One record of a coverage profile: a source range, its statement count and
/// how many times it executed.
///
/// 覆盖率文件中的一条记录：源代码范围、语句数以及执行次数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileBlock {
    pub file: String,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub statements: u64,
    pub count: u64,
}

impl FromStr for ProfileBlock {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        // The file name may itself contain ':' (e.g. Windows drive letters), so
        // split on the last one.
        let (file, rest) = line
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("missing ':' between file name and range"))?;
        if file.is_empty() {
            bail!("empty file name");
        }

        let mut fields = rest.split_whitespace();
        let range = fields.next().ok_or_else(|| anyhow!("missing range"))?;
        let statements = fields
            .next()
            .ok_or_else(|| anyhow!("missing statement count"))?
            .parse::<u64>()
            .context("invalid statement count")?;
        let count = fields
            .next()
            .ok_or_else(|| anyhow!("missing execution count"))?
            .parse::<u64>()
            .context("invalid execution count")?;
        if fields.next().is_some() {
            bail!("unexpected trailing fields");
        }

        let (start, end) = range
            .split_once(',')
            .ok_or_else(|| anyhow!("range '{range}' is not 'start,end'"))?;
        let (start_line, start_col) = parse_position(start)?;
        let (end_line, end_col) = parse_position(end)?;

        Ok(ProfileBlock {
            file: file.to_string(),
            start_line,
            start_col,
            end_line,
            end_col,
            statements,
            count,
        })
    }
}

fn parse_position(pos: &str) -> Result<(u32, u32)> {
    let (line, col) = pos
        .split_once('.')
        .ok_or_else(|| anyhow!("position '{pos}' is not 'line.column'"))?;
    let line = line
        .parse()
        .with_context(|| format!("invalid line in '{pos}'"))?;
    let col = col
        .parse()
        .with_context(|| format!("invalid column in '{pos}'"))?;
    Ok((line, col))
}

/// A parsed coverage profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageProfile {
    pub mode: CoverMode,
    pub blocks: Vec<ProfileBlock>,
}

impl CoverageProfile {
    /// Parses profile text. Errors name the 1-based line that failed.
    ///
    /// 解析覆盖率文本。错误信息会指出出错的行号（从 1 开始）。
    pub fn parse(text: &str) -> Result<Self> {
        let mut mode: Option<CoverMode> = None;
        let mut blocks = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end();
            if line.is_empty() {
                continue;
            }

            if let Some(value) = line.strip_prefix(MODE_PREFIX) {
                let parsed: CoverMode = value
                    .trim()
                    .parse()
                    .with_context(|| format!("line {line_no}"))?;
                match mode {
                    None => mode = Some(parsed),
                    Some(existing) if existing == parsed => {}
                    Some(existing) => bail!(
                        "line {line_no}: mode '{parsed}' conflicts with earlier mode '{existing}'"
                    ),
                }
                continue;
            }

            if mode.is_none() {
                bail!("line {line_no}: expected a 'mode:' header before coverage records");
            }

            let block: ProfileBlock = line
                .parse()
                .with_context(|| format!("line {line_no}: malformed coverage record '{line}'"))?;
            blocks.push(block);
        }

        let mode = mode.ok_or_else(|| anyhow!("profile has no 'mode:' header"))?;
        Ok(CoverageProfile { mode, blocks })
    }

    /// Reads and parses a profile from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read coverage profile: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid coverage profile: {}", path.display()))
    }

    /// Statement coverage over the whole profile.
    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary::from_blocks(self.blocks.iter())
    }

    /// Statement coverage per source file, ordered by file name.
    pub fn file_summaries(&self) -> BTreeMap<&str, CoverageSummary> {
        let mut per_file: BTreeMap<&str, CoverageSummary> = BTreeMap::new();
        for block in &self.blocks {
            per_file
                .entry(block.file.as_str())
                .or_default()
                .add(block);
        }
        per_file
    }
}

/// Statement totals, in the way `go tool cover -func` reports them.
/// 语句统计，与 `go tool cover -func` 的报告方式一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoverageSummary {
    pub statements: u64,
    pub covered: u64,
}

impl CoverageSummary {
    fn from_blocks<'a>(blocks: impl Iterator<Item = &'a ProfileBlock>) -> Self {
        let mut summary = CoverageSummary::default();
        for block in blocks {
            summary.add(block);
        }
        summary
    }

    fn add(&mut self, block: &ProfileBlock) {
        self.statements += block.statements;
        if block.count > 0 {
            self.covered += block.statements;
        }
    }

    /// Percentage of covered statements; 0 when there are no statements.
    pub fn percent(&self) -> f64 {
        if self.statements == 0 {
            0.0
        } else {
            self.covered as f64 * 100.0 / self.statements as f64
        }
    }
}

impl fmt::Display for CoverageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% ({}/{} statements)",
            self.percent(),
            self.covered,
            self.statements
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record_with_colon_in_path() {
        let block: ProfileBlock = r"C:\src\pkg\a.go:3.14,5.2 2 0".parse().unwrap();
        assert_eq!(block.file, r"C:\src\pkg\a.go");
        assert_eq!((block.start_line, block.start_col), (3, 14));
        assert_eq!((block.end_line, block.end_col), (5, 2));
        assert_eq!(block.statements, 2);
        assert_eq!(block.count, 0);
    }

    #[test]
    fn empty_summary_is_zero_percent() {
        assert_eq!(CoverageSummary::default().percent(), 0.0);
    }
}
