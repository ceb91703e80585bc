//! # CLI Commands / 命令行命令
//!
//! - `run` - The coverage step itself (the default when no subcommand is given)
//! - `summary` - Prints the statement coverage of an existing profile
//!
//! - `run` - 覆盖率步骤本身（未指定子命令时的默认行为）
//! - `summary` - 打印已有覆盖率文件的语句覆盖率

pub mod run;
pub mod summary;
