//! # Reporting Module / 报告模块
//!
//! This module handles console output of the step: configuration, commands,
//! exported artifacts and coverage summaries, with internationalization support.
//! The HTML and JUnit reports themselves are produced by external tools.
//!
//! 此模块处理本步骤的控制台输出：配置、命令、导出的产物和覆盖率摘要，支持国际化。
//! HTML 和 JUnit 报告本身由外部工具生成。

pub mod console;

// Re-export common reporting functions
pub use console::{print_config, print_profile_report, print_run_summary};
