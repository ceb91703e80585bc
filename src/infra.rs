//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for the step,
//! including command execution, file system operations, environment
//! export and i18n support.
//!
//! 此模块为本步骤提供基础设施服务，
//! 包括命令执行、文件系统操作、环境变量导出和国际化支持。

pub mod command;
pub mod export;
pub mod fs;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
