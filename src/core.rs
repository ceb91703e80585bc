//! # Core Module / 核心模块
//!
//! This module contains the core functionality of the step,
//! including configuration, data models, coverage profiles, workspace
//! preparation, aggregation and the pipeline that ties them together.
//!
//! 此模块包含本步骤的核心功能，
//! 包括配置、数据模型、覆盖率文件、工作区准备、聚合以及把它们串联起来的流水线。

pub mod aggregate;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod profile;
pub mod workspace;

// Re-exports
pub use config::StepConfig;
pub use models::RunReport;
pub use pipeline::run_step;
