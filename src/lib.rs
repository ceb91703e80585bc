//! # Go Test Coverage Library / Go 测试覆盖率库
//!
//! This library provides the core functionality for the `go-test-coverage`
//! CI step: it runs `go test` with coverage instrumentation, turns the raw
//! profile into HTML and JUnit reports, and publishes the artifact paths as
//! environment variables for later pipeline steps.
//!
//! 此库为 `go-test-coverage` CI 步骤提供核心功能：
//! 它以覆盖率插桩方式运行 `go test`，将原始覆盖率文件转换为 HTML 和 JUnit 报告，
//! 并将产物路径作为环境变量发布给后续流水线步骤。
//!
//! ## Modules / 模块
//!
//! - `core` - Configuration, data models, coverage profiles and the step pipeline
//! - `infra` - Infrastructure services like command execution, workspace files and env export
//! - `reporting` - Console output for configuration, commands and results
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 配置、数据模型、覆盖率文件和步骤流水线
//! - `infra` - 基础设施服务，如命令执行、工作区文件和环境变量导出
//! - `reporting` - 配置、命令和结果的控制台输出
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::models;
pub use core::pipeline;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's user interface. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en").
pub fn init() {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    set_language(&locale);
}

/// Sets the active locale, falling back from `zh-CN` to `zh` to `en`.
/// 设置当前语言，依次回退：`zh-CN` -> `zh` -> `en`。
pub fn set_language(requested: &str) {
    let available_locales = rust_i18n::available_locales!();

    let is_available = |code: &str| available_locales.iter().any(|l| *l == code);

    let lang = if is_available(requested) {
        requested
    } else {
        requested
            .split('-')
            .next()
            .filter(|lang_code| is_available(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
