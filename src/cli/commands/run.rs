//! # Run Command Module / 运行命令模块
//!
//! This module implements the default command of the CLI: it resolves the
//! step configuration and drives the coverage pipeline.
//!
//! 此模块实现了 CLI 的默认命令：解析步骤配置并驱动覆盖率流水线。

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::{
    core::{
        config::{self, ConfigFile, Overrides, StepConfig},
        pipeline::run_step,
    },
    infra::{command::SystemExecutor, t},
    reporting::{print_config, print_run_summary},
};

/// Executes the run command with the provided arguments.
///
/// # Arguments
/// * `config_path` - Optional path to a TOML config file
/// * `overrides` - Values given on the command line
/// * `language_given` - Whether `--lang` was passed; if not, the config file may pick the language
///
/// # Returns
/// A Result indicating success or failure of the step
pub async fn execute(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    language_given: bool,
) -> Result<()> {
    let file = match &config_path {
        Some(path) => {
            println!("{}", t!("run.loading_config", path = path.display()));
            config::load_config_file(path)?
        }
        None => ConfigFile::default(),
    };

    if !language_given {
        if let Some(language) = &file.language {
            crate::set_language(language);
        }
    }

    let step_config = StepConfig::resolve(file, |key| std::env::var(key).ok(), overrides)?;
    print_config(&step_config);

    let report = run_step(&step_config, &SystemExecutor).await?;
    print_run_summary(&report);

    if report.coverage.is_none() {
        println!("{}", t!("run.coverage_unknown").yellow());
    }
    Ok(())
}
