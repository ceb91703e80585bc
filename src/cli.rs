// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::{JunitSource, Overrides, WorkspaceLayout};
use crate::infra::export::ExportTarget;
use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        if let Some(lang) = args.get(pos + 1) {
            return Some(lang.clone());
        }
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang=").map(str::to_string))
}

fn build_cli() -> Command {
    Command::new("go-test-coverage")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about").to_string())
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang").to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help(t!("cli.config").to_string())
                .value_name("CONFIG")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("packages")
                .short('p')
                .long("packages")
                .help(t!("cli.packages").to_string())
                .value_name("PACKAGES")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("layout")
                .long("layout")
                .help(t!("cli.layout").to_string())
                .value_name("LAYOUT")
                .value_parser(clap::value_parser!(WorkspaceLayout))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("deploy-dir")
                .long("deploy-dir")
                .help(t!("cli.deploy_dir").to_string())
                .value_name("DEPLOY_DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("junit-source")
                .long("junit-source")
                .help(t!("cli.junit_source").to_string())
                .value_name("SOURCE")
                .value_parser(clap::value_parser!(JunitSource))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("export")
                .long("export")
                .help(t!("cli.export").to_string())
                .value_name("TARGET")
                .value_parser(clap::value_parser!(ExportTarget))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("no-install")
                .long("no-install")
                .help(t!("cli.no_install").to_string())
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("summary")
                .about(t!("cli.summary_about").to_string())
                .arg(
                    Arg::new("profile")
                        .help(t!("cli.summary_profile").to_string())
                        .value_name("PROFILE")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
}

fn overrides_from(matches: &ArgMatches) -> Overrides {
    Overrides {
        packages: matches.get_one::<String>("packages").cloned(),
        layout: matches.get_one::<WorkspaceLayout>("layout").copied(),
        deploy_dir: matches.get_one::<PathBuf>("deploy-dir").cloned(),
        junit_source: matches.get_one::<JunitSource>("junit-source").copied(),
        export: matches.get_one::<ExportTarget>("export").cloned(),
        no_install: matches.get_flag("no-install"),
    }
}

/// Parses the command line and dispatches to the selected command.
/// Without a subcommand the coverage step itself runs.
pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    match pre_parse_language() {
        Some(language) => crate::set_language(&language),
        None => crate::init(),
    }

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("summary", summary_matches)) => {
            let profile = summary_matches
                .get_one::<PathBuf>("profile")
                .cloned()
                .unwrap_or_default();
            commands::summary::execute(&profile)
        }
        _ => {
            let config = matches.get_one::<PathBuf>("config").cloned();
            let language_given = matches.get_one::<String>("lang").is_some();
            commands::run::execute(config, overrides_from(&matches), language_given).await
        }
    }
}
