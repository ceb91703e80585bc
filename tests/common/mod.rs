// Shared test helpers for integration tests
#![allow(dead_code)]

use anyhow::Result;
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use go_test_coverage::config::{JunitSource, PackageSpec, StepConfig, ToolPaths, WorkspaceLayout};
use go_test_coverage::infra::command::{CommandOutcome, Executor, ToolCommand};
use go_test_coverage::infra::export::ExportTarget;
use go_test_coverage::models::{FailureReason, StepFailure};

/// How an executor method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Stream,
    Capture,
    Pipe,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub kind: CallKind,
    pub cmd: ToolCommand,
}

/// The profile the fake `go test` writes for one package.
pub fn profile_for(package: &str) -> String {
    format!(
        "mode: atomic\n{package}/file.go:3.14,5.2 2 1\n{package}/file.go:7.1,9.2 1 0\n"
    )
}

/// An executor that simulates `go`, `which`, `go-junit-report` and `envman`
/// without spawning anything.
#[derive(Debug)]
pub struct FakeExecutor {
    pub calls: RefCell<Vec<Call>>,
    /// Packages whose `go test` run exits with status 1.
    pub failing_packages: Vec<String>,
    pub junit_installed: bool,
    pub fail_install: bool,
    pub fail_html: bool,
    pub fail_envman: bool,
    /// Report the tee log as unwritable, the way `SystemExecutor` classifies it.
    pub fail_tee: bool,
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            failing_packages: Vec::new(),
            junit_installed: true,
            fail_install: false,
            fail_html: false,
            fail_envman: false,
            fail_tee: false,
        }
    }
}

impl FakeExecutor {
    fn record(&self, kind: CallKind, cmd: &ToolCommand) {
        self.calls.borrow_mut().push(Call {
            kind,
            cmd: cmd.clone(),
        });
    }

    /// All `go test` invocations, in order.
    pub fn test_invocations(&self) -> Vec<ToolCommand> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.cmd.program == "go" && c.cmd.args.first().map(String::as_str) == Some("test"))
            .map(|c| c.cmd.clone())
            .collect()
    }

    pub fn calls_to(&self, program: &str) -> Vec<ToolCommand> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.cmd.program == program)
            .map(|c| c.cmd.clone())
            .collect()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.calls.borrow().iter().filter(|c| c.kind == kind).count()
    }
}

fn outcome(code: i32, output: &str) -> CommandOutcome {
    CommandOutcome {
        code: Some(code),
        output: output.to_string(),
    }
}

impl Executor for FakeExecutor {
    async fn stream(&self, cmd: &ToolCommand, tee: Option<&Path>) -> Result<CommandOutcome> {
        self.record(CallKind::Stream, cmd);

        match cmd.args.first().map(String::as_str) {
            Some("test") => {
                let profile = cmd
                    .args
                    .iter()
                    .find_map(|a| a.strip_prefix("-coverprofile="))
                    .expect("go test without -coverprofile");
                let mode_pos = cmd
                    .args
                    .iter()
                    .position(|a| a == "-covermode=atomic")
                    .expect("go test without -covermode=atomic");
                let packages = &cmd.args[mode_pos + 1..];

                if packages.iter().any(|p| self.failing_packages.contains(p)) {
                    return Ok(outcome(1, ""));
                }

                let content: String = packages.iter().map(|p| profile_for(p)).collect();
                fs::write(profile, content)?;

                if let Some(log) = tee {
                    if self.fail_tee {
                        return Err(StepFailure::new(
                            FailureReason::FileSystem,
                            format!("Failed to record output of `go` in {}", log.display()),
                        )
                        .into());
                    }
                    let mut file = fs::OpenOptions::new().create(true).append(true).open(log)?;
                    for p in packages {
                        writeln!(file, "=== RUN   TestThing\n--- PASS: TestThing (0.00s)\nok  \t{p}\t0.01s")?;
                    }
                }
                Ok(outcome(0, ""))
            }
            Some("tool") => {
                if self.fail_html {
                    return Ok(outcome(2, ""));
                }
                let out_pos = cmd.args.iter().position(|a| a == "-o").expect("missing -o");
                fs::write(&cmd.args[out_pos + 1], "<html><body>coverage</body></html>")?;
                Ok(outcome(0, ""))
            }
            other => panic!("unexpected streamed command: {other:?}"),
        }
    }

    async fn capture(&self, cmd: &ToolCommand) -> Result<CommandOutcome> {
        self.record(CallKind::Capture, cmd);

        match cmd.program.as_str() {
            "which" => {
                if self.junit_installed {
                    Ok(outcome(0, "/usr/local/bin/go-junit-report\n"))
                } else {
                    Ok(outcome(1, ""))
                }
            }
            "go" => {
                if self.fail_install {
                    Ok(outcome(1, "go: network unreachable"))
                } else {
                    Ok(outcome(0, ""))
                }
            }
            "envman" => {
                if self.fail_envman {
                    Ok(outcome(1, "envman: store is read-only"))
                } else {
                    Ok(outcome(0, ""))
                }
            }
            other => panic!("unexpected captured command: {other}"),
        }
    }

    async fn pipe(
        &self,
        cmd: &ToolCommand,
        stdin_from: &Path,
        stdout_to: &Path,
    ) -> Result<CommandOutcome> {
        self.record(CallKind::Pipe, cmd);
        let input = fs::read_to_string(stdin_from)?;
        fs::write(stdout_to, format!("<testsuites>\n{input}</testsuites>\n"))?;
        Ok(outcome(0, ""))
    }
}

/// A config that exports into `env_file` and uses the default tool names.
pub fn config_for(
    layout: WorkspaceLayout,
    packages: &str,
    deploy_dir: Option<PathBuf>,
    env_file: &Path,
) -> StepConfig {
    StepConfig {
        packages: PackageSpec::parse(packages).unwrap(),
        layout,
        deploy_dir,
        junit_source: JunitSource::Profile,
        export: ExportTarget::File(env_file.to_path_buf()),
        install_missing_tools: true,
        tools: ToolPaths::default(),
    }
}

/// Parses `KEY=VALUE` lines written by the file export target.
pub fn read_env_file(path: &Path) -> Vec<(String, String)> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Writes an executable shell script (Unix only).
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
