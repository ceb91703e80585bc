//! # Command Execution Module / 命令执行模块
//!
//! Every external tool the step calls goes through [`ToolCommand`] and the
//! [`Executor`] trait, so all call sites share one result type and one
//! success check.
//!
//! 步骤调用的每个外部工具都通过 [`ToolCommand`] 和 [`Executor`] trait 执行，
//! 因此所有调用点共享同一个结果类型和同一个成功检查。

use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::core::models::{FailureReason, OrFail, StepFailure};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command line as it would be typed into a shell.
    ///
    /// 以在 shell 中输入的形式返回命令行。
    pub fn printable(&self) -> String {
        let parts = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        shlex::try_join(parts.clone()).unwrap_or_else(|_| parts.collect::<Vec<_>>().join(" "))
    }

    fn to_tokio(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        cmd
    }
}

/// The uniform result of running a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured combined output. Empty for streamed commands without a tee.
    pub output: String,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn trimmed_output(&self) -> &str {
        self.output.trim()
    }
}

/// Turns a non-zero exit into an `ExternalTool` failure naming the command.
///
/// 将非零退出码转换为指明命令的 `ExternalTool` 失败。
pub fn ensure_success(cmd: &ToolCommand, outcome: &CommandOutcome) -> Result<()> {
    if outcome.success() {
        return Ok(());
    }

    let status = match outcome.code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    };
    let mut message = format!("`{}` failed: {status}", cmd.printable());
    if !outcome.trimmed_output().is_empty() {
        message.push('\n');
        message.push_str(outcome.trimmed_output());
    }
    Err(StepFailure::new(FailureReason::ExternalTool, message).into())
}

/// Runs external tools. Implemented by [`SystemExecutor`] for real processes;
/// tests substitute their own implementation.
///
/// 运行外部工具。[`SystemExecutor`] 为真实进程实现此 trait；测试可替换为自己的实现。
#[allow(async_fn_in_trait)]
pub trait Executor {
    /// Runs with stdout/stderr forwarded live. When `tee` is given, every line
    /// is also appended to that file.
    async fn stream(&self, cmd: &ToolCommand, tee: Option<&Path>) -> Result<CommandOutcome>;

    /// Runs and captures combined stdout and stderr.
    async fn capture(&self, cmd: &ToolCommand) -> Result<CommandOutcome>;

    /// Runs with stdin read from `stdin_from` and stdout written to `stdout_to`.
    async fn pipe(
        &self,
        cmd: &ToolCommand,
        stdin_from: &Path,
        stdout_to: &Path,
    ) -> Result<CommandOutcome>;
}

/// Append handle shared by the stdout and stderr readers of one child.
type SharedLog = Arc<Mutex<tokio::fs::File>>;

/// Copies `reader` into `echo` line by line, byte for byte, appending each
/// line to `log` as well. Output that is not valid UTF-8 is passed through.
///
/// 将 `reader` 按行、逐字节复制到 `echo`，并同时追加到 `log`。非 UTF-8 输出原样传递。
async fn tee_lines<R, W>(reader: R, mut echo: W, log: SharedLog) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if !line.ends_with(b"\n") {
            line.push(b'\n');
        }
        // A closed console must not stop the child; only the log is checked.
        let _ = echo.write_all(&line).await;

        let mut log = log.lock().await;
        log.write_all(&line).await?;
        log.flush().await?;
    }
    let _ = echo.flush().await;
    Ok(())
}

/// Appends every line of `reader` to `output` without decoding it.
async fn collect_lines<R>(reader: R, output: Arc<Mutex<Vec<u8>>>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if !line.ends_with(b"\n") {
            line.push(b'\n');
        }
        output.lock().await.extend_from_slice(&line);
    }
    Ok(())
}

/// Waits for a reader task and surfaces both panics and I/O errors.
async fn join_reader(handle: JoinHandle<io::Result<()>>) -> Result<()> {
    handle.await.context("Output reader task failed")??;
    Ok(())
}

/// Executes tools as child processes with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    async fn stream(&self, cmd: &ToolCommand, tee: Option<&Path>) -> Result<CommandOutcome> {
        let Some(log_path) = tee else {
            let status = cmd
                .to_tokio()
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .with_context(|| format!("Failed to spawn `{}`", cmd.program))?;
            return Ok(CommandOutcome {
                code: status.code(),
                output: String::new(),
            });
        };

        let log = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .await
            .or_fail(FailureReason::FileSystem, || {
                format!("Failed to open log file: {}", log_path.display())
            })?;
        let log: SharedLog = Arc::new(Mutex::new(log));

        let mut child = cmd
            .to_tokio()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn `{}`", cmd.program))?;

        let stdout = child
            .stdout
            .take()
            .context("Failed to capture stdout")?;
        let stderr = child
            .stderr
            .take()
            .context("Failed to capture stderr")?;

        // Both pipes are drained concurrently so neither can fill up and block the child.
        let stdout_handle = tokio::spawn(tee_lines(stdout, tokio::io::stdout(), Arc::clone(&log)));
        let stderr_handle = tokio::spawn(tee_lines(stderr, tokio::io::stderr(), Arc::clone(&log)));

        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for `{}`", cmd.program))?;

        for handle in [stdout_handle, stderr_handle] {
            join_reader(handle).await.or_fail(FailureReason::FileSystem, || {
                format!(
                    "Failed to record output of `{}` in {}",
                    cmd.program,
                    log_path.display()
                )
            })?;
        }
        log.lock()
            .await
            .flush()
            .await
            .or_fail(FailureReason::FileSystem, || {
                format!("Failed to flush log file: {}", log_path.display())
            })?;

        Ok(CommandOutcome {
            code: status.code(),
            output: String::new(),
        })
    }

    async fn capture(&self, cmd: &ToolCommand) -> Result<CommandOutcome> {
        let mut child = cmd
            .to_tokio()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn `{}`", cmd.program))?;

        let stdout = child
            .stdout
            .take()
            .context("Failed to capture stdout")?;
        let stderr = child
            .stderr
            .take()
            .context("Failed to capture stderr")?;

        let output = Arc::new(Mutex::new(Vec::new()));
        let stdout_handle = tokio::spawn(collect_lines(stdout, Arc::clone(&output)));
        let stderr_handle = tokio::spawn(collect_lines(stderr, Arc::clone(&output)));

        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for `{}`", cmd.program))?;

        for handle in [stdout_handle, stderr_handle] {
            join_reader(handle)
                .await
                .with_context(|| format!("Failed to read output of `{}`", cmd.program))?;
        }

        let output = String::from_utf8_lossy(&output.lock().await).into_owned();
        Ok(CommandOutcome {
            code: status.code(),
            output,
        })
    }

    async fn pipe(
        &self,
        cmd: &ToolCommand,
        stdin_from: &Path,
        stdout_to: &Path,
    ) -> Result<CommandOutcome> {
        let input = std::fs::File::open(stdin_from)
            .with_context(|| format!("Failed to open {}", stdin_from.display()))?;
        let output = std::fs::File::create(stdout_to)
            .with_context(|| format!("Failed to create {}", stdout_to.display()))?;

        let status = cmd
            .to_tokio()
            .stdin(Stdio::from(input))
            .stdout(Stdio::from(output))
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("Failed to spawn `{}`", cmd.program))?;

        Ok(CommandOutcome {
            code: status.code(),
            output: String::new(),
        })
    }
}
