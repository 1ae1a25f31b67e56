//! Process execution with file-based output capture.
//!
//! Each invocation gets its own temporary directory holding `stdout.txt`
//! and `stderr.txt`. The child's stdout is written to the first file and
//! the user command's stderr is appended to the second through an
//! interpreter redirection, so the two streams never mix and nothing is
//! piped back into this process while the child runs.

use crate::error::{Result, SaveError};
use crate::logging::SharedLogger;
use crate::shell::platform::Interpreter;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const STDOUT_FILE: &str = "stdout.txt";
const STDERR_FILE: &str = "stderr.txt";

/// Outcome of one process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code as reported by the OS.
    pub code: i32,

    /// Standard output, one entry per line.
    pub stdout: Vec<String>,

    /// Standard error, one entry per line.
    pub stderr: Vec<String>,
}

/// Runs one external command and captures its output.
///
/// A runner is consumed by its invocation; create a new one per command.
///
/// # Example
///
/// ```
/// # #[cfg(unix)] {
/// use save::logging::TracingLogger;
/// use save::shell::ProcessRunner;
///
/// let result = ProcessRunner::new(TracingLogger::shared())
///     .exec("echo hello", None)
///     .unwrap();
/// assert_eq!(result.code, 0);
/// assert_eq!(result.stdout, vec!["hello".to_string()]);
/// # }
/// ```
pub struct ProcessRunner {
    logger: SharedLogger,
    interpreter: Interpreter,
    timeout: Option<Duration>,
    cwd: Option<PathBuf>,
    temp_root: Option<PathBuf>,
}

/// Raw output collected before the temporary directory is removed.
struct Captured {
    code: i32,
    stdout: Vec<u8>,
    stderr: String,
}

impl ProcessRunner {
    /// Create a runner for the current platform's interpreter.
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            logger,
            interpreter: Interpreter::detect(),
            timeout: None,
            cwd: None,
            temp_root: None,
        }
    }

    /// Kill the process and fail if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the process in `cwd`.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Create the capture directory below `root` instead of the system
    /// temporary directory.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Execute an argument vector, joined with spaces.
    pub fn exec_args<S: AsRef<str>>(
        self,
        args: &[S],
        redirect_to: Option<&Path>,
    ) -> Result<ExecutionResult> {
        let command = args
            .iter()
            .map(|arg| arg.as_ref())
            .collect::<Vec<&str>>()
            .join(" ");
        self.exec(&command, redirect_to)
    }

    /// Execute `command` and wait for its completion.
    ///
    /// # Arguments
    ///
    /// * `command` - Command string passed to the interpreter
    /// * `redirect_to` - File receiving the raw stdout, if any
    ///
    /// # Errors
    ///
    /// Returns `ProcessExecution` if the process cannot be spawned, times
    /// out, ends without an exit code, or the command is not found.
    ///
    /// Any other exit code is returned as is. The interpreter's "command not
    /// found" code (127 for `sh`, 9009 for `cmd`) is the exception: it is
    /// reported as `ProcessExecution`, even when a tool exits with that code
    /// on its own.
    pub fn exec(self, command: &str, redirect_to: Option<&Path>) -> Result<ExecutionResult> {
        let temp_dir = self.create_temp_dir()?;
        self.logger.debug(&format!(
            "Created files for stdout and stderr in {}",
            temp_dir.path().display()
        ));

        let captured = self.capture(command, temp_dir.path());
        if let Err(e) = temp_dir.close() {
            self.logger
                .warn(&format!("Failed to remove temporary directory: {}", e));
        }
        let captured = captured?;

        if !captured.stderr.is_empty() {
            self.logger.warn(&captured.stderr);
        }
        match redirect_to {
            Some(path) => fs::write(path, &captured.stdout)?,
            None => self.logger.debug(&format!(
                "Execution output:\n{}",
                String::from_utf8_lossy(&captured.stdout)
            )),
        }

        Ok(ExecutionResult {
            code: captured.code,
            stdout: split_lines(&String::from_utf8_lossy(&captured.stdout)),
            stderr: split_lines(&captured.stderr),
        })
    }

    fn create_temp_dir(&self) -> Result<TempDir> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let prefix = format!("save-process-{}-", nanos);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).rand_bytes(8);
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Append the stderr redirection to the user command.
    fn prepare_cmd(&self, command: &str, stderr_file: &Path) -> String {
        if command.contains("2>") {
            self.logger.warn(&format!(
                "Found user provided stderr redirection in `{}`. \
                 stderr is used internally and will be redirected to {}",
                command,
                stderr_file.display()
            ));
        }
        format!(
            "{} 2>>{}",
            command,
            quote(&self.interpreter, &stderr_file.to_string_lossy())
        )
    }

    fn capture(&self, command: &str, dir: &Path) -> Result<Captured> {
        let stdout_file = dir.join(STDOUT_FILE);
        let stderr_file = dir.join(STDERR_FILE);
        let cmd_line = self.prepare_cmd(command, &stderr_file);

        let status = self.spawn_and_wait(command, &cmd_line, &stdout_file, &stderr_file)?;
        let Some(code) = status.code() else {
            return Err(SaveError::ProcessExecution {
                command: command.to_string(),
                message: format!("could not determine exit status (-1): {}", status),
            });
        };

        let stderr = fs::read_to_string(&stderr_file)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default();
        if code == self.interpreter.not_found_code {
            return Err(SaveError::ProcessExecution {
                command: command.to_string(),
                message: format!("command not found (exit code {}): {}", code, stderr),
            });
        }
        let stdout = fs::read(&stdout_file)?;

        Ok(Captured {
            code,
            stdout,
            stderr,
        })
    }

    fn spawn_and_wait(
        &self,
        command: &str,
        cmd_line: &str,
        stdout_file: &Path,
        stderr_file: &Path,
    ) -> Result<ExitStatus> {
        let fail = |message: String| SaveError::ProcessExecution {
            command: command.to_string(),
            message,
        };

        let stdout = File::create(stdout_file)?;
        let stderr = OpenOptions::new()
            .create(true)
            .append(true)
            .open(stderr_file)?;

        let mut cmd = Command::new(self.interpreter.program);
        cmd.arg(self.interpreter.flag)
            .arg(cmd_line)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        self.logger.debug(&format!("Executing: {}", cmd_line));
        let mut child = cmd
            .spawn()
            .map_err(|e| fail(format!("cannot spawn {}: {}", self.interpreter.program, e)))?;

        let Some(timeout) = self.timeout else {
            return child.wait().map_err(|e| fail(format!("wait failed: {}", e)));
        };

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(fail(format!("timed out after {} ms", timeout.as_millis())));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(fail(format!("wait failed: {}", e))),
            }
        }
    }
}

fn quote(interpreter: &Interpreter, value: &str) -> String {
    if *interpreter == Interpreter::WINDOWS {
        format!("\"{}\"", value)
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
