//! Toolchain subprocess invocation
//!
//! Every external call (dependency download, `run <pkg> info`, per-target
//! `build`) goes through `Toolchain::execute`, which captures output and
//! turns a non-zero exit or an expired timeout into a `BuildError` carrying
//! that output.

use plugforge_logger as logger;
use parking_lot::Mutex;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::BuildError;
use crate::target::CompileInvocation;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured result of a finished subprocess
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&self.stderr);
        }
        combined
    }
}

/// The compiler toolchain and the flags shared by every invocation
#[derive(Debug, Clone)]
pub struct Toolchain {
    program: PathBuf,
    ldflags: String,
    tags: String,
    goprivate: Option<String>,
    timeout: Option<Duration>,
}

impl Toolchain {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Toolchain {
            program: program.into(),
            ldflags: String::new(),
            tags: String::new(),
            goprivate: None,
            timeout: None,
        }
    }

    pub fn with_ldflags(mut self, ldflags: impl Into<String>) -> Self {
        self.ldflags = ldflags.into();
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn with_goprivate(mut self, goprivate: Option<String>) -> Self {
        self.goprivate = goprivate;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, args: &[&str], work_dir: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).stdin(Stdio::null());
        if let Some(goprivate) = &self.goprivate {
            cmd.env("GOPRIVATE", goprivate);
        }
        if let Some(dir) = work_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn common_flags(&self) -> Vec<&str> {
        let mut flags = vec!["-ldflags", self.ldflags.as_str()];
        if !self.tags.is_empty() {
            flags.extend(["-tags", self.tags.as_str()]);
        }
        flags
    }

    /// Fetch module dependencies for a module-local plugin
    pub fn mod_download(&self, module_dir: &Path, prefix: &str) -> Result<ProcessOutput, BuildError> {
        let cmd = self.command(&["mod", "download"], Some(module_dir));
        self.execute(cmd, prefix)
    }

    /// `run <flags> <package> info`
    pub fn run_info(
        &self,
        package: &str,
        work_dir: Option<&Path>,
        prefix: &str,
    ) -> Result<ProcessOutput, BuildError> {
        let mut args = vec!["run"];
        args.extend(self.common_flags());
        args.extend([package, "info"]);
        let cmd = self.command(&args, work_dir);
        self.execute(cmd, prefix)
    }

    /// `build -o <output> <flags> <package>` with the target's environment
    pub fn build(
        &self,
        package: &str,
        work_dir: Option<&Path>,
        invocation: &CompileInvocation,
        prefix: &str,
    ) -> Result<ProcessOutput, BuildError> {
        let mut args = vec!["build"];
        args.extend(invocation.args.iter().map(String::as_str));
        args.extend(self.common_flags());
        args.push(package);

        let mut cmd = self.command(&args, work_dir);
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }
        self.execute(cmd, prefix)
    }

    fn execute(&self, mut cmd: Command, prefix: &str) -> Result<ProcessOutput, BuildError> {
        let display = display_command(&cmd);
        logger::info(&format!("{}$ {}", prefix, display));

        let output = match self.timeout {
            None => cmd
                .output()
                .map(|out| ProcessOutput {
                    status: out.status,
                    stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                })
                .map_err(|source| BuildError::Spawn {
                    command: display.clone(),
                    source,
                })?,
            Some(timeout) => run_with_timeout(&mut cmd, timeout, &display)?,
        };

        logger::capture_output(&display, output.status.code(), &output.combined());

        if !output.status.success() {
            return Err(BuildError::CommandFailed {
                command: display,
                status: output.status,
                output: output.combined(),
            });
        }
        Ok(output)
    }
}

/// Package argument for a source directory: relative paths get a `./`
/// prefix so the toolchain treats them as directories, not import paths.
pub fn package_arg(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if path.is_absolute() || raw.starts_with("./") || raw.starts_with("../") {
        raw.to_string()
    } else {
        format!("./{}", raw)
    }
}

fn display_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().to_string()];
    parts.extend(cmd.get_args().map(|arg| {
        let arg = arg.to_string_lossy();
        if arg.is_empty() || arg.contains(' ') {
            format!("{:?}", arg)
        } else {
            arg.to_string()
        }
    }));
    parts.join(" ")
}

fn run_with_timeout(
    cmd: &mut Command,
    timeout: Duration,
    display: &str,
) -> Result<ProcessOutput, BuildError> {
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| BuildError::Spawn {
            command: display.to_string(),
            source,
        })?;

    let stdout_buf = spawn_reader(child.stdout.take());
    let stderr_buf = spawn_reader(child.stderr.take());

    let started = Instant::now();
    let status = loop {
        let polled = child.try_wait().map_err(|source| BuildError::Spawn {
            command: display.to_string(),
            source,
        })?;
        if let Some(status) = polled {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            // Grandchildren may still hold the pipes; report what arrived so far
            return Err(BuildError::Timeout {
                command: display.to_string(),
                timeout,
                output: format!(
                    "{}{}",
                    snapshot(&stdout_buf.0),
                    snapshot(&stderr_buf.0)
                ),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(ProcessOutput {
        status,
        stdout: drain(stdout_buf),
        stderr: drain(stderr_buf),
    })
}

type SharedBuf = Arc<Mutex<Vec<u8>>>;

fn spawn_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> (SharedBuf, Option<thread::JoinHandle<()>>) {
    let buf: SharedBuf = Arc::new(Mutex::new(Vec::new()));
    let handle = pipe.map(|mut pipe| {
        let sink = Arc::clone(&buf);
        thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            while let Ok(n) = pipe.read(&mut chunk) {
                if n == 0 {
                    break;
                }
                sink.lock().extend_from_slice(&chunk[..n]);
            }
        })
    });
    (buf, handle)
}

fn snapshot(buf: &SharedBuf) -> String {
    String::from_utf8_lossy(&buf.lock()).to_string()
}

fn drain((buf, handle): (SharedBuf, Option<thread::JoinHandle<()>>)) -> String {
    if let Some(handle) = handle {
        let _ = handle.join();
    }
    snapshot(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_arg() {
        assert_eq!(package_arg(Path::new("cmd/cli/plugin/foo")), "./cmd/cli/plugin/foo");
        assert_eq!(package_arg(Path::new("./cmd/cli/plugin/foo")), "./cmd/cli/plugin/foo");
        assert_eq!(package_arg(Path::new(".")), "./.");
        #[cfg(unix)]
        assert_eq!(package_arg(Path::new("/src/foo")), "/src/foo");
    }

    #[test]
    fn test_common_flags_skip_empty_tags() {
        let toolchain = Toolchain::new("go").with_ldflags("-X main.version=v1");
        assert_eq!(toolchain.common_flags(), vec!["-ldflags", "-X main.version=v1"]);

        let tagged = toolchain.with_tags("netgo");
        assert_eq!(
            tagged.common_flags(),
            vec!["-ldflags", "-X main.version=v1", "-tags", "netgo"]
        );
    }

    #[test]
    fn test_display_quotes_empty_and_spaced_args() {
        let mut cmd = Command::new("go");
        cmd.args(["build", "-ldflags", "", "-X a=b c", "./foo"]);
        assert_eq!(display_command(&cmd), "go build -ldflags \"\" \"-X a=b c\" ./foo");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let toolchain = Toolchain::new("/nonexistent/plugforge-toolchain");
        let result = toolchain.run_info("./foo", None, "");
        assert!(matches!(result, Err(BuildError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_keeps_output() {
        let toolchain = Toolchain::new("/bin/sh");
        let cmd = {
            let mut cmd = Command::new("/bin/sh");
            cmd.args(["-c", "echo compiling; echo 'undefined: main' >&2; exit 2"]);
            cmd
        };
        match toolchain.execute(cmd, "🐼 - ") {
            Err(BuildError::CommandFailed { output, status, .. }) => {
                assert_eq!(status.code(), Some(2));
                assert!(output.contains("compiling"));
                assert!(output.contains("undefined: main"));
            }
            other => panic!("expected command failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_hung_process() {
        let toolchain = Toolchain::new("/bin/sh").with_timeout(Some(Duration::from_millis(200)));
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", "sleep 30"]);

        let started = Instant::now();
        let result = toolchain.execute(cmd, "");
        assert!(matches!(result, Err(BuildError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_allows_fast_process() {
        let toolchain = Toolchain::new("/bin/sh").with_timeout(Some(Duration::from_secs(10)));
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", "echo '{\"name\":\"x\"}'"]);

        let result = toolchain.execute(cmd, "");
        assert!(result.is_ok_and(|out| out.stdout.trim() == "{\"name\":\"x\"}"));
    }
}
