//! External process invocation with timeouts.

use crossbeam_channel::{unbounded, Receiver};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::encoding;
use crate::error::{Error, Result};

/// A command line to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path
    pub program: String,
    /// Arguments in order
    pub args: Vec<String>,
    /// Working directory; inherits the caller's when unset
    pub cwd: Option<PathBuf>,
    /// Wall-clock limit; the child is killed when it is exceeded
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Create an invocation of `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Set the working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The command line as one display string.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished (or killed) process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when killed by a signal or on timeout
    pub status: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Whether the process was killed at its deadline
    pub timed_out: bool,
}

impl ProcessOutput {
    /// Output of a process that exited with `status`.
    pub fn exited(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
        }
    }

    /// Output of a process killed at its deadline.
    pub fn timed_out(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status: None,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: true,
        }
    }

    /// Check if the process exited with status 0.
    pub fn success(&self) -> bool {
        !self.timed_out && self.status == Some(0)
    }

    /// Stderr if non-empty, otherwise stdout, trimmed.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Runs external programs.
///
/// The pipeline reaches every external tool through this trait, so tests can
/// substitute a scripted runner.
pub trait ProcessRunner {
    /// Run an invocation to completion or timeout.
    ///
    /// Returns `Err` only when the process cannot be started or waited on.
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;

    /// Resolve a program name to an executable path.
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        (**self).run(invocation)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        (**self).locate(program)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Runs programs as child processes of the current process.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    poll_interval: Duration,
}

impl SystemRunner {
    /// Create a runner with a 50 ms exit poll interval.
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Set how often a running child is checked for exit.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn drain<R: Read + Send + 'static>(
    mut reader: R,
    stream: Stream,
    sender: crossbeam_channel::Sender<(Stream, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        let _ = sender.send((stream, buf));
    });
}

/// Kill a child and reap it so it does not linger as a zombie.
fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::debug!("kill failed: {}", e);
    }
    let _ = child.wait();
}

fn collect(receiver: &Receiver<(Stream, Vec<u8>)>, pending: usize) -> (String, String) {
    let mut stdout = String::new();
    let mut stderr = String::new();
    for _ in 0..pending {
        // A grandchild can inherit and hold the pipes; don't wait forever.
        match receiver.recv_timeout(Duration::from_secs(5)) {
            Ok((Stream::Stdout, bytes)) => stdout = encoding::decode(&bytes).text,
            Ok((Stream::Stderr, bytes)) => stderr = encoding::decode(&bytes).text,
            Err(_) => break,
        }
    }
    (stdout, stderr)
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        log::debug!("Running: {}", invocation.command_line());

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| Error::process(&invocation.program, format!("cannot start: {}", e)))?;

        let (sender, receiver) = unbounded();
        let mut pending = 0;
        if let Some(out) = child.stdout.take() {
            drain(out, Stream::Stdout, sender.clone());
            pending += 1;
        }
        if let Some(err) = child.stderr.take() {
            drain(err, Stream::Stderr, sender.clone());
            pending += 1;
        }
        drop(sender);

        let deadline = invocation.timeout.map(|t| Instant::now() + t);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let (stdout, stderr) = collect(&receiver, pending);
                    return Ok(ProcessOutput {
                        status: status.code(),
                        stdout,
                        stderr,
                        timed_out: false,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    terminate(&mut child);
                    return Err(e.into());
                }
            }

            if deadline.map_or(false, |d| Instant::now() >= d) {
                log::warn!(
                    "{} exceeded {:?}, killing it",
                    invocation.program,
                    invocation.timeout.unwrap_or_default()
                );
                terminate(&mut child);
                let (stdout, stderr) = collect(&receiver, pending);
                return Ok(ProcessOutput::timed_out(stdout, stderr));
            }

            thread::sleep(self.poll_interval);
        }
    }
}
