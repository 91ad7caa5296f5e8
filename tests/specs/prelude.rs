//! Test helpers for guardianctl behavioral specifications.
//!
//! Provides a fluent CLI runner plus a one-shot fake admin-IPC server so
//! these specs never need a real, privileged guardian-daemon process.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use guardian_daemon::protocol::{read_request, write_response};
use guardian_daemon::{Request, Response, DEFAULT_TIMEOUT};

/// Returns the path to a binary, checking llvm-cov target directory first.
/// This works with both standard builds and llvm-cov coverage runs.
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR is stale (e.g. compiled by a removed worktree
/// into a shared target directory).
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn guardianctl_binary() -> PathBuf {
    binary_path("guardianctl")
}

/// Returns a Command configured to run the guardianctl binary.
pub fn guardianctl_cmd() -> Command {
    Command::new(guardianctl_binary())
}

/// Create a CLI builder for guardianctl commands.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions.
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Add CLI arguments.
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Point this invocation at a fake daemon's socket.
    pub fn socket(mut self, path: impl AsRef<Path>) -> Self {
        self.envs.push(("GUARDIAN_ADMIN_SOCKET".into(), path.as_ref().to_string_lossy().into()));
        self
    }

    /// Set an arbitrary environment variable.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = guardianctl_cmd();
        cmd.args(&self.args);
        cmd.env_remove("GUARDIAN_ADMIN_SOCKET");
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run and expect success (exit code 0).
    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code).
    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run, for chaining assertions.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Assert stdout equals `expected` exactly (with diff on failure).
    /// Prefer this for commands with a fully specified, deterministic format.
    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = self.stdout();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}

/// A one-shot fake admin-IPC server: binds a Unix socket, accepts exactly
/// one connection, asserts the request it receives equals `expected`,
/// and replies with `respond_with`. Runs on a background thread with its
/// own single-threaded Tokio runtime so callers can drive `guardianctl`
/// synchronously via [`std::process::Command`] on the test's own thread.
pub struct FakeDaemon {
    _dir: tempfile::TempDir,
    socket_path: PathBuf,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl FakeDaemon {
    pub fn serve_one(expected: Request, respond_with: Response) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket_path = dir.path().join("guardian-daemon.sock");
        let bind_path = socket_path.clone();

        let handle = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("current-thread runtime");
            rt.block_on(async move {
                let listener = tokio::net::UnixListener::bind(&bind_path).expect("bind fake admin socket");
                let (stream, _) = listener.accept().await.expect("accept");
                let (mut reader, mut writer) = stream.into_split();
                let request = read_request(&mut reader, DEFAULT_TIMEOUT).await.expect("read request");
                assert_eq!(request, expected, "unexpected request reached the fake daemon");
                write_response(&mut writer, &respond_with, DEFAULT_TIMEOUT).await.expect("write response");
            });
        });

        wait_for_socket(&socket_path);
        Self { _dir: dir, socket_path, handle: Some(handle) }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(panic) = handle.join() {
                std::panic::resume_unwind(panic);
            }
        }
    }
}

fn wait_for_socket(path: &Path) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !path.exists() {
        if Instant::now() > deadline {
            panic!("fake daemon never bound its socket at {}", path.display());
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
