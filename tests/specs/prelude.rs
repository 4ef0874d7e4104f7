//! Shared harness for CLI specs.
//!
//! Every `Archive` gets its own state and socket directories and a default
//! admin account, and stops its daemon when dropped.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin;
use tempfile::TempDir;

pub const ADMIN_LOGIN: &str = "admin@archive.local";
pub const ADMIN_PASSWORD: &str = "s3cret pass";

/// An isolated archive: state dir, socket dir, daemon
pub struct Archive {
    dir: TempDir,
}

impl Archive {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `sm` with the archive's environment
    pub fn sm(&self) -> CliBuilder {
        let mut cmd = assert_cmd::Command::new(cargo_bin("sm"));
        cmd.env_remove("SM_STATE_DIR")
            .env_remove("XDG_STATE_HOME")
            .env_remove("RUST_LOG")
            .env("SM_STATE_DIR", self.state_dir())
            .env("SM_SOCKET_DIR", self.dir.path())
            .env("SM_DAEMON_BINARY", cargo_bin("smd"))
            .env("SM_BCRYPT_COST", "4")
            .env("SM_DEFAULT_ADMIN_LOGIN", ADMIN_LOGIN)
            .env("SM_DEFAULT_ADMIN_PASSWORD", ADMIN_PASSWORD)
            .env("SM_DEFAULT_ADMIN_NAME", "Ana Souza")
            .env("SM_TIMEOUT_CONNECT_MS", "10000");
        CliBuilder { cmd }
    }

    /// Log in as the default admin
    pub fn login(&self) {
        self.sm()
            .args(&["login", ADMIN_LOGIN, "--password", ADMIN_PASSWORD])
            .passes();
    }
}

impl Drop for Archive {
    fn drop(&mut self) {
        let _ = self.sm().args(&["daemon", "stop"]).cmd.output();
    }
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input.to_string());
        self
    }

    /// Run and require exit code 0
    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert::from(output);
        assert!(
            run.success,
            "expected success\nstdout:\n{}\nstderr:\n{}",
            run.stdout, run.stderr
        );
        run
    }

    /// Run and require a non-zero exit code
    pub fn fails(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert::from(output);
        assert!(
            !run.success,
            "expected failure\nstdout:\n{}\nstderr:\n{}",
            run.stdout, run.stderr
        );
        run
    }
}

pub struct RunAssert {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for RunAssert {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunAssert {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {:?}\nstdout:\n{}",
            needle,
            self.stdout
        );
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(
            !self.stdout.contains(needle),
            "stdout unexpectedly has {:?}\nstdout:\n{}",
            needle,
            self.stdout
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {:?}\nstderr:\n{}",
            needle,
            self.stderr
        );
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).unwrap()
    }
}
