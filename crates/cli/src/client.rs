// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use sm_core::{Movement, StorageUnit};
use sm_daemon::paths;
use sm_daemon::protocol::{self, ProtocolError};
use sm_daemon::{ErrorKind, MovementPayload, Request, Response, SessionInfo, UnitPayload};
use thiserror::Error;
use tokio::net::UnixStream;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("SM_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("SM_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for process to exit
pub fn timeout_exit() -> Duration {
    parse_duration_ms("SM_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("SM_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,
}

impl ClientError {
    /// The daemon refused the request for lack of a valid session
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ClientError::Rejected {
                kind: ErrorKind::Auth,
                ..
            }
        )
    }
}

/// Turn an error envelope into `Rejected`; anything else is unexpected
fn rejected(response: Response) -> ClientError {
    match response {
        Response::Error { kind, message } => ClientError::Rejected { kind, message },
        _ => ClientError::UnexpectedResponse,
    }
}

/// Resolve the state directory: explicit flag, else the environment.
/// Relative paths are made absolute so the daemon and CLI agree on the socket.
pub fn resolve_state_dir(explicit: Option<PathBuf>) -> Result<PathBuf, ClientError> {
    let dir = explicit
        .or_else(paths::state_dir)
        .ok_or(ClientError::NoStateDir)?;
    if dir.is_absolute() {
        Ok(dir)
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to daemon, auto-starting if not running
    pub async fn connect_or_start(state_dir: &Path) -> Result<Self, ClientError> {
        // Restart a daemon left over from a different version
        if let Ok(daemon_version) = std::fs::read_to_string(state_dir.join(paths::VERSION_FILE)) {
            if daemon_version.trim() != env!("CARGO_PKG_VERSION") {
                let _ = daemon_stop(state_dir).await;
            }
        }

        match Self::connect(state_dir) {
            Ok(client) => Ok(client),
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background(state_dir)?;
                Self::connect_with_retry(state_dir, timeout_connect(), child).await
            }
            Err(e) => Err(wrap_with_startup_error(e, state_dir)),
        }
    }

    /// Connect to existing daemon (no auto-start)
    pub fn connect(state_dir: &Path) -> Result<Self, ClientError> {
        let socket_path = paths::socket_path(state_dir);

        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }

        // A socket left behind by a killed daemon
        if let Some(pid) = read_daemon_pid(state_dir) {
            if !process_exists(pid) {
                return Err(ClientError::DaemonNotRunning);
            }
        }

        Ok(Self { socket_path })
    }

    async fn connect_with_retry(
        state_dir: &Path,
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            // Check if daemon process exited early (startup failure)
            if let Ok(Some(status)) = child.try_wait() {
                // Poll for startup error in log (filesystem may need to sync)
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_exit() {
                    if let Some(err) = read_startup_error(state_dir) {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    tokio::time::sleep(poll_interval()).await;
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "exited with {}",
                    status
                )));
            }

            match Self::connect(state_dir) {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => {
                    tokio::time::sleep(poll_interval()).await;
                }
                Err(e) => return Err(wrap_with_startup_error(e, state_dir)),
            }
        }

        Err(wrap_with_startup_error(
            ClientError::DaemonStartTimeout,
            state_dir,
        ))
    }

    /// Send a request and receive a response with specific timeouts
    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        Ok(protocol::decode(&response_bytes)?)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
    }

    /// Get daemon status: uptime in seconds and active session count
    pub async fn status(&self) -> Result<(u64, usize), ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status {
                uptime_secs,
                sessions_active,
            } => Ok((uptime_secs, sessions_active)),
            other => Err(rejected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Err(rejected(other)),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Err(rejected(other)),
        }
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<SessionInfo, ClientError> {
        let request = Request::Login {
            login: login.to_string(),
            password: password.to_string(),
        };
        match self.send(&request).await? {
            Response::Session { session } => Ok(session),
            other => Err(rejected(other)),
        }
    }

    pub async fn session(&self, token: &str) -> Result<SessionInfo, ClientError> {
        let request = Request::Session {
            token: token.to_string(),
        };
        match self.send(&request).await? {
            Response::Session { session } => Ok(session),
            other => Err(rejected(other)),
        }
    }

    pub async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let request = Request::Logout {
            token: token.to_string(),
        };
        match self.send(&request).await? {
            Response::Ok => Ok(()),
            other => Err(rejected(other)),
        }
    }

    pub async fn list_units(&self, token: &str) -> Result<Vec<StorageUnit>, ClientError> {
        let request = Request::ListUnits {
            token: token.to_string(),
        };
        match self.send(&request).await? {
            Response::Units { units } => Ok(units),
            other => Err(rejected(other)),
        }
    }

    pub async fn create_unit(
        &self,
        token: &str,
        unit: UnitPayload,
    ) -> Result<(StorageUnit, sm_core::Snapshot), ClientError> {
        let request = Request::CreateUnit {
            token: token.to_string(),
            unit,
        };
        match self.send(&request).await? {
            Response::UnitCreated { unit, snapshot } => Ok((unit, snapshot)),
            other => Err(rejected(other)),
        }
    }

    pub async fn list_movements(
        &self,
        token: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Movement>, ClientError> {
        let request = Request::ListMovements {
            token: token.to_string(),
            limit,
        };
        match self.send(&request).await? {
            Response::Movements { movements } => Ok(movements),
            other => Err(rejected(other)),
        }
    }

    pub async fn record_movement(
        &self,
        token: &str,
        movement: MovementPayload,
    ) -> Result<(Movement, sm_core::Snapshot), ClientError> {
        let request = Request::RecordMovement {
            token: token.to_string(),
            movement,
        };
        match self.send(&request).await? {
            Response::MovementRecorded { movement, snapshot } => Ok((movement, snapshot)),
            other => Err(rejected(other)),
        }
    }
}

/// Start the daemon in the background, returning the child process handle
fn start_daemon_background(state_dir: &Path) -> Result<std::process::Child, ClientError> {
    let smd_path = find_smd_binary();

    Command::new(&smd_path)
        .arg(state_dir)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {}", smd_path.display(), e)))
}

/// Stop the daemon (graceful first, then forceful)
/// Returns true if daemon was stopped, false if it wasn't running
pub async fn daemon_stop(state_dir: &Path) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect(state_dir) {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            cleanup_stale_files(state_dir);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let shutdown_result = client.shutdown().await;

    if let Some(pid) = read_daemon_pid(state_dir) {
        if shutdown_result.is_ok() {
            wait_for_exit(pid, timeout_exit()).await;
        }

        // Force kill if still running
        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    cleanup_stale_files(state_dir);

    Ok(true)
}

/// Wait for a process to exit
async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(poll_interval()).await;
    }
    false
}

/// Find the smd binary
fn find_smd_binary() -> PathBuf {
    // Explicit override (used by tests to ensure correct binary)
    if let Ok(path) = std::env::var("SM_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    // Check current executable's directory
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("smd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    // Fall back to PATH lookup
    PathBuf::from("smd")
}

/// Remove files a dead daemon left behind. Only called once the daemon is
/// known to be gone, never while one may still be starting.
fn cleanup_stale_files(state_dir: &Path) {
    for path in [
        state_dir.join(paths::PID_FILE),
        state_dir.join(paths::VERSION_FILE),
        paths::socket_path(state_dir),
    ] {
        if path.exists() {
            let _ = std::fs::remove_file(&path);
        }
    }
}

/// Get the PID from the daemon PID file, if it exists
pub fn read_daemon_pid(state_dir: &Path) -> Option<u32> {
    std::fs::read_to_string(state_dir.join(paths::PID_FILE))
        .ok()
        .and_then(|content| content.trim().parse::<u32>().ok())
}

/// Check if a process with the given PID exists
pub fn process_exists(pid: u32) -> bool {
    // Use kill -0 to check if process exists without sending a signal
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Force kill a daemon process
pub fn force_kill_daemon(pid: u32) -> bool {
    Command::new("kill")
        .args(["-9", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Read daemon log from the last startup marker, looking for errors.
/// Returns the error message if found, None otherwise.
pub fn read_startup_error(state_dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(state_dir.join(paths::LOG_FILE)).ok()?;
    startup_error_in(&content)
}

fn startup_error_in(log: &str) -> Option<String> {
    let start_pos = log.rfind(paths::STARTUP_MARKER_PREFIX)?;
    let startup_log = &log[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    // Format: "timestamp LEVEL target: message"; keep the message
    let messages: Vec<String> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg.to_string()))
        .collect();

    if messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(messages.join("\n"))
    }
}

/// Wrap an error with startup log info if available
fn wrap_with_startup_error(err: ClientError, state_dir: &Path) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }

    match read_startup_error(state_dir) {
        Some(startup_error) => ClientError::DaemonStartFailed(startup_error),
        None => err,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
