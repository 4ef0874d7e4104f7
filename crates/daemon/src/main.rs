// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shelfmark Daemon (smd)
//!
//! Background process that owns the archive store and serves clients over a
//! Unix socket, one request per connection, until a signal or a `Shutdown`
//! request stops it.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lifecycle;
mod server;

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use sm_daemon::paths::{LOG_FILE, STARTUP_MARKER_PREFIX};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use crate::lifecycle::{Config, DaemonState, LifecycleError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The CLI passes the absolute state dir; otherwise resolve it from the environment
    let config = Config::from_env(std::env::args_os().nth(1).map(PathBuf::from))?;

    let startup_log = StartupLog::begin(&config)?;
    let _log_guard = setup_logging(&config);
    info!(state_dir = %config.state_dir.display(), "starting smd");

    let mut daemon = match lifecycle::startup(&config) {
        Ok(daemon) => daemon,
        Err(e) => {
            startup_log.failed(&e);
            error!("Failed to start daemon: {}", e);
            return Err(e.into());
        }
    };

    let stop = serve(&mut daemon).await?;
    info!(reason = %stop, "stopping");
    daemon.shutdown();
    info!("Daemon stopped");
    Ok(())
}

/// Why the accept loop ended
enum Stop {
    Signal(&'static str),
    Requested,
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stop::Signal(name) => write!(f, "received {}", name),
            Stop::Requested => f.write_str("shutdown requested by client"),
        }
    }
}

/// Accept clients one at a time until told to stop
async fn serve(daemon: &mut DaemonState) -> std::io::Result<Stop> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %daemon.config.socket_path.display(), "Daemon ready");
    // The CLI waits for this line before connecting
    println!("READY");

    while !daemon.shutdown_requested {
        tokio::select! {
            accepted = daemon.listener.accept() => match accepted {
                Ok((stream, _)) => {
                    if let Err(e) = server::handle_connection(daemon, stream).await {
                        error!("Error handling connection: {}", e);
                    }
                }
                Err(e) => error!("Error accepting connection: {}", e),
            },
            _ = sigterm.recv() => return Ok(Stop::Signal("SIGTERM")),
            _ = sigint.recv() => return Ok(Stop::Signal("SIGINT")),
        }
    }
    Ok(Stop::Requested)
}

/// Plain lines the CLI scans for in the daemon log
struct StartupLog {
    path: PathBuf,
}

impl StartupLog {
    /// Append the marker that opens this startup attempt
    fn begin(config: &Config) -> Result<Self, LifecycleError> {
        std::fs::create_dir_all(&config.state_dir)?;
        let log = StartupLog {
            path: config.log_path.clone(),
        };
        log.append(&format!("{}{})", STARTUP_MARKER_PREFIX, std::process::id()))?;
        Ok(log)
    }

    /// Written synchronously: the tracing writer may not flush before exit
    fn failed(&self, error: &LifecycleError) {
        let _ = self.append(&format!("ERROR Failed to start daemon: {}", error));
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

fn setup_logging(config: &Config) -> WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let appender = tracing_appender::rolling::never(&config.state_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer))
        .init();

    guard
}
