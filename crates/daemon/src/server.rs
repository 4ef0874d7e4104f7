// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server: one framed request and one framed reply per connection.

use sm_daemon::dispatch;
use sm_daemon::protocol::{
    self, ErrorKind, ProtocolError, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION,
};
use thiserror::Error;
use tokio::net::UnixStream;
use tracing::{debug, info, warn};

use crate::lifecycle::DaemonState;

/// Serve one client: read its request, answer it, hang up
pub async fn handle_connection(
    daemon: &mut DaemonState,
    stream: UnixStream,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let read = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await;
    let Some(response) = answer(daemon, read)? else {
        return Ok(());
    };

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

/// The reply owed for a read outcome; `None` when the client left without asking
fn answer(
    daemon: &mut DaemonState,
    read: Result<Request, ProtocolError>,
) -> Result<Option<Response>, ServerError> {
    match read {
        Ok(request) => {
            debug!(request = request.name(), "received request");
            let response =
                control(daemon, &request).unwrap_or_else(|| archive_request(daemon, request));
            Ok(Some(response))
        }
        // Well-framed but undecodable
        Err(ProtocolError::Json(e)) => {
            warn!(error = %e, "malformed request");
            Ok(Some(Response::error(
                ErrorKind::Validation,
                format!("malformed request: {}", e),
            )))
        }
        Err(ProtocolError::ConnectionClosed) => {
            debug!("client hung up before sending a request");
            Ok(None)
        }
        Err(ProtocolError::Timeout) => Err(ServerError::Timeout),
        Err(e) => Err(ServerError::Protocol(e)),
    }
}

/// Housekeeping requests answered by the daemon itself
fn control(daemon: &mut DaemonState, request: &Request) -> Option<Response> {
    let response = match request {
        Request::Ping => Response::Pong,
        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "client version differs");
            }
            Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            }
        }
        Request::Status => Response::Status {
            uptime_secs: daemon.start_time.elapsed().as_secs(),
            sessions_active: daemon.archive.sessions_active(),
        },
        Request::Shutdown => {
            info!("shutdown requested by client");
            daemon.shutdown_requested = true;
            Response::ShuttingDown
        }
        _ => return None,
    };
    Some(response)
}

fn archive_request(daemon: &DaemonState, request: Request) -> Response {
    dispatch(&daemon.archive, request)
        .unwrap_or_else(|| Response::error(ErrorKind::Validation, "unsupported request"))
}

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("timed out waiting for the request")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
