// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routes archive requests to the service.
//!
//! Payloads are validated before the session gate runs, so a malformed
//! request from an unauthenticated client still reports what is wrong.

use crate::protocol::{Request, Response};
use crate::service::{Archive, ServiceError};
use crate::validate;
use sm_core::{Clock, TokenGen};
use tracing::{debug, warn};

impl From<ServiceError> for Response {
    fn from(err: ServiceError) -> Self {
        Response::error(err.kind(), err.to_string())
    }
}

fn respond<T>(result: Result<T, ServiceError>, ok: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(value) => ok(value),
        Err(err) => err.into(),
    }
}

/// Handle an archive request. Daemon control requests (ping, hello, status,
/// shutdown) belong to the server loop and are answered with `None`.
pub fn dispatch<G: TokenGen, C: Clock>(archive: &Archive<G, C>, request: Request) -> Option<Response> {
    let name = request.name();
    if let Some(Err(err)) = request.token().map(validate::token) {
        return Some(ServiceError::from(err).into());
    }
    let response = match request {
        Request::Ping | Request::Hello { .. } | Request::Status | Request::Shutdown => return None,

        Request::Login { login, password } => respond(
            validate::credentials(&login, &password)
                .map_err(ServiceError::from)
                .and_then(|credentials| archive.login(&credentials)),
            |session| Response::Session { session },
        ),

        Request::Session { token } => {
            respond(archive.session(&token), |session| Response::Session { session })
        }

        Request::Logout { token } => {
            archive.logout(&token);
            Response::Ok
        }

        Request::ListUnits { token } => {
            respond(archive.list_units(&token), |units| Response::Units { units })
        }

        Request::CreateUnit { token, unit } => respond(
            unit.validate()
                .map_err(ServiceError::from)
                .and_then(|unit| archive.create_unit(&token, &unit)),
            |(unit, snapshot)| Response::UnitCreated { unit, snapshot },
        ),

        Request::ListMovements { token, limit } => respond(
            archive.list_movements(&token, limit),
            |movements| Response::Movements { movements },
        ),

        Request::RecordMovement { token, movement } => respond(
            movement
                .validate()
                .map_err(ServiceError::from)
                .and_then(|movement| archive.record_movement(&token, &movement)),
            |(movement, snapshot)| Response::MovementRecorded { movement, snapshot },
        ),
    };

    match &response {
        Response::Error { kind, message } => warn!(request = name, ?kind, %message, "request failed"),
        _ => debug!(request = name, "request handled"),
    }
    Some(response)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
