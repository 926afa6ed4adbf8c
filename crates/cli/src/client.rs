// SPDX-License-Identifier: MIT

//! Thin client for talking to `spindled` over its Unix socket.

use std::fmt;

use spindle_wire::{read_response, write_request, ProtocolError, Request, Response};
use tokio::net::UnixStream;

#[derive(Debug)]
pub enum ClientError {
    NotRunning,
    Protocol(ProtocolError),
    Timeout,
    Unexpected(Response),
}

impl ClientError {
    pub fn is_not_running(&self) -> bool {
        matches!(self, Self::NotRunning)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRunning => write!(f, "daemon is not running"),
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
            Self::Timeout => write!(f, "daemon did not respond in time"),
            Self::Unexpected(r) => write!(f, "unexpected response: {r:?}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ProtocolError> for ClientError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    /// Connects to the daemon's Unix socket under the resolved state dir.
    pub async fn connect() -> Result<Self, ClientError> {
        let state_dir = crate::env::state_dir().map_err(|_| ClientError::NotRunning)?;
        let sock_path = state_dir.join("spindled.sock");
        let stream = UnixStream::connect(&sock_path).await.map_err(|_| ClientError::NotRunning)?;
        Ok(Self { stream })
    }

    /// Sends a request and waits for the matching response, bounded by
    /// `SPINDLE_IPC_TIMEOUT_MS`.
    pub async fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        tokio::time::timeout(crate::env::ipc_timeout(), self.roundtrip(request))
            .await
            .map_err(|_| ClientError::Timeout)?
    }

    async fn roundtrip(&mut self, request: &Request) -> Result<Response, ClientError> {
        write_request(&mut self.stream, request).await?;
        Ok(read_response(&mut self.stream).await?)
    }

    /// Like [`Self::send`] but collapses any non-`Ok` response into an error —
    /// for requests whose only meaningful success payload is "it happened".
    pub async fn send_simple(&mut self, request: &Request) -> Result<(), ClientError> {
        match self.send(request).await? {
            Response::Ok => Ok(()),
            other => Err(ClientError::Unexpected(other)),
        }
    }
}
