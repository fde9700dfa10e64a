/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint (empty string)")]
    EmptyEndpoint,
    #[error("invalid tls server name {0:?}")]
    InvalidTlsName(String),
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to resolve endpoint: {0:?}")]
    ResolveFailed(io::Error),
    #[error("no address resolved for endpoint")]
    NoAddressResolved,
    #[error("connect failed: {0:?}")]
    ConnectIoError(io::Error),
    #[error("timed out to connect")]
    ConnectTimedOut,
    #[error("tls handshake failed: {0:?}")]
    TlsHandshakeFailed(io::Error),
    #[error("timed out to finish tls handshake")]
    TlsHandshakeTimedOut,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("connection is not active and data was not sent")]
    NotActive,
    #[error("no transport handle to write to")]
    NotConnected,
    #[error("write failed: {0:?}")]
    WriteIoError(io::Error),
    #[error("timed out to write")]
    WriteTimedOut,
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("read failed: {0:?}")]
    ReadIoError(io::Error),
    #[error("timed out to read")]
    ReadTimedOut,
    #[error("connection closed by peer")]
    ClosedByPeer,
}

/// Reported when one of the lifecycle hooks fails. Never fatal to the
/// operation that triggered the hook.
#[derive(Debug, Error)]
#[error("hook failed: {0}")]
pub struct HookError(pub anyhow::Error);
