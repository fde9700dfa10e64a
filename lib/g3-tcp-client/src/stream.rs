/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::config::ClientConfig;
use crate::error::ConnectError;

pub(crate) enum MaybeTlsStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for MaybeTlsStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeTlsStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_flush(cx),
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Resolve the endpoint and try each address in turn until one connects.
async fn tcp_connect(config: &ClientConfig) -> Result<TcpStream, ConnectError> {
    let addrs = tokio::net::lookup_host(config.endpoint())
        .await
        .map_err(ConnectError::ResolveFailed)?;
    let mut last_err: Option<io::Error> = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(e) => Err(ConnectError::ConnectIoError(e)),
        None => Err(ConnectError::NoAddressResolved),
    }
}

/// Dial a plain or encrypted stream to the configured endpoint. Resolution
/// and the tcp connect attempts share one connect timeout; the optional tls
/// handshake gets its own.
pub(crate) async fn connect_to(config: &ClientConfig) -> Result<MaybeTlsStream, ConnectError> {
    let stream = match tokio::time::timeout(config.connect_timeout(), tcp_connect(config)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(ConnectError::ConnectTimedOut),
    };

    let Some(tls) = config.tls() else {
        return Ok(MaybeTlsStream::Plain(stream));
    };

    let connector = TlsConnector::from(tls.driver.clone());
    match tokio::time::timeout(
        config.connect_timeout(),
        connector.connect(tls.name.clone(), stream),
    )
    .await
    {
        Ok(Ok(stream)) => Ok(MaybeTlsStream::Tls(Box::new(stream))),
        Ok(Err(e)) => Err(ConnectError::TlsHandshakeFailed(e)),
        Err(_) => Err(ConnectError::TlsHandshakeTimedOut),
    }
}
