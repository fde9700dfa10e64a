/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::error::Error;
use std::sync::Arc;

use bytes::Bytes;
use log::warn;

/// Called once after the transport has been established and the connected
/// signal has fired. A returned error is reported through the on-error hook
/// but does not tear the connection down.
pub trait AfterConnectHook: Send + Sync {
    fn after_connect(&self) -> anyhow::Result<()>;
}

impl<F> AfterConnectHook for F
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    fn after_connect(&self) -> anyhow::Result<()> {
        (self)()
    }
}

/// Called once per teardown, before the disconnected signal fires and before
/// the transport handle is released. This hook only runs for teardowns that
/// go through close(), which includes teardowns triggered by read/write
/// failures. A returned error is reported but does not abort the teardown.
pub trait BeforeDisconnectHook: Send + Sync {
    fn before_disconnect(&self) -> anyhow::Result<()>;
}

impl<F> BeforeDisconnectHook for F
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    fn before_disconnect(&self) -> anyhow::Result<()> {
        (self)()
    }
}

/// Called once per non-empty read, before the payload is queued for the
/// consumer. The returned payload replaces the one read from the wire.
/// On error the original payload is still delivered, see
/// [`TcpClient`](crate::TcpClient).
pub trait AfterReadHook: Send + Sync {
    fn after_read(&self, data: Bytes) -> anyhow::Result<Bytes>;
}

impl<F> AfterReadHook for F
where
    F: Fn(Bytes) -> anyhow::Result<Bytes> + Send + Sync,
{
    fn after_read(&self, data: Bytes) -> anyhow::Result<Bytes> {
        (self)(data)
    }
}

/// Central sink for every error reported by the client, including hook
/// failures. Errors that belong to a caller are also returned to that
/// caller; this hook is for logging, metrics or reconnect policy.
pub trait OnErrorHook: Send + Sync {
    fn on_error(&self, e: &(dyn Error + 'static));
}

impl<F> OnErrorHook for F
where
    F: Fn(&(dyn Error + 'static)) + Send + Sync,
{
    fn on_error(&self, e: &(dyn Error + 'static)) {
        (self)(e)
    }
}

struct NoopHook;

impl AfterConnectHook for NoopHook {
    fn after_connect(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl BeforeDisconnectHook for NoopHook {
    fn before_disconnect(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

struct IdentityReadHook;

impl AfterReadHook for IdentityReadHook {
    fn after_read(&self, data: Bytes) -> anyhow::Result<Bytes> {
        Ok(data)
    }
}

struct LogErrorHook;

impl OnErrorHook for LogErrorHook {
    fn on_error(&self, e: &(dyn Error + 'static)) {
        warn!("connection error: {e}");
    }
}

/// The four hook slots. Unset slots default to no-op / identity / log-only
/// implementations, so callers never need to check for absence.
#[derive(Clone)]
pub struct ClientHooks {
    pub(crate) after_connect: Arc<dyn AfterConnectHook>,
    pub(crate) before_disconnect: Arc<dyn BeforeDisconnectHook>,
    pub(crate) after_read: Arc<dyn AfterReadHook>,
    pub(crate) on_error: Arc<dyn OnErrorHook>,
}

impl Default for ClientHooks {
    fn default() -> Self {
        ClientHooks {
            after_connect: Arc::new(NoopHook),
            before_disconnect: Arc::new(NoopHook),
            after_read: Arc::new(IdentityReadHook),
            on_error: Arc::new(LogErrorHook),
        }
    }
}

impl ClientHooks {
    pub fn set_after_connect(&mut self, hook: Arc<dyn AfterConnectHook>) {
        self.after_connect = hook;
    }

    pub fn set_before_disconnect(&mut self, hook: Arc<dyn BeforeDisconnectHook>) {
        self.before_disconnect = hook;
    }

    pub fn set_after_read(&mut self, hook: Arc<dyn AfterReadHook>) {
        self.after_read = hook;
    }

    pub fn set_on_error(&mut self, hook: Arc<dyn OnErrorHook>) {
        self.on_error = hook;
    }

    pub(crate) fn report(&self, e: &(dyn Error + 'static)) {
        self.on_error.on_error(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_slots() {
        let hooks = ClientHooks::default();
        assert!(hooks.after_connect.after_connect().is_ok());
        assert!(hooks.before_disconnect.before_disconnect().is_ok());
        let data = Bytes::from_static(b"payload");
        let out = hooks.after_read.after_read(data.clone()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn closure_slots() {
        let mut hooks = ClientHooks::default();
        hooks.set_after_read(Arc::new(|data: Bytes| -> anyhow::Result<Bytes> {
            let mut v = data.to_vec();
            v.reverse();
            Ok(Bytes::from(v))
        }));
        let out = hooks
            .after_read
            .after_read(Bytes::from_static(b"abc"))
            .unwrap();
        assert_eq!(out.as_ref(), b"cba");
    }
}
