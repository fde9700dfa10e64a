/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::time::timeout;

use crate::config::ClientConfig;
use crate::error::{ConnectError, HookError, ReadError, WriteError};
use crate::hooks::ClientHooks;
use crate::signal::{Signal, SignalSource};
use crate::stream::{self, MaybeTlsStream};

const INBOUND_QUEUE_SIZE: usize = 4;

/// Everything that is rebuilt when a new epoch starts. The one-shot signals
/// and the inbound queue of the previous epoch stay valid for whoever still
/// holds them, but fire/deliver nothing new.
struct EpochState {
    id: u64,
    connected: SignalSource,
    disconnected: SignalSource,
    inbound_tx: mpsc::Sender<Bytes>,
    inbound_rx: Option<mpsc::Receiver<Bytes>>,
    active: bool,
    closed: bool,
}

impl EpochState {
    fn new(id: u64) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_SIZE);
        EpochState {
            id,
            connected: SignalSource::new(),
            disconnected: SignalSource::new(),
            inbound_tx,
            inbound_rx: Some(inbound_rx),
            active: false,
            closed: false,
        }
    }
}

struct ClientInner {
    config: ClientConfig,
    hooks: ClientHooks,
    state: Mutex<EpochState>,
    // serializes connect() callers; the flag records that this epoch has
    // already spent its single dial attempt
    dial: AsyncMutex<bool>,
    // serializes teardown so that late close() callers return only after
    // the winning teardown has finished
    closer: AsyncMutex<()>,
    writer: AsyncMutex<Option<WriteHalf<MaybeTlsStream>>>,
}

/// Manager for a single long-lived tcp (or tls over tcp) connection.
///
/// Cheap to clone; all clones drive the same connection. One task per epoch
/// reads from the stream and feeds the inbound queue, while writers call
/// [`write`](Self::write) directly from their own task. State changes are
/// broadcast through the one-shot [`connected`](Self::connected) and
/// [`disconnected`](Self::disconnected) signals.
#[derive(Clone)]
pub struct TcpClient {
    inner: Arc<ClientInner>,
}

impl TcpClient {
    pub fn new(config: ClientConfig, hooks: ClientHooks) -> Self {
        TcpClient {
            inner: Arc::new(ClientInner {
                config,
                hooks,
                state: Mutex::new(EpochState::new(0)),
                dial: AsyncMutex::new(false),
                closer: AsyncMutex::new(()),
                writer: AsyncMutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn endpoint(&self) -> &str {
        self.inner.config.endpoint()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.inner.config.connect_timeout()
    }

    pub fn read_timeout(&self) -> Duration {
        self.inner.config.read_timeout()
    }

    pub fn write_timeout(&self) -> Duration {
        self.inner.config.write_timeout()
    }

    pub fn read_buffer_size(&self) -> usize {
        self.inner.config.read_buffer_size()
    }

    /// Whether a transport handle is held and close() has not run this epoch.
    pub fn is_active(&self) -> bool {
        self.inner.state.lock().unwrap().active
    }

    /// Fires once the transport for the current epoch is established.
    pub fn connected(&self) -> Signal {
        self.inner.state.lock().unwrap().connected.subscribe()
    }

    /// Fires once the current epoch is torn down, before the transport
    /// handle is released.
    pub fn disconnected(&self) -> Signal {
        self.inner.state.lock().unwrap().disconnected.subscribe()
    }

    /// Take the receiving end of the inbound queue for the current epoch.
    /// There is only one; later calls within the epoch return None.
    pub fn take_inbound(&self) -> Option<mpsc::Receiver<Bytes>> {
        self.inner.state.lock().unwrap().inbound_rx.take()
    }

    /// Establish the connection. Only the first call per epoch dials;
    /// concurrent callers wait for that attempt and later calls return Ok
    /// without side effects, even if the dial failed. Use
    /// [`reconnect`](Self::reconnect) to retry after a failure.
    ///
    /// Do not race this with [`close`](Self::close): a teardown that runs
    /// while the dial is still in flight may spend the epoch's one-shot
    /// close before the transport handle exists, leaving the handle to drop
    /// with the client instead of being released.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let mut dialed = self.inner.dial.lock().await;
        if *dialed {
            return Ok(());
        }
        *dialed = true;

        let stream = match stream::connect_to(&self.inner.config).await {
            Ok(stream) => stream,
            Err(e) => {
                self.inner.hooks.report(&e);
                return Err(e);
            }
        };
        debug!("connected to {}", self.inner.config.endpoint());

        let (r, w) = tokio::io::split(stream);
        *self.inner.writer.lock().await = Some(w);

        // the handle is fully visible before the connected signal fires
        let (epoch, inbound_tx, disconnected) = {
            let mut state = self.inner.state.lock().unwrap();
            state.active = true;
            (
                state.id,
                state.inbound_tx.clone(),
                state.disconnected.subscribe(),
            )
        };

        let client = self.clone();
        tokio::spawn(async move {
            client.read_loop(epoch, r, inbound_tx, disconnected).await;
        });

        self.inner.state.lock().unwrap().connected.fire();

        if let Err(e) = self.inner.hooks.after_connect.after_connect() {
            self.inner.hooks.report(&HookError(e));
        }
        Ok(())
    }

    /// Send data to the endpoint. Returns without blocking if the
    /// connection is inactive; nothing is queued for later delivery. A
    /// failed or timed out write tears the connection down.
    pub async fn write(&self, data: &[u8]) -> Result<(), WriteError> {
        let epoch = {
            let state = self.inner.state.lock().unwrap();
            if !state.active {
                drop(state);
                let e = WriteError::NotActive;
                self.inner.hooks.report(&e);
                return Err(e);
            }
            state.id
        };

        let mut writer = self.inner.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            drop(writer);
            let e = WriteError::NotConnected;
            self.inner.hooks.report(&e);
            return Err(e);
        };

        let ret = match timeout(self.inner.config.write_timeout(), async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(WriteError::WriteIoError(e)),
            Err(_) => Err(WriteError::WriteTimedOut),
        };
        drop(writer);

        if let Err(e) = ret {
            self.inner.hooks.report(&e);
            // the stream is in an unknown state now, tear it down
            let client = self.clone();
            tokio::spawn(async move { client.close_epoch(epoch).await });
            return Err(e);
        }
        Ok(())
    }

    /// Tear the connection down. Safe to call repeatedly and concurrently;
    /// the teardown side effects run exactly once per epoch. Writes are
    /// blocked first, then the before-disconnect hook runs, the
    /// disconnected signal fires, and finally the transport handle is
    /// released.
    pub async fn close(&self) {
        let epoch = self.inner.state.lock().unwrap().id;
        self.close_epoch(epoch).await
    }

    /// Teardown bound to one epoch, so that a stale teardown (e.g. a read
    /// loop outliving a reconnect) cannot touch a newer epoch.
    async fn close_epoch(&self, epoch: u64) {
        let _guard = self.inner.closer.lock().await;

        let disconnected = {
            let mut state = self.inner.state.lock().unwrap();
            if state.id != epoch || state.closed {
                return;
            }
            state.closed = true;
            state.active = false;
            state.disconnected.clone()
        };

        if let Err(e) = self.inner.hooks.before_disconnect.before_disconnect() {
            self.inner.hooks.report(&HookError(e));
        }

        disconnected.fire();

        let mut writer = self.inner.writer.lock().await;
        if let Some(mut stream) = writer.take() {
            let _ = stream.shutdown().await;
        }
        debug!("connection to {} closed", self.inner.config.endpoint());
    }

    /// Alias for [`close`](Self::close).
    pub async fn disconnect(&self) {
        self.close().await
    }

    /// Tear down the current epoch, rebuild the one-shot signals, the
    /// inbound queue and the epoch guards, then connect again. Not safe to
    /// call concurrently with itself or with a racing
    /// [`connect`](Self::connect)/[`close`](Self::close) pair; serialize
    /// lifecycle transitions.
    pub async fn reconnect(&self) -> Result<(), ConnectError> {
        self.close().await;

        {
            // both guards held so the old epoch cannot interleave with the
            // new signals
            let mut dialed = self.inner.dial.lock().await;
            let mut state = self.inner.state.lock().unwrap();
            let next = state.id + 1;
            *state = EpochState::new(next);
            *dialed = false;
        }

        self.connect().await
    }

    async fn read_loop(
        self,
        epoch: u64,
        mut reader: ReadHalf<MaybeTlsStream>,
        queue: mpsc::Sender<Bytes>,
        mut disconnected: Signal,
    ) {
        let mut buffer = vec![0u8; self.inner.config.read_buffer_size()];
        loop {
            let r = tokio::select! {
                biased;
                _ = disconnected.wait() => break,
                r = timeout(self.inner.config.read_timeout(), reader.read(&mut buffer)) => r,
            };
            match r {
                Ok(Ok(0)) => {
                    let e = ReadError::ClosedByPeer;
                    self.inner.hooks.report(&e);
                    break;
                }
                Ok(Ok(n)) => {
                    // detach from the reusable buffer before handing out
                    let data = Bytes::copy_from_slice(&buffer[..n]);
                    if !self.queue_inbound(data, &queue).await {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    let e = ReadError::ReadIoError(e);
                    self.inner.hooks.report(&e);
                    break;
                }
                Err(_) => {
                    let e = ReadError::ReadTimedOut;
                    self.inner.hooks.report(&e);
                    break;
                }
            }
        }
        self.close_epoch(epoch).await;
    }

    /// Run the after-read hook and queue the payload. A hook error is
    /// reported but the unchanged payload is still delivered. Returns false
    /// once the consumer side is gone.
    async fn queue_inbound(&self, data: Bytes, queue: &mpsc::Sender<Bytes>) -> bool {
        if data.is_empty() {
            return true;
        }
        let data = match self.inner.hooks.after_read.after_read(data.clone()) {
            Ok(data) => data,
            Err(e) => {
                self.inner.hooks.report(&HookError(e));
                data
            }
        };
        // a full queue blocks here, which in turn stalls further reads;
        // this is the only flow control
        queue.send(data).await.is_ok()
    }
}
