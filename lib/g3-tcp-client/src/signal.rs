/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use tokio::sync::watch;

/// The firing side of a one-shot broadcast signal. Owned by the client,
/// rebuilt on every epoch reset.
#[derive(Clone)]
pub(crate) struct SignalSource {
    sender: watch::Sender<bool>,
}

impl SignalSource {
    pub(crate) fn new() -> Self {
        let (sender, _) = watch::channel(false);
        SignalSource { sender }
    }

    /// Mark the signal as fired. Irreversible within the epoch, safe to call
    /// more than once.
    pub(crate) fn fire(&self) {
        self.sender.send_replace(true);
    }

    pub(crate) fn subscribe(&self) -> Signal {
        Signal {
            receiver: self.sender.subscribe(),
        }
    }
}

/// The listening side of a one-shot broadcast signal. Any number of
/// subscribers may hold one; a subscriber that checks after the fire always
/// observes the fired state.
#[derive(Clone)]
pub struct Signal {
    receiver: watch::Receiver<bool>,
}

impl Signal {
    pub fn is_fired(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait until the signal fires. Returns immediately if it already has.
    pub async fn wait(&mut self) {
        if self.receiver.wait_for(|fired| *fired).await.is_err() {
            // the epoch was discarded without this signal ever firing,
            // so there is nothing left to wait for
            std::future::pending::<()>().await;
        }
    }
}
