/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod config;
pub use config::{
    ClientConfig, ClientConfigBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_BUFFER_SIZE,
    DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
};

mod error;
pub use error::{ConfigError, ConnectError, HookError, ReadError, WriteError};

mod hooks;
pub use hooks::{AfterConnectHook, AfterReadHook, BeforeDisconnectHook, ClientHooks, OnErrorHook};

mod signal;
pub use signal::Signal;

mod stream;

mod client;
pub use client::TcpClient;
