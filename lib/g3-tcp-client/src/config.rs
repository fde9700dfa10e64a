/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use rustls_pki_types::ServerName;

use crate::error::ConfigError;

#[cfg(feature = "yaml")]
mod yaml;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3600);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_BUFFER_SIZE: usize = 16 * 1024;

#[derive(Clone)]
pub(crate) struct TlsConnect {
    pub(crate) driver: Arc<rustls::ClientConfig>,
    pub(crate) name: ServerName<'static>,
}

/// Builder for [`ClientConfig`]. Zero-valued timeout and buffer fields get
/// the documented defaults at build time.
#[derive(Clone, Default)]
pub struct ClientConfigBuilder {
    endpoint: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    write_timeout: Duration,
    read_buffer_size: usize,
    tls_client: Option<Arc<rustls::ClientConfig>>,
    tls_name: Option<ServerName<'static>>,
}

impl ClientConfigBuilder {
    pub fn new<T: Into<String>>(endpoint: T) -> Self {
        ClientConfigBuilder {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn set_endpoint<T: Into<String>>(&mut self, endpoint: T) {
        self.endpoint = endpoint.into();
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.write_timeout = timeout;
    }

    pub fn set_read_buffer_size(&mut self, size: usize) {
        self.read_buffer_size = size;
    }

    pub fn set_tls_client(&mut self, tls: Arc<rustls::ClientConfig>) {
        self.tls_client = Some(tls);
    }

    pub fn set_tls_name(&mut self, name: ServerName<'static>) {
        self.tls_name = Some(name);
    }

    pub fn build(&self) -> Result<ClientConfig, ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }

        let mut config = ClientConfig {
            endpoint: self.endpoint.clone(),
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            read_buffer_size: self.read_buffer_size,
            tls: None,
        };
        if config.connect_timeout.is_zero() {
            config.connect_timeout = DEFAULT_CONNECT_TIMEOUT;
        }
        if config.read_timeout.is_zero() {
            config.read_timeout = DEFAULT_READ_TIMEOUT;
        }
        if config.write_timeout.is_zero() {
            config.write_timeout = DEFAULT_WRITE_TIMEOUT;
        }
        if config.read_buffer_size == 0 {
            config.read_buffer_size = DEFAULT_READ_BUFFER_SIZE;
        }

        if let Some(driver) = &self.tls_client {
            let name = if let Some(name) = &self.tls_name {
                name.clone()
            } else {
                let host = endpoint_host(&self.endpoint);
                ServerName::try_from(host.to_string())
                    .map_err(|_| ConfigError::InvalidTlsName(host.to_string()))?
            };
            config.tls = Some(TlsConnect {
                driver: driver.clone(),
                name,
            });
        }

        Ok(config)
    }
}

/// Effective configuration for one client. Build via [`ClientConfigBuilder`].
#[derive(Clone)]
pub struct ClientConfig {
    endpoint: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    write_timeout: Duration,
    read_buffer_size: usize,
    tls: Option<TlsConnect>,
}

impl ClientConfig {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    pub fn use_tls(&self) -> bool {
        self.tls.is_some()
    }

    pub(crate) fn tls(&self) -> Option<&TlsConnect> {
        self.tls.as_ref()
    }
}

fn endpoint_host(endpoint: &str) -> &str {
    let host = match endpoint.rsplit_once(':') {
        Some((host, _port)) => host,
        None => endpoint,
    };
    // strip brackets from ipv6 host:port form
    host.trim_start_matches('[').trim_end_matches(']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_endpoint() {
        let builder = ClientConfigBuilder::default();
        assert!(matches!(
            builder.build(),
            Err(ConfigError::EmptyEndpoint)
        ));
    }

    #[test]
    fn default_values() {
        let config = ClientConfigBuilder::new("127.0.0.1:5555").build().unwrap();
        assert_eq!(config.endpoint(), "127.0.0.1:5555");
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.read_timeout(), Duration::from_secs(3600));
        assert_eq!(config.write_timeout(), Duration::from_secs(5));
        assert_eq!(config.read_buffer_size(), 16 * 1024);
        assert!(!config.use_tls());
    }

    #[test]
    fn explicit_values() {
        let mut builder = ClientConfigBuilder::new("localhost:5555");
        builder.set_connect_timeout(Duration::from_secs(8));
        builder.set_read_timeout(Duration::from_secs(2));
        builder.set_write_timeout(Duration::from_secs(4));
        builder.set_read_buffer_size(2 * 1024);
        let config = builder.build().unwrap();
        assert_eq!(config.connect_timeout(), Duration::from_secs(8));
        assert_eq!(config.read_timeout(), Duration::from_secs(2));
        assert_eq!(config.write_timeout(), Duration::from_secs(4));
        assert_eq!(config.read_buffer_size(), 2 * 1024);
    }

    #[test]
    fn host_for_tls_name() {
        assert_eq!(endpoint_host("example.net:443"), "example.net");
        assert_eq!(endpoint_host("127.0.0.1:443"), "127.0.0.1");
        assert_eq!(endpoint_host("[::1]:443"), "::1");
    }
}
