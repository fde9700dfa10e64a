/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use yaml_rust::Yaml;

use super::ClientConfigBuilder;

impl ClientConfigBuilder {
    /// Parse a client config from a yaml map. TLS material is not loaded
    /// here; set it on the returned builder.
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = v {
            let mut builder = ClientConfigBuilder::default();
            for (k, v) in map.iter() {
                let Yaml::String(k) = k else {
                    return Err(anyhow!("invalid key type, expect string"));
                };
                builder
                    .set_by_yaml_kv(k, v)
                    .context(format!("invalid value for key {k}"))?;
            }
            Ok(builder)
        } else {
            Err(anyhow!(
                "yaml value type for 'tcp client config' should be 'map'"
            ))
        }
    }

    fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match k {
            "endpoint" | "address" | "addr" => {
                self.set_endpoint(as_string(v)?);
                Ok(())
            }
            "connect_timeout" | "connection_timeout" => {
                self.set_connect_timeout(as_duration(v)?);
                Ok(())
            }
            "read_timeout" => {
                self.set_read_timeout(as_duration(v)?);
                Ok(())
            }
            "write_timeout" => {
                self.set_write_timeout(as_duration(v)?);
                Ok(())
            }
            "read_buffer_size" => {
                self.set_read_buffer_size(as_usize(v)?);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }
}

fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.to_string()),
        _ => Err(anyhow!("yaml value type should be 'string'")),
    }
}

fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::Integer(i) => {
            usize::try_from(*i).map_err(|_| anyhow!("out of range integer value"))
        }
        _ => Err(anyhow!("yaml value type should be 'integer'")),
    }
}

fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(value) => match humanize_rs::duration::parse(value) {
            Ok(v) => Ok(v),
            Err(ParseError::MissingUnit) => {
                if let Ok(u) = u64::from_str(value) {
                    Ok(Duration::from_secs(u))
                } else {
                    Err(anyhow!("invalid duration string"))
                }
            }
            Err(e) => Err(anyhow!("invalid humanize duration string: {e}")),
        },
        Yaml::Integer(value) => u64::try_from(*value)
            .map(Duration::from_secs)
            .map_err(|_| anyhow!("out of range integer value")),
        _ => Err(anyhow!(
            "yaml value type for humanize duration should be 'string' or 'integer'"
        )),
    }
}
