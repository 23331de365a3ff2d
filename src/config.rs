// Copyright 2023 rust-dns-sdk authors
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::fmt;
use std::time::Duration;

use crate::errors::DnsError;

/// TTL sent with new TXT records; the lowest value AliDNS accepts on free plans.
pub const DEFAULT_TTL: u32 = 600;

pub const ENV_ACCESS_KEY: &str = "ALICLOUD_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "ALICLOUD_SECRET_KEY";
pub const ENV_REGION_ID: &str = "ALICLOUD_REGION_ID";
pub const ENV_TTL: &str = "ALICLOUD_TTL";
pub const ENV_HTTP_TIMEOUT: &str = "ALICLOUD_HTTP_TIMEOUT";

/// Settings for an AliDNS client.
#[derive(Clone)]
pub struct AliDnsConfig {
    pub region_id: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    /// Overrides `https://alidns.<region>.aliyuncs.com`
    pub endpoint: Option<String>,
    pub ttl: u32,
    /// Transport timeout; unset means requests are never cut short
    pub timeout: Option<Duration>,
}

impl fmt::Debug for AliDnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliDnsConfig")
            .field("region_id", &self.region_id)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AliDnsConfig {
    pub fn new(region_id: &str, access_key_id: &str, access_key_secret: &str) -> Self {
        Self {
            region_id: region_id.to_string(),
            access_key_id: access_key_id.to_string(),
            access_key_secret: access_key_secret.to_string(),
            endpoint: None,
            ttl: DEFAULT_TTL,
            timeout: None,
        }
    }

    /// Reads the configuration from `ALICLOUD_*` environment variables.
    pub fn from_env() -> Result<Self, DnsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps an environment
    /// variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DnsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = AliDnsBuilder::new();
        let vars = [
            (ENV_REGION_ID, "region_id"),
            (ENV_ACCESS_KEY, "access_key_id"),
            (ENV_SECRET_KEY, "access_key_secret"),
            (ENV_TTL, "ttl"),
            (ENV_HTTP_TIMEOUT, "timeout_secs"),
        ];
        for (var, key) in vars {
            if let Some(value) = lookup(var) {
                builder = builder.set_param(key, &value);
            }
        }
        builder.build()
    }

    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://alidns.{}.aliyuncs.com", self.region_id),
        }
    }

    /// Checks the settings without contacting the provider.
    pub fn validate(&self) -> Result<(), DnsError> {
        if self.region_id.is_empty() {
            return Err(DnsError::Config("region_id is required".into()));
        }
        if !self
            .region_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(DnsError::Config(format!(
                "malformed region_id: {}",
                self.region_id
            )));
        }
        if self.access_key_id.is_empty() {
            return Err(DnsError::Config("access_key_id is required".into()));
        }
        if self.access_key_secret.is_empty() {
            return Err(DnsError::Config("access_key_secret is required".into()));
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                return Err(DnsError::Config(format!(
                    "endpoint must be an http(s) URL: {}",
                    endpoint
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`AliDnsConfig`].
#[derive(Default)]
pub struct AliDnsBuilder {
    region_id: Option<String>,
    access_key_id: Option<String>,
    access_key_secret: Option<String>,
    endpoint: Option<String>,
    ttl: Option<u32>,
    timeout: Option<Duration>,
    /// First problem met while setting parameters, reported by `build`.
    error: Option<String>,
}

impl AliDnsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets configuration parameters for the AliDNS client.
    ///
    /// Supported keys:
    /// - "region_id"
    /// - "access_key_id"
    /// - "access_key_secret"
    /// - "endpoint"
    /// - "ttl"
    /// - "timeout_secs"
    ///
    /// Unknown keys and unparsable values make `build` fail.
    pub fn set_param(mut self, key: &str, value: &str) -> Self {
        match key {
            "region_id" => self.region_id = Some(value.into()),
            "access_key_id" => self.access_key_id = Some(value.into()),
            "access_key_secret" => self.access_key_secret = Some(value.into()),
            "endpoint" => self.endpoint = Some(value.into()),
            "ttl" => match value.parse::<u32>() {
                Ok(ttl) => self.ttl = Some(ttl),
                Err(e) => self.fail(format!("ttl parse failed: {}", e)),
            },
            "timeout_secs" => match value.parse::<u64>() {
                Ok(secs) => self.timeout = Some(Duration::from_secs(secs)),
                Err(e) => self.fail(format!("timeout_secs parse failed: {}", e)),
            },
            _ => self.fail(format!("invalid parameter: {}", key)),
        }
        self
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }

    /// Validates the collected parameters into a configuration.
    pub fn build(self) -> Result<AliDnsConfig, DnsError> {
        if let Some(message) = self.error {
            return Err(DnsError::Config(message));
        }
        let config = AliDnsConfig {
            region_id: self.region_id.unwrap_or_default(),
            access_key_id: self.access_key_id.unwrap_or_default(),
            access_key_secret: self.access_key_secret.unwrap_or_default(),
            endpoint: self.endpoint,
            ttl: self.ttl.unwrap_or(DEFAULT_TTL),
            timeout: self.timeout,
        };
        config.validate()?;
        Ok(config)
    }
}
