//! Configuration model for mediator servers and remote proxies.

#![warn(missing_docs, clippy::pedantic)]

use std::collections::HashMap;
use std::time::Duration;

use mediator_primitives::ServerInfo;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default per-call timeout applied to remote servers.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors produced while validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration field failed validation.
    #[error("invalid configuration: {field} {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Transport the local mediator serves its own tools over.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerTransport {
    /// Newline-delimited JSON-RPC over stdin/stdout.
    #[default]
    Stdio,
}

/// Configuration for a local mediator instance.
#[derive(Clone, Debug)]
pub struct MediatorConfig {
    server_info: ServerInfo,
    transport: ServerTransport,
    tools_enabled: bool,
    excluded: Vec<String>,
}

impl MediatorConfig {
    /// Starts building a configuration for the named server.
    #[must_use]
    pub fn builder(server_info: ServerInfo) -> MediatorConfigBuilder {
        MediatorConfigBuilder {
            server_info,
            transport: ServerTransport::default(),
            tools_enabled: true,
            excluded: Vec::new(),
        }
    }

    /// Returns the server identity.
    #[must_use]
    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Returns the serving transport.
    #[must_use]
    pub const fn transport(&self) -> ServerTransport {
        self.transport
    }

    /// Returns whether tool support is enabled.
    #[must_use]
    pub const fn tools_enabled(&self) -> bool {
        self.tools_enabled
    }

    /// Returns the tool names excluded from publication.
    #[must_use]
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }
}

/// Builder for [`MediatorConfig`].
pub struct MediatorConfigBuilder {
    server_info: ServerInfo,
    transport: ServerTransport,
    tools_enabled: bool,
    excluded: Vec<String>,
}

impl MediatorConfigBuilder {
    /// Sets the serving transport.
    #[must_use]
    pub const fn transport(mut self, transport: ServerTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Disables tool support entirely.
    #[must_use]
    pub const fn disable_tools(mut self) -> Self {
        self.tools_enabled = false;
        self
    }

    /// Excludes a tool from publication by its published name.
    #[must_use]
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded.push(name.into());
        self
    }

    /// Finalizes the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an excluded name is empty.
    pub fn build(self) -> ConfigResult<MediatorConfig> {
        if self.excluded.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::invalid("excluded", "contains an empty name"));
        }
        Ok(MediatorConfig {
            server_info: self.server_info,
            transport: self.transport,
            tools_enabled: self.tools_enabled,
            excluded: self.excluded,
        })
    }
}

/// Transport used to reach one remote server.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RemoteTransport {
    /// Spawn a child process and speak over its stdin/stdout.
    Stdio {
        /// Executable to spawn.
        command: String,
        /// Arguments passed to the executable.
        #[serde(default)]
        args: Vec<String>,
        /// Extra environment variables for the child.
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// Connect to a TCP endpoint.
    Tcp {
        /// Address in `host:port` form.
        address: String,
    },
}

/// Configuration for one remote server behind the proxy.
#[derive(Clone, Debug)]
pub struct RemoteServerConfig {
    name: String,
    transport: RemoteTransport,
    timeout: Duration,
}

impl RemoteServerConfig {
    /// Starts building a remote server entry.
    #[must_use]
    pub fn builder(name: impl Into<String>, transport: RemoteTransport) -> RemoteServerBuilder {
        RemoteServerBuilder {
            name: name.into(),
            transport,
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Returns the local name of the remote server.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the transport used to reach it.
    #[must_use]
    pub const fn transport(&self) -> &RemoteTransport {
        &self.transport
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builder for [`RemoteServerConfig`].
pub struct RemoteServerBuilder {
    name: String,
    transport: RemoteTransport,
    timeout: Duration,
}

impl RemoteServerBuilder {
    /// Overrides the per-call timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Finalizes the entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty name, an empty
    /// command or address, or a zero timeout.
    pub fn build(self) -> ConfigResult<RemoteServerConfig> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid("name", "cannot be empty"));
        }
        match &self.transport {
            RemoteTransport::Stdio { command, .. } if command.trim().is_empty() => {
                return Err(ConfigError::invalid("command", "cannot be empty"));
            }
            RemoteTransport::Tcp { address } if address.trim().is_empty() => {
                return Err(ConfigError::invalid("address", "cannot be empty"));
            }
            _ => {}
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("timeout", "must be non-zero"));
        }
        Ok(RemoteServerConfig {
            name: self.name,
            transport: self.transport,
            timeout: self.timeout,
        })
    }
}

/// Configuration for a proxying mediator: a base configuration plus the
/// remote servers whose tools it republishes.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    base: MediatorConfig,
    remotes: Vec<RemoteServerConfig>,
}

impl ProxyConfig {
    /// Starts building a proxy configuration on top of a base one.
    #[must_use]
    pub const fn builder(base: MediatorConfig) -> ProxyConfigBuilder {
        ProxyConfigBuilder {
            base,
            remotes: Vec::new(),
        }
    }

    /// Returns the base mediator configuration.
    #[must_use]
    pub const fn base(&self) -> &MediatorConfig {
        &self.base
    }

    /// Returns the configured remote servers.
    #[must_use]
    pub fn remotes(&self) -> &[RemoteServerConfig] {
        &self.remotes
    }
}

/// Builder for [`ProxyConfig`].
pub struct ProxyConfigBuilder {
    base: MediatorConfig,
    remotes: Vec<RemoteServerConfig>,
}

impl ProxyConfigBuilder {
    /// Adds a remote server.
    #[must_use]
    pub fn remote(mut self, remote: RemoteServerConfig) -> Self {
        self.remotes.push(remote);
        self
    }

    /// Finalizes the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when two remotes share a name.
    pub fn build(self) -> ConfigResult<ProxyConfig> {
        let mut seen = std::collections::HashSet::new();
        for remote in &self.remotes {
            if !seen.insert(remote.name()) {
                return Err(ConfigError::invalid(
                    "remotes",
                    format!("duplicate remote name '{}'", remote.name()),
                ));
            }
        }
        Ok(ProxyConfig {
            base: self.base,
            remotes: self.remotes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_info() -> ServerInfo {
        ServerInfo::new("test-server", "0.1.0").expect("info")
    }

    #[test]
    fn mediator_config_defaults() {
        let config = MediatorConfig::builder(server_info()).build().unwrap();
        assert!(config.tools_enabled());
        assert_eq!(config.transport(), ServerTransport::Stdio);
        assert!(config.excluded().is_empty());
    }

    #[test]
    fn empty_exclusion_is_rejected() {
        let err = MediatorConfig::builder(server_info())
            .exclude("  ")
            .build()
            .expect_err("blank exclusion");
        assert!(matches!(err, ConfigError::Invalid { field: "excluded", .. }));
    }

    #[test]
    fn remote_defaults_to_thirty_second_timeout() {
        let remote = RemoteServerConfig::builder(
            "files",
            RemoteTransport::Tcp {
                address: "127.0.0.1:9100".into(),
            },
        )
        .build()
        .unwrap();
        assert_eq!(remote.timeout(), DEFAULT_REMOTE_TIMEOUT);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = RemoteServerConfig::builder(
            "files",
            RemoteTransport::Tcp {
                address: "127.0.0.1:9100".into(),
            },
        )
        .timeout(Duration::ZERO)
        .build()
        .expect_err("zero timeout");
        assert!(matches!(err, ConfigError::Invalid { field: "timeout", .. }));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = RemoteServerConfig::builder(
            "files",
            RemoteTransport::Stdio {
                command: String::new(),
                args: Vec::new(),
                env: HashMap::new(),
            },
        )
        .build()
        .expect_err("empty command");
        assert!(matches!(err, ConfigError::Invalid { field: "command", .. }));
    }

    #[test]
    fn duplicate_remote_names_are_rejected() {
        let base = MediatorConfig::builder(server_info()).build().unwrap();
        let remote = || {
            RemoteServerConfig::builder(
                "files",
                RemoteTransport::Tcp {
                    address: "127.0.0.1:9100".into(),
                },
            )
            .build()
            .unwrap()
        };

        let err = ProxyConfig::builder(base)
            .remote(remote())
            .remote(remote())
            .build()
            .expect_err("duplicate names");
        assert!(matches!(err, ConfigError::Invalid { field: "remotes", .. }));
    }
}
