//! Identity and capability descriptors exchanged during session initialization.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Protocol revision spoken by this mediator on both the server and client side.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Identity a mediator advertises when acting as a server.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    name: String,
    version: String,
}

impl ServerInfo {
    /// Creates server identity info.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInfo`] when either field is empty.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let version = version.into();
        validate_pair(&name, &version)?;
        Ok(Self { name, version })
    }

    /// Returns the server name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the server version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Identity a mediator presents when connecting to a remote server.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    name: String,
    version: String,
}

impl ClientInfo {
    /// Creates client identity info.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInfo`] when either field is empty.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let version = version.into();
        validate_pair(&name, &version)?;
        Ok(Self { name, version })
    }

    /// Returns the client name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the client version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

fn validate_pair(name: &str, version: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInfo {
            reason: "name cannot be empty".into(),
        });
    }
    if version.trim().is_empty() {
        return Err(Error::InvalidInfo {
            reason: "version cannot be empty".into(),
        });
    }
    Ok(())
}

/// Capability flags a mediator declares when initializing a client session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ClientCapability {
    /// The client can provide externally-sourced context roots and will
    /// announce changes to them when the flag is set.
    Roots {
        /// Whether the client emits list-changed notifications for roots.
        list_changed: bool,
    },
    /// The client can be asked to sample a model on the server's behalf.
    Sampling,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_info_requires_fields() {
        let err = ServerInfo::new("", "1.0").expect_err("empty name should fail");
        assert!(matches!(err, Error::InvalidInfo { .. }));

        let err = ServerInfo::new("mediator", " ").expect_err("empty version should fail");
        assert!(matches!(err, Error::InvalidInfo { .. }));
    }

    #[test]
    fn client_info_accessors() {
        let info = ClientInfo::new("proxy", "0.1.0").expect("info");
        assert_eq!(info.name(), "proxy");
        assert_eq!(info.version(), "0.1.0");
    }
}
