//! Tool name and request identifier types.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

const MAX_TOOL_NAME_LEN: usize = 64;

/// Name of a tool exposed by a mediator instance.
///
/// Tool names are the routing key on the wire and must stay stable for the
/// lifetime of a registration.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolName(String);

impl ToolName {
    /// Creates a new tool name after validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToolName`] if the supplied name is empty, too
    /// long, or contains unsupported characters.
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        validate_tool_name(&name)?;
        Ok(Self(name))
    }

    /// Derives a tool name from a callable's raw name by converting
    /// `camelCase` to `snake_case`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToolName`] when the derived name still fails
    /// validation (for example an empty input).
    pub fn derive(raw: &str) -> crate::Result<Self> {
        Self::new(camel_to_snake(raw))
    }

    /// Returns the tool name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ToolName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ToolName> for String {
    fn from(value: ToolName) -> Self {
        value.0
    }
}

impl FromStr for ToolName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

fn validate_tool_name(name: &str) -> crate::Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidToolName {
            name: String::new(),
            reason: "name cannot be empty".into(),
        });
    }

    if name.len() > MAX_TOOL_NAME_LEN {
        return Err(Error::InvalidToolName {
            name: name.into(),
            reason: format!("name length must be <= {MAX_TOOL_NAME_LEN}"),
        });
    }

    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_' | '.'))
    {
        return Err(Error::InvalidToolName {
            name: name.into(),
            reason: "name must contain lowercase alphanumeric, dash, underscore, or dot".into(),
        });
    }

    Ok(())
}

/// Converts a `camelCase` identifier to `snake_case`.
#[must_use]
pub(crate) fn camel_to_snake(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 4);
    for (position, c) in input.chars().enumerate() {
        if c.is_ascii_uppercase() {
            // No separator before the first character.
            if position > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Correlation identifier assigned to each mediator request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a random request identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::random()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s).map_err(Error::from)?;
        Ok(Self::from_uuid(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_tool_name_round_trips() {
        let name = ToolName::new("docker.list_containers").expect("name");
        assert_eq!(name.as_str(), "docker.list_containers");
    }

    #[test]
    fn empty_tool_name_errors() {
        let err = ToolName::new("").expect_err("empty name should fail");
        assert!(matches!(err, Error::InvalidToolName { .. }));
    }

    #[test]
    fn uppercase_tool_name_errors() {
        let err = ToolName::new("ListTools").expect_err("uppercase should fail");
        assert!(matches!(err, Error::InvalidToolName { .. }));
    }

    #[test]
    fn derives_snake_case_from_camel_case() {
        let name = ToolName::derive("getAllContainers").expect("derive");
        assert_eq!(name.as_str(), "get_all_containers");
    }

    #[test]
    fn leading_uppercase_derives_without_leading_underscore() {
        let name = ToolName::derive("GetAll").expect("derive");
        assert_eq!(name.as_str(), "get_all");
    }

    #[test]
    fn request_id_round_trips() {
        let id = RequestId::random();
        let parsed = id.to_string().parse::<RequestId>().expect("parse");
        assert_eq!(id, parsed);
    }
}
