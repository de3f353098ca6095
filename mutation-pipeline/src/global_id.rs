//! Relay style global identifiers.
use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::GlobalIdError;

/// A decoded global ID: the name of a node type and the storage key of one node of that type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlobalId {
    type_name: String,
    raw_key: String,
}

impl GlobalId {
    pub fn new(type_name: impl Into<String>, raw_key: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            raw_key: raw_key.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn raw_key(&self) -> &str {
        &self.raw_key
    }

    /// Encodes the ID in its opaque form, `base64("{type_name}:{raw_key}")`.
    pub fn encode(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.type_name, self.raw_key))
    }

    /// Decodes an opaque ID.
    ///
    /// Only the encoding is checked: whether the type name is known is up to the caller.
    pub fn decode(opaque: &str) -> Result<Self, GlobalIdError> {
        let bytes = STANDARD.decode(opaque)?;
        let decoded = String::from_utf8(bytes).map_err(|_| GlobalIdError::Utf8)?;
        match decoded.split_once(':') {
            Some((type_name, raw_key)) if !type_name.is_empty() && !raw_key.is_empty() => {
                Ok(Self::new(type_name, raw_key))
            }
            _ => Err(GlobalIdError::Malformed(decoded)),
        }
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for GlobalId {
    type Err = GlobalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
