use std::{borrow::Cow, fmt, ops::Deref};

use serde::{Deserialize, Serialize};

const INVALID_COMPONENT_ID: &str =
    "component IDs may only contain alphanumerics (a-z, A-Z, or 0-9), underscores, and hyphens";

/// A component identifier.
///
/// Identifies a component within a pipeline, and doubles as the `source` tag of every batch the component produces.
#[derive(Clone, Debug, Hash, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentId(Cow<'static, str>);

impl ComponentId {
    /// Creates a `ComponentId` from a static string.
    ///
    /// # Panics
    ///
    /// Panics if the identifier is not valid. Intended for identifiers known at compile time.
    pub const fn from_static(id: &'static str) -> Self {
        if !validate_component_id(id) {
            panic!("invalid static component ID");
        }

        Self(Cow::Borrowed(id))
    }
}

impl TryFrom<&str> for ComponentId {
    type Error = &'static str;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if validate_component_id(value) {
            Ok(Self(value.to_string().into()))
        } else {
            Err(INVALID_COMPONENT_ID)
        }
    }
}

impl TryFrom<String> for ComponentId {
    type Error = &'static str;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if validate_component_id(&value) {
            Ok(Self(value.into()))
        } else {
            Err(INVALID_COMPONENT_ID)
        }
    }
}

impl From<ComponentId> for String {
    fn from(value: ComponentId) -> Self {
        value.0.into_owned()
    }
}

impl Deref for ComponentId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

const fn validate_component_id(id: &str) -> bool {
    let id_bytes = id.as_bytes();

    // Identifiers cannot be empty strings.
    if id_bytes.is_empty() {
        return false;
    }

    let mut idx = 0;
    while idx < id_bytes.len() {
        let b = id_bytes[idx];
        if !b.is_ascii_alphanumeric() && b != b'_' && b != b'-' {
            return false;
        }

        idx += 1;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        for id in ["decorator", "Decorator", "sensor_1", "edge-gw-01"] {
            assert!(ComponentId::try_from(id).is_ok(), "{} should be valid", id);
        }
    }

    #[test]
    fn invalid_ids() {
        for id in ["", "has space", "dotted.name", "slash/name", "émoji"] {
            assert_eq!(ComponentId::try_from(id), Err(INVALID_COMPONENT_ID), "{:?} should be invalid", id);
        }
    }

    #[test]
    fn static_id() {
        const ID: ComponentId = ComponentId::from_static("decorator");
        assert_eq!(&*ID, "decorator");
    }
}
