//! Component basics.

use std::fmt;

use crate::topology::ComponentId;

mod metrics;
pub use self::metrics::MetricsBuilder;

pub mod transforms;

/// Component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
    /// Transform.
    Transform,
}

impl ComponentType {
    /// Returns the string representation of the component type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transform => "transform",
        }
    }
}

/// A component context.
///
/// Component contexts uniquely identify a component within a pipeline by coupling the component identifier (name) and
/// component type (source, transform, or destination).
#[derive(Clone, Debug)]
pub struct ComponentContext {
    component_id: ComponentId,
    component_type: ComponentType,
}

impl ComponentContext {
    /// Creates a new `ComponentContext` for a transform component with the given identifier.
    pub fn transform(component_id: ComponentId) -> Self {
        Self {
            component_id,
            component_type: ComponentType::Transform,
        }
    }

    /// Returns the component identifier.
    pub fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    /// Returns the component type.
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }
}

impl fmt::Display for ComponentContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}]", self.component_type.as_str(), self.component_id)
    }
}
