use async_trait::async_trait;

use super::Transform;
use crate::{components::ComponentContext, GenericError};

/// A transform builder.
///
/// Transform builders hold the configuration of a transform, and are responsible for creating instances of it.
#[async_trait]
pub trait TransformBuilder {
    /// Builds an instance of the transform.
    ///
    /// # Errors
    ///
    /// If the transform cannot be built for any reason, an error is returned.
    async fn build(&self, context: ComponentContext) -> Result<Box<dyn Transform + Send>, GenericError>;
}
