//! Transform components.

use async_trait::async_trait;

mod builder;
pub use self::builder::TransformBuilder;

mod context;
pub use self::context::TransformContext;

use crate::GenericError;

/// A transform.
///
/// Transforms sit between producers and consumers: they receive batches from the components connected upstream, and
/// publish batches to the components connected downstream.
#[async_trait]
pub trait Transform {
    /// Runs the transform.
    ///
    /// The transform should run until its batch stream is exhausted, which happens once every producer has
    /// disconnected.
    ///
    /// # Errors
    ///
    /// If an unrecoverable error occurs while running, an error is returned.
    async fn run(self: Box<Self>, context: TransformContext) -> Result<(), GenericError>;
}
