use crate::{
    components::ComponentContext,
    topology::interconnect::{BatchStream, Forwarder},
};

/// Transform context.
pub struct TransformContext {
    component_context: ComponentContext,
    forwarder: Forwarder,
    batch_stream: BatchStream,
}

impl TransformContext {
    /// Creates a new `TransformContext`.
    pub fn new(component_context: ComponentContext, forwarder: Forwarder, batch_stream: BatchStream) -> Self {
        Self {
            component_context,
            forwarder,
            batch_stream,
        }
    }

    /// Returns the component context.
    pub fn component_context(&self) -> ComponentContext {
        self.component_context.clone()
    }

    /// Gets a reference to the forwarder.
    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// Gets a mutable reference to the batch stream.
    pub fn batches(&mut self) -> &mut BatchStream {
        &mut self.batch_stream
    }
}
