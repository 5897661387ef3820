use std::{num::NonZeroUsize, sync::Arc};

use arc_swap::{ArcSwap, ArcSwapOption};
use tokio::sync::mpsc;
use tracing::debug;

use super::{BatchSender, BatchStream, Consumer, Forwarder};
use crate::{
    components::{transforms::TransformContext, ComponentContext},
    data_model::Batch,
    generic_error,
    topology::ComponentId,
    GenericError,
};

/// Connection management for a single transform.
///
/// `Wiring` is the handle the composing pipeline keeps once a transform has been handed its [`TransformContext`]: it
/// connects producers and consumers, and answers polls for the last published batch. None of these operations touch
/// the batches themselves.
pub struct Wiring {
    context: ComponentContext,
    inbound: ArcSwapOption<mpsc::Sender<Batch>>,
    producers: ArcSwap<Vec<ComponentId>>,
    forwarder: Forwarder,
}

impl Wiring {
    /// Creates the wiring for a transform, along with the context to run the transform with.
    ///
    /// `capacity` bounds the number of batches buffered between producers and the transform.
    pub fn new(context: ComponentContext, capacity: NonZeroUsize) -> (Self, TransformContext) {
        let (tx, rx) = mpsc::channel(capacity.get());
        let forwarder = Forwarder::new(context.clone());
        let batch_stream = BatchStream::new(context.clone(), rx);
        let transform_context = TransformContext::new(context.clone(), forwarder.clone(), batch_stream);

        let wiring = Self {
            context,
            inbound: ArcSwapOption::from_pointee(tx),
            producers: ArcSwap::from_pointee(Vec::new()),
            forwarder,
        };

        (wiring, transform_context)
    }

    /// Connects the given producers, replacing any previously connected set.
    ///
    /// Returns one sender per producer, in the same order. Senders handed out earlier keep working until dropped.
    ///
    /// # Errors
    ///
    /// If the wiring has been closed, an error is returned.
    pub fn producers_connected(&self, producers: &[ComponentId]) -> Result<Vec<BatchSender>, GenericError> {
        let inbound = self
            .inbound
            .load_full()
            .ok_or_else(|| generic_error!("Cannot connect producers to {}: inbound side is closed.", self.context))?;

        self.producers.store(Arc::new(producers.to_vec()));
        debug!(component = %self.context, producers = producers.len(), "Producers connected.");

        Ok(producers
            .iter()
            .map(|producer| BatchSender::new(producer.clone(), mpsc::Sender::clone(&inbound)))
            .collect())
    }

    /// Returns the identifiers of the currently connected producers.
    pub fn producers(&self) -> Arc<Vec<ComponentId>> {
        self.producers.load_full()
    }

    /// Connects the given consumers, replacing any previously connected set.
    pub fn consumers_connected(&self, consumers: Vec<Consumer>) {
        debug!(component = %self.context, consumers = consumers.len(), "Consumers connected.");
        self.forwarder.set_consumers(consumers);
    }

    /// Returns the identifiers of the currently connected consumers.
    pub fn consumers(&self) -> Vec<ComponentId> {
        self.forwarder.consumer_ids()
    }

    /// Returns the last batch published by the transform, if any.
    pub fn polled(&self) -> Option<Arc<Batch>> {
        self.forwarder.last_published()
    }

    /// Closes the inbound side.
    ///
    /// No further producers can be connected. The transform's batch stream ends once every sender already handed out
    /// has been dropped.
    pub fn close(&self) {
        self.inbound.store(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::Record;

    fn id(s: &str) -> ComponentId {
        ComponentId::try_from(s).unwrap()
    }

    fn wiring() -> (Wiring, TransformContext) {
        Wiring::new(
            ComponentContext::transform(id("wiring_test")),
            NonZeroUsize::new(4).unwrap(),
        )
    }

    #[tokio::test]
    async fn producers_feed_the_transform_context() {
        let (wiring, mut context) = wiring();
        let senders = wiring.producers_connected(&[id("p1"), id("p2")]).unwrap();
        assert_eq!(*wiring.producers(), vec![id("p1"), id("p2")]);

        for sender in &senders {
            let batch = Batch::new(sender.producer().clone(), vec![Record::new()]);
            sender.send(batch).await.unwrap();
        }

        assert_eq!(context.batches().next().await.map(|b| b.source().clone()), Some(id("p1")));
        assert_eq!(context.batches().next().await.map(|b| b.source().clone()), Some(id("p2")));
    }

    #[tokio::test]
    async fn stream_ends_after_close_and_all_senders_dropped() {
        let (wiring, mut context) = wiring();
        let senders = wiring.producers_connected(&[id("p1")]).unwrap();

        wiring.close();
        assert!(wiring.producers_connected(&[id("p2")]).is_err());

        drop(senders);
        assert!(context.batches().next().await.is_none());
    }

    #[tokio::test]
    async fn polled_reflects_forwarder() {
        let (wiring, context) = wiring();
        let (tx, mut rx) = mpsc::channel(1);
        wiring.consumers_connected(vec![Consumer::new(id("c1"), tx)]);
        assert_eq!(wiring.consumers(), vec![id("c1")]);
        assert!(wiring.polled().is_none());

        let batch = Batch::new(id("wiring_test"), vec![Record::new().with_field("k", "v")]);
        context.forwarder().publish(batch.clone()).await;

        assert_eq!(rx.recv().await, Some(batch.clone()));
        assert_eq!(wiring.polled().as_deref(), Some(&batch));
    }
}
