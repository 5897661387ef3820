use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use metrics::Counter;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    components::{ComponentContext, MetricsBuilder},
    data_model::Batch,
    topology::ComponentId,
};

/// A downstream component connected to a forwarder.
#[derive(Clone, Debug)]
pub struct Consumer {
    id: ComponentId,
    sender: mpsc::Sender<Batch>,
}

impl Consumer {
    /// Creates a new `Consumer` from the given identifier and sender.
    pub fn new(id: ComponentId, sender: mpsc::Sender<Batch>) -> Self {
        Self { id, sender }
    }
}

struct Inner {
    consumers: ArcSwap<Vec<Consumer>>,
    last_published: ArcSwapOption<Batch>,
    events_sent: Counter,
}

/// Publishes batches to every connected consumer.
///
/// The set of consumers can be replaced at any time, including while a component is publishing; each call to
/// [`publish`][Self::publish] sees either the old or the new set in full. Clones share the same consumers.
#[derive(Clone)]
pub struct Forwarder {
    inner: Arc<Inner>,
}

impl Forwarder {
    /// Creates a new `Forwarder` with no consumers.
    pub fn new(context: ComponentContext) -> Self {
        let metrics_builder = MetricsBuilder::from_component_context(context);

        Self {
            inner: Arc::new(Inner {
                consumers: ArcSwap::from_pointee(Vec::new()),
                last_published: ArcSwapOption::empty(),
                events_sent: metrics_builder.register_counter("component_events_sent_total"),
            }),
        }
    }

    /// Replaces the set of connected consumers.
    pub fn set_consumers(&self, consumers: Vec<Consumer>) {
        self.inner.consumers.store(Arc::new(consumers));
    }

    /// Returns the identifiers of the connected consumers.
    pub fn consumer_ids(&self) -> Vec<ComponentId> {
        self.inner.consumers.load().iter().map(|c| c.id.clone()).collect()
    }

    /// Returns the most recently published batch, if any.
    pub fn last_published(&self) -> Option<Arc<Batch>> {
        self.inner.last_published.load_full()
    }

    /// Publishes a batch to every connected consumer.
    ///
    /// Consumers that have disconnected are skipped. Returns the number of consumers the batch was delivered to.
    pub async fn publish(&self, batch: Batch) -> usize {
        let batch = Arc::new(batch);
        self.inner.last_published.store(Some(Arc::clone(&batch)));

        let consumers = self.inner.consumers.load_full();
        if consumers.is_empty() {
            debug!(records = batch.len(), "No consumers connected. Batch not delivered.");
            return 0;
        }

        let mut delivered = 0;
        for consumer in consumers.iter() {
            match consumer.sender.send(Batch::clone(&batch)).await {
                Ok(()) => delivered += 1,
                Err(_) => warn!(consumer_id = %consumer.id, "Consumer disconnected. Skipping."),
            }
        }

        self.inner.events_sent.increment((batch.len() * delivered) as u64);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::Record;

    fn id(s: &str) -> ComponentId {
        ComponentId::try_from(s).unwrap()
    }

    fn forwarder() -> Forwarder {
        Forwarder::new(ComponentContext::transform(id("forwarder_test")))
    }

    fn batch(value: i64) -> Batch {
        Batch::new(id("forwarder_test"), vec![Record::new().with_field("value", value)])
    }

    #[tokio::test]
    async fn publishes_to_every_consumer() {
        let forwarder = forwarder();
        let (tx1, mut rx1) = mpsc::channel(1);
        let (tx2, mut rx2) = mpsc::channel(1);
        forwarder.set_consumers(vec![Consumer::new(id("a"), tx1), Consumer::new(id("b"), tx2)]);

        assert_eq!(forwarder.publish(batch(1)).await, 2);
        assert_eq!(rx1.recv().await, Some(batch(1)));
        assert_eq!(rx2.recv().await, Some(batch(1)));
    }

    #[tokio::test]
    async fn disconnected_consumer_is_skipped() {
        let forwarder = forwarder();
        let (tx1, rx1) = mpsc::channel(1);
        let (tx2, mut rx2) = mpsc::channel(1);
        forwarder.set_consumers(vec![Consumer::new(id("a"), tx1), Consumer::new(id("b"), tx2)]);
        drop(rx1);

        assert_eq!(forwarder.publish(batch(1)).await, 1);
        assert_eq!(rx2.recv().await, Some(batch(1)));
    }

    #[tokio::test]
    async fn last_published_without_consumers() {
        let forwarder = forwarder();
        assert!(forwarder.last_published().is_none());

        assert_eq!(forwarder.publish(batch(1)).await, 0);
        assert_eq!(forwarder.publish(batch(2)).await, 0);
        assert_eq!(forwarder.last_published().as_deref(), Some(&batch(2)));
    }
}
