use metrics::{Counter, Histogram};
use tokio::sync::mpsc;

use crate::{
    components::{ComponentContext, MetricsBuilder},
    data_model::Batch,
    generic_error,
    topology::ComponentId,
    GenericError,
};

/// A stream of batches sent to a component.
///
/// `BatchStream` is the receiving end of the interconnection between a component and its producers, where
/// [`BatchSender`] is the sending end.
pub struct BatchStream {
    inner: mpsc::Receiver<Batch>,
    events_received: Counter,
    batch_size: Histogram,
}

impl BatchStream {
    /// Creates a new `BatchStream` for the given component context and inner receiver.
    pub fn new(context: ComponentContext, inner: mpsc::Receiver<Batch>) -> Self {
        let metrics_builder = MetricsBuilder::from_component_context(context);

        Self {
            inner,
            events_received: metrics_builder.register_counter("component_events_received_total"),
            batch_size: metrics_builder.register_histogram("component_events_received_size"),
        }
    }

    /// Gets the next batch in the stream.
    ///
    /// If every producer connected to this stream has disconnected, `None` is returned.
    pub async fn next(&mut self) -> Option<Batch> {
        let batch = self.inner.recv().await?;
        self.events_received.increment(batch.len() as u64);
        self.batch_size.record(batch.len() as f64);
        Some(batch)
    }
}

/// The sending half of a producer's connection to a component.
#[derive(Clone, Debug)]
pub struct BatchSender {
    producer: ComponentId,
    inner: mpsc::Sender<Batch>,
}

impl BatchSender {
    pub(super) fn new(producer: ComponentId, inner: mpsc::Sender<Batch>) -> Self {
        Self { producer, inner }
    }

    /// Returns the identifier of the producer this sender belongs to.
    pub fn producer(&self) -> &ComponentId {
        &self.producer
    }

    /// Delivers a batch to the connected component.
    ///
    /// # Errors
    ///
    /// If the receiving component has stopped, an error is returned and the batch is lost.
    pub async fn send(&self, batch: Batch) -> Result<(), GenericError> {
        self.inner.send(batch).await.map_err(|e| {
            generic_error!(
                "Failed to deliver batch from '{}'; {} records lost.",
                self.producer,
                e.0.len()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::Record;

    fn create_batch_stream(channel_size: usize) -> (BatchStream, BatchSender) {
        let component_id = ComponentId::try_from("batch_stream_test").expect("component ID should never be invalid");
        let (tx, rx) = mpsc::channel(channel_size);
        let stream = BatchStream::new(ComponentContext::transform(component_id.clone()), rx);

        (stream, BatchSender::new(component_id, tx))
    }

    #[tokio::test]
    async fn next() {
        let (mut stream, sender) = create_batch_stream(1);

        let batch = Batch::new(
            sender.producer().clone(),
            vec![Record::new().with_field("temp", 21.5)],
        );
        sender.send(batch.clone()).await.expect("should not fail to send batch");

        assert_eq!(stream.next().await, Some(batch));

        // Dropping the only sender closes the stream.
        drop(sender);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn send_after_close() {
        let (stream, sender) = create_batch_stream(1);
        drop(stream);

        let batch = Batch::new(sender.producer().clone(), vec![Record::new()]);
        let err = sender.send(batch).await.unwrap_err();
        assert!(err.to_string().contains("1 records lost"));
    }
}
