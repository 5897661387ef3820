use serde::{Deserialize, Serialize};

use super::Record;
use crate::topology::ComponentId;

/// An ordered sequence of records, tagged with the component that produced them.
///
/// A batch is the unit of delivery between components: one inbound batch per invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    source: ComponentId,
    records: Vec<Record>,
}

impl Batch {
    /// Creates a new `Batch` from the given producer and records.
    pub fn new(source: ComponentId, records: Vec<Record>) -> Self {
        Self { source, records }
    }

    /// Returns the identifier of the component that produced this batch.
    pub fn source(&self) -> &ComponentId {
        &self.source
    }

    /// Returns the records in this batch.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the number of records in this batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the batch has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
