use metrics::{counter, histogram, Counter, Histogram, Label};

use super::ComponentContext;

/// Component-specific metrics builder.
///
/// Registers metrics that are scoped to a specific component, so that every component-level metric carries the same
/// `component_id` and `component_type` labels.
#[derive(Clone)]
pub struct MetricsBuilder {
    context: ComponentContext,
}

impl MetricsBuilder {
    /// Creates a new `MetricsBuilder` with the given component context.
    pub fn from_component_context(context: ComponentContext) -> Self {
        Self { context }
    }

    fn labels<I, L>(&self, additional_labels: I) -> Vec<Label>
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        let mut labels = vec![
            Label::new("component_id", self.context.component_id().to_string()),
            Label::new("component_type", self.context.component_type().as_str()),
        ];
        labels.extend(additional_labels.into_iter().map(Into::into));
        labels
    }

    /// Registers a counter.
    pub fn register_counter(&self, metric_name: &'static str) -> Counter {
        counter!(metric_name, self.labels(Vec::<Label>::new()))
    }

    /// Registers a counter with additional labels.
    pub fn register_counter_with_labels<I, L>(&self, metric_name: &'static str, additional_labels: I) -> Counter
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        counter!(metric_name, self.labels(additional_labels))
    }

    /// Registers a histogram.
    pub fn register_histogram(&self, metric_name: &'static str) -> Histogram {
        histogram!(metric_name, self.labels(Vec::<Label>::new()))
    }
}
