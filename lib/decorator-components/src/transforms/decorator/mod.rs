use std::sync::Arc;

use async_trait::async_trait;
use decorator_config::{ConfigurationError, GenericConfiguration, PropertyMap};
use decorator_core::{
    components::{
        transforms::{Transform, TransformBuilder, TransformContext},
        ComponentContext, MetricsBuilder,
    },
    data_model::Batch,
    state::SnapshotHolder,
    topology::ComponentId,
    GenericError,
};
use serde::de::DeserializeOwned;
use snafu::{OptionExt as _, Snafu};
use tracing::{debug, error};

const DEVICE_ID_KEY: &str = "device.id";
const DEVICE_DESC_KEY: &str = "device.desc";
const POSITION_ENABLE_KEY: &str = "position.enable";
const POSITION_LAT_KEY: &str = "position.lat";
const POSITION_LONG_KEY: &str = "position.long";

const DEVICE_NAME_FIELD: &str = "device_name";
const DEVICE_DESC_FIELD: &str = "device_desc";
const DEVICE_LONG_FIELD: &str = "device_long";
const DEVICE_LAT_FIELD: &str = "device_lat";

/// Static metadata describing the device a stage runs on.
///
/// Empty strings mean "not set". Coordinates are only ever emitted when position is enabled, regardless of whether
/// they are stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceProfile {
    device_id: String,
    device_desc: String,
    position_enabled: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl DeviceProfile {
    /// Builds a `DeviceProfile` from the given configuration.
    ///
    /// Reads `device.id`, `device.desc`, `position.enable`, `position.lat`, and `position.long`. Any key that is
    /// missing, or holds a value of the wrong type, falls back to its default: an empty string, `false`, or no
    /// coordinate. This never fails.
    pub fn from_configuration(config: &GenericConfiguration) -> Self {
        Self {
            device_id: read_string_field(config, DEVICE_ID_KEY).unwrap_or_default(),
            device_desc: read_string_field(config, DEVICE_DESC_KEY).unwrap_or_default(),
            position_enabled: read_field(config, POSITION_ENABLE_KEY).unwrap_or_default(),
            latitude: read_field(config, POSITION_LAT_KEY),
            longitude: read_field(config, POSITION_LONG_KEY),
        }
    }

    /// Builds a `DeviceProfile` from an untyped property map.
    ///
    /// See [`from_configuration`][Self::from_configuration] for the keys and defaults.
    pub fn from_properties(properties: &PropertyMap) -> Self {
        Self::from_configuration(&GenericConfiguration::from_properties(properties))
    }

    /// Sets the device identifier.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    /// Sets the device description.
    pub fn with_device_desc(mut self, device_desc: impl Into<String>) -> Self {
        self.device_desc = device_desc.into();
        self
    }

    /// Enables position, with the given coordinates.
    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.position_enabled = true;
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Sets whether position is enabled, leaving any stored coordinates untouched.
    pub fn with_position_enabled(mut self, enabled: bool) -> Self {
        self.position_enabled = enabled;
        self
    }

    /// Returns the device identifier, or an empty string if not set.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns the device description, or an empty string if not set.
    pub fn device_desc(&self) -> &str {
        &self.device_desc
    }

    /// Returns `true` if position is enabled.
    pub fn position_enabled(&self) -> bool {
        self.position_enabled
    }

    /// Returns the stored latitude and longitude.
    pub fn position(&self) -> (Option<f64>, Option<f64>) {
        (self.latitude, self.longitude)
    }
}

fn read_field<T: DeserializeOwned>(config: &GenericConfiguration, key: &str) -> Option<T> {
    resolve_field(key, config.try_get_typed::<T>(key))
}

fn read_string_field(config: &GenericConfiguration, key: &str) -> Option<String> {
    resolve_field(key, config.try_get_string(key))
}

fn resolve_field<T>(key: &str, result: Result<Option<T>, ConfigurationError>) -> Option<T> {
    match result {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            debug!(key, "Configuration field not set. Using default.");
            None
        }
        Err(e) => {
            debug!(key, error = %e, "Configuration field has an invalid value. Using default.");
            None
        }
    }
}

/// Decorate error.
#[derive(Debug, Eq, PartialEq, Snafu)]
#[snafu(context(suffix(false)))]
pub enum DecorateError {
    /// The inbound batch had no records to decorate.
    #[snafu(display("Received an empty batch from '{}'. Nothing to decorate.", producer))]
    EmptyBatch {
        /// Producer of the empty batch.
        producer: ComponentId,
    },
}

/// Decorates a batch with device metadata.
///
/// The first record of the batch is copied and enriched with the fields below, in this order, each one only if the
/// profile calls for it:
///
/// - `device_name` (string): the device identifier, if not empty
/// - `device_desc` (string): the device description, if not empty
/// - `device_long`, then `device_lat` (double): the coordinates, if position is enabled
///
/// A field already present in the record is overwritten in place; a new one is appended. A coordinate that is enabled
/// but not stored is emitted as `0.0`.
///
/// The output holds the remaining records in their original order, followed by the enriched record. It is tagged with
/// `stage_id` as its source. The input is left untouched.
///
/// # Errors
///
/// If the batch has no records, an error is returned.
pub fn decorate(batch: &Batch, profile: &DeviceProfile, stage_id: &ComponentId) -> Result<Batch, DecorateError> {
    let (base, remaining) = batch.records().split_first().context(EmptyBatch {
        producer: batch.source().clone(),
    })?;

    let mut decorated = base.clone();
    if !profile.device_id.is_empty() {
        decorated.insert(DEVICE_NAME_FIELD, profile.device_id.as_str());
    }

    if !profile.device_desc.is_empty() {
        decorated.insert(DEVICE_DESC_FIELD, profile.device_desc.as_str());
    }

    if profile.position_enabled {
        // Longitude always precedes latitude.
        decorated.insert(DEVICE_LONG_FIELD, profile.longitude.unwrap_or_default());
        decorated.insert(DEVICE_LAT_FIELD, profile.latitude.unwrap_or_default());
    }

    let mut records = Vec::with_capacity(batch.len());
    records.extend_from_slice(remaining);
    records.push(decorated);

    Ok(Batch::new(stage_id.clone(), records))
}

/// Decorator transform.
///
/// Enriches the first record of every batch with static device metadata (identifier, description, and optionally
/// position) and moves it to the end of the batch before forwarding it downstream.
///
/// Building from configuration is the activation step. The device profile can be replaced at any time afterwards
/// through [`updated`][Self::updated], including while the transform is running: each batch is decorated with
/// whichever profile was current when it arrived.
pub struct DecoratorConfiguration {
    profile: SnapshotHolder<DeviceProfile>,
}

impl DecoratorConfiguration {
    /// Creates a new `DecoratorConfiguration` from the given configuration.
    pub fn from_configuration(config: &GenericConfiguration) -> Self {
        Self::from_profile(DeviceProfile::from_configuration(config))
    }

    /// Creates a new `DecoratorConfiguration` with the given device profile.
    pub fn from_profile(profile: DeviceProfile) -> Self {
        Self {
            profile: SnapshotHolder::new(profile),
        }
    }

    /// Replaces the device profile with one built from the given configuration.
    pub fn updated(&self, config: &GenericConfiguration) {
        let profile = DeviceProfile::from_configuration(config);
        debug!(?profile, "Updated device profile.");
        self.profile.replace(profile);
    }

    /// Returns the current device profile.
    pub fn profile(&self) -> Arc<DeviceProfile> {
        self.profile.current()
    }
}

#[async_trait]
impl TransformBuilder for DecoratorConfiguration {
    async fn build(&self, context: ComponentContext) -> Result<Box<dyn Transform + Send>, GenericError> {
        Ok(Box::new(Decorator {
            stage_id: context.component_id().clone(),
            profile: self.profile.clone(),
        }))
    }
}

/// A running decorator.
pub struct Decorator {
    stage_id: ComponentId,
    profile: SnapshotHolder<DeviceProfile>,
}

impl Decorator {
    fn decorate_batch(&self, batch: &Batch) -> Result<Batch, DecorateError> {
        let profile = self.profile.current();
        decorate(batch, &profile, &self.stage_id)
    }
}

#[async_trait]
impl Transform for Decorator {
    async fn run(self: Box<Self>, mut context: TransformContext) -> Result<(), GenericError> {
        let metrics_builder = MetricsBuilder::from_component_context(context.component_context());
        let empty_batches =
            metrics_builder.register_counter_with_labels("component_errors_total", &[("error_type", "empty_batch")]);

        debug!("Decorator transform started.");

        while let Some(batch) = context.batches().next().await {
            debug!(producer = %batch.source(), records = batch.len(), "Received batch.");

            match self.decorate_batch(&batch) {
                Ok(decorated) => {
                    let records = decorated.len();
                    let consumers = context.forwarder().publish(decorated).await;
                    debug!(records, consumers, "Published decorated batch.");
                }
                Err(e) => {
                    empty_batches.increment(1);
                    error!(error = %e, "Dropping batch.");
                }
            }
        }

        debug!("Decorator transform stopped.");

        Ok(())
    }
}
