//! Primitives for working with typed and untyped configuration data.
#![deny(warnings)]
#![deny(missing_docs)]

use std::{borrow::Cow, collections::HashSet, sync::Arc};

pub use figment::value;
use figment::{
    error::Kind,
    providers::{Env, Serialized},
    value::{Num, Value},
    Figment, Provider,
};
use serde::Deserialize;
use snafu::{ResultExt as _, Snafu};
use tracing::debug;

mod provider;
use self::provider::ResolvedProvider;

/// An untyped property map, as delivered by a hosting runtime.
///
/// Keys are period-separated paths (`position.lat`), values are arbitrary JSON values.
pub type PropertyMap = serde_json::Map<String, serde_json::Value>;

/// A configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigurationError {
    /// Environment variable prefix was empty.
    #[snafu(display("Environment variable prefix must not be empty."))]
    EmptyPrefix,

    /// Requested field was missing from the configuration.
    #[snafu(display("Missing field '{}' in configuration. {}", field, help_text))]
    MissingField {
        /// Help text describing how to set the missing field.
        ///
        /// Includes the environment variable form of the key if environment variables were loaded.
        help_text: String,

        /// Name of the missing field.
        field: Cow<'static, str>,
    },

    /// Requested field's data type was not the expected data type.
    #[snafu(display(
        "Expected value for field '{}' to be '{}', got '{}' instead.",
        field,
        expected_ty,
        actual_ty
    ))]
    InvalidFieldType {
        /// Name of the invalid field.
        ///
        /// This is a period-separated path to the field.
        field: String,

        /// Expected data type.
        expected_ty: String,

        /// Actual data type.
        actual_ty: String,
    },

    /// Generic configuration error.
    #[snafu(display("Failed to query configuration."))]
    Generic {
        /// Error source.
        source: figment::Error,
    },
}

impl From<figment::Error> for ConfigurationError {
    fn from(e: figment::Error) -> Self {
        match e.kind {
            Kind::InvalidType(actual_ty, expected_ty) => Self::InvalidFieldType {
                field: e.path.join("."),
                expected_ty,
                actual_ty: actual_ty.to_string(),
            },
            _ => Self::Generic { source: e },
        }
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum LookupSource {
    /// The configuration key is looked up in a form suitable for environment variables.
    Environment { prefix: String },
}

impl LookupSource {
    fn transform_key(&self, key: &str) -> String {
        match self {
            // The prefix is already uppercased with a trailing underscore.
            LookupSource::Environment { prefix } => format!("{}{}", prefix, key.replace('.', "_").to_uppercase()),
        }
    }
}

struct BoxedProvider(Box<dyn Provider + Send + Sync>);

impl Provider for BoxedProvider {
    fn metadata(&self) -> figment::Metadata {
        self.0.metadata()
    }

    fn data(&self) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        self.0.data()
    }
}

/// A configuration loader that can pull from various sources.
///
/// This loader wraps `figment` to expose a small API for loading configuration data from various sources and then
/// querying it. Sources added later take precedence over sources added earlier.
///
/// # Supported sources
///
/// - YAML file
/// - JSON file
/// - environment variables (must be prefixed; see [`from_environment`][Self::from_environment])
/// - an in-memory property map (see [`from_properties`][Self::from_properties])
#[derive(Default)]
pub struct ConfigurationLoader {
    lookup_sources: HashSet<LookupSource>,
    providers: Vec<BoxedProvider>,
}

impl ConfigurationLoader {
    /// Loads the given YAML configuration file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or if the file is not valid YAML, an error will be returned.
    pub fn from_yaml<P>(mut self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<std::path::Path>,
    {
        let resolved_provider = ResolvedProvider::from_yaml(&path).context(Generic)?;
        self.providers.push(BoxedProvider(Box::new(resolved_provider)));
        Ok(self)
    }

    /// Loads the given JSON configuration file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or if the file is not valid JSON, an error will be returned.
    pub fn from_json<P>(mut self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<std::path::Path>,
    {
        let resolved_provider = ResolvedProvider::from_json(&path).context(Generic)?;
        self.providers.push(BoxedProvider(Box::new(resolved_provider)));
        Ok(self)
    }

    /// Loads configuration from environment variables.
    ///
    /// The prefix given will have an underscore appended to it if it does not already end with one. For example, with a
    /// prefix of `app`, any environment variable starting with `app_` would be matched.
    ///
    /// # Errors
    ///
    /// If the prefix is empty, or the environment could not be read, an error will be returned.
    pub fn from_environment(mut self, prefix: &'static str) -> Result<Self, ConfigurationError> {
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }

        let prefix = if prefix.ends_with('_') {
            prefix.to_string()
        } else {
            format!("{}_", prefix)
        };

        // `Env` isn't `Send + Sync`, so we snapshot it into a serialized provider.
        let values = Env::prefixed(&prefix).data().context(Generic)?;
        if let Some(default_dict) = values.get(&figment::Profile::Default) {
            self.providers
                .push(BoxedProvider(Box::new(Serialized::defaults(default_dict.clone()))));
            debug!(prefix = %prefix, variables = default_dict.len(), "Loaded configuration from environment.");
            self.lookup_sources.insert(LookupSource::Environment {
                prefix: prefix.to_uppercase(),
            });
        }
        Ok(self)
    }

    /// Loads configuration from an untyped property map.
    ///
    /// Each key is treated as a period-separated path, so `position.lat` ends up nested as `lat` under `position`.
    pub fn from_properties(mut self, properties: &PropertyMap) -> Self {
        for (key, value) in properties {
            self.providers
                .push(BoxedProvider(Box::new(Serialized::default(key, value.clone()))));
        }
        self
    }

    /// Consumes the configuration loader and wraps it in a generic wrapper.
    pub fn into_generic(self) -> GenericConfiguration {
        GenericConfiguration {
            inner: Arc::new(Inner {
                figment: merge_providers(&self.providers),
                lookup_sources: self.lookup_sources,
            }),
        }
    }
}

fn merge_providers(providers: &[BoxedProvider]) -> Figment {
    providers
        .iter()
        .fold(Figment::new(), |figment, provider| figment.admerge(provider))
}

#[derive(Debug)]
struct Inner {
    figment: Figment,
    lookup_sources: HashSet<LookupSource>,
}

/// A generic configuration object.
///
/// This represents the merged configuration derived from [`ConfigurationLoader`] in its raw form. Values can be
/// queried by key, and can be extracted either as typed values or in their raw form.
///
/// Keys must be in the form of `a.b.c`, where periods (`.`) are used to indicate a nested value.
///
/// A `GenericConfiguration` is an immutable snapshot: picking up new values means building a new one.
#[derive(Clone, Debug)]
pub struct GenericConfiguration {
    inner: Arc<Inner>,
}

impl GenericConfiguration {
    /// Creates a `GenericConfiguration` directly from an untyped property map.
    pub fn from_properties(properties: &PropertyMap) -> Self {
        ConfigurationLoader::default().from_properties(properties).into_generic()
    }

    fn get<'a, T>(&self, key: &str) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        // Environment variables only ever produce flat keys, so `device.id` arrives as `device_id`. When environment
        // variables were loaded, the flat form is tried first so that it overrides nested values from files.
        let flat_key = key.replace('.', "_");
        let candidates = if flat_key == key {
            vec![key]
        } else if self.inner.lookup_sources.is_empty() {
            vec![key, flat_key.as_str()]
        } else {
            vec![flat_key.as_str(), key]
        };

        let mut last_error = None;
        for candidate in candidates {
            match self.inner.figment.extract_inner(candidate) {
                Ok(value) => return Ok(value),
                Err(e) if matches!(e.kind, Kind::MissingField(_)) => last_error = Some(e),
                Err(e) => return Err(e.into()),
            }
        }

        match last_error {
            Some(e) => Err(from_figment_error(&self.inner.lookup_sources, key, e)),
            None => Err(ConfigurationError::MissingField {
                help_text: format!("Try setting `{}`.", key),
                field: key.to_string().into(),
            }),
        }
    }

    /// Gets a configuration value by key.
    ///
    /// # Errors
    ///
    /// If the key does not exist in the configuration, or if the value could not be deserialized into `T`, an error
    /// variant will be returned.
    pub fn get_typed<'a, T>(&self, key: &str) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        self.get(key)
    }

    /// Gets a configuration value by key, if it exists.
    ///
    /// If the key exists in the configuration, and can be deserialized, `Ok(Some(value))` is returned. If the key does
    /// not exist, `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// If the value could not be deserialized into `T`, an error will be returned.
    pub fn try_get_typed<'a, T>(&self, key: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        match self.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigurationError::MissingField { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Gets a string configuration value by key, if it exists.
    ///
    /// Scalar numbers and booleans are accepted and rendered in their string form, so `12345` reads as `"12345"`.
    /// Environment variables are parsed into the narrowest scalar type, so `PREFIX_DEVICE_ID=12345` arrives as a number.
    ///
    /// # Errors
    ///
    /// If the value is not a scalar, an error will be returned.
    pub fn try_get_string(&self, key: &str) -> Result<Option<String>, ConfigurationError> {
        let value = match self.try_get_typed::<Value>(key)? {
            Some(value) => value,
            None => return Ok(None),
        };

        match value {
            Value::String(_, s) => Ok(Some(s)),
            Value::Char(_, c) => Ok(Some(c.to_string())),
            Value::Bool(_, b) => Ok(Some(b.to_string())),
            Value::Num(_, n) => Ok(Some(num_to_string(n))),
            other => Err(ConfigurationError::InvalidFieldType {
                field: key.to_string(),
                expected_ty: "a string".to_string(),
                actual_ty: other.to_actual().to_string(),
            }),
        }
    }
}

fn num_to_string(num: Num) -> String {
    match num {
        Num::U8(n) => n.to_string(),
        Num::U16(n) => n.to_string(),
        Num::U32(n) => n.to_string(),
        Num::U64(n) => n.to_string(),
        Num::U128(n) => n.to_string(),
        Num::USize(n) => n.to_string(),
        Num::I8(n) => n.to_string(),
        Num::I16(n) => n.to_string(),
        Num::I32(n) => n.to_string(),
        Num::I64(n) => n.to_string(),
        Num::I128(n) => n.to_string(),
        Num::ISize(n) => n.to_string(),
        Num::F32(n) => n.to_string(),
        Num::F64(n) => n.to_string(),
    }
}

fn from_figment_error(lookup_sources: &HashSet<LookupSource>, key: &str, e: figment::Error) -> ConfigurationError {
    match e.kind {
        Kind::MissingField(_) => {
            let mut valid_keys = lookup_sources
                .iter()
                .map(|source| source.transform_key(key))
                .collect::<Vec<_>>();

            // Always specify the original key as a valid key to try.
            valid_keys.insert(0, key.to_string());

            let help_text = format!("Try setting `{}`.", valid_keys.join("` or `"));

            ConfigurationError::MissingField {
                help_text,
                field: key.to_string().into(),
            }
        }
        _ => e.into(),
    }
}
