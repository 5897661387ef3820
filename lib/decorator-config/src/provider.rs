use std::path::Path;

use figment::{
    providers::{Format, Json, Yaml},
    value::{Dict, Map},
    Error, Metadata, Profile, Provider,
};

/// A file-backed provider whose contents are read once, up front.
///
/// Reading eagerly means a missing or malformed file surfaces at load time instead of on first query.
pub struct ResolvedProvider {
    data: Map<Profile, Dict>,
    metadata: Metadata,
}

impl ResolvedProvider {
    pub fn from_yaml<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        Self::from_file::<Yaml>("YAML file", path.as_ref())
    }

    pub fn from_json<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        Self::from_file::<Json>("JSON file", path.as_ref())
    }

    fn from_file<F: Format>(name: &'static str, path: &Path) -> Result<Self, Error> {
        let file_data = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let data = F::string(&file_data).data()?;

        Ok(Self {
            data,
            metadata: Metadata::from(name, path),
        })
    }
}

impl Provider for ResolvedProvider {
    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        Ok(self.data.clone())
    }
}
