use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use decorator_config::{ConfigurationLoader, GenericConfiguration};
use decorator_core::{ErrorContext as _, GenericError};

/// Prefix for environment variables that override file-based configuration.
///
/// `DECORATOR_DEVICE_ID` overrides `device.id`, and so on.
pub const ENV_PREFIX: &str = "DECORATOR";

/// Enriches batches of records with static device metadata.
#[derive(Parser)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand)]
pub enum Action {
    /// Runs the decorator stage over standard input and output.
    #[command(name = "run")]
    Run(RunConfig),
}

/// Run subcommand configuration.
#[derive(Args, Debug)]
pub struct RunConfig {
    /// Path to the configuration file, in YAML or JSON.
    ///
    /// Sending `SIGHUP` to the process reloads it.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Identifier the stage tags its output batches with.
    #[arg(long = "stage-id", default_value = "decorator")]
    pub stage_id: String,

    /// Number of batches buffered between standard input and the stage.
    #[arg(long = "buffer-size", default_value_t = 64)]
    pub buffer_size: usize,
}

/// Loads the stage configuration.
///
/// Values from the file at `path`, if given, are layered under environment variables prefixed with `DECORATOR_`.
/// Files ending in `.json` are read as JSON; anything else is read as YAML.
///
/// # Errors
///
/// If the file cannot be read or parsed, or the environment cannot be captured, an error is returned.
pub fn load_configuration(path: Option<&Path>) -> Result<GenericConfiguration, GenericError> {
    let mut loader = ConfigurationLoader::default();

    if let Some(path) = path {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let loaded = if is_json {
            loader.from_json(path)
        } else {
            loader.from_yaml(path)
        };
        loader = loaded.with_error_context(|| format!("Failed to load configuration from '{}'.", path.display()))?;
    }

    let config = loader
        .from_environment(ENV_PREFIX)
        .error_context("Failed to load configuration from environment.")?
        .into_generic();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("decorator-stage-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_run_arguments() {
        let cli = Cli::try_parse_from(["decorator-stage", "run", "--config", "stage.yaml", "--stage-id", "edge"]).unwrap();
        let Action::Run(config) = cli.action;

        assert_eq!(config.config, Some(PathBuf::from("stage.yaml")));
        assert_eq!(config.stage_id, "edge");
        assert_eq!(config.buffer_size, 64);
    }

    #[test]
    fn run_requires_no_arguments() {
        let cli = Cli::try_parse_from(["decorator-stage", "run"]).unwrap();
        let Action::Run(config) = cli.action;

        assert_eq!(config.config, None);
        assert_eq!(config.stage_id, "decorator");
    }

    #[test]
    fn loads_yaml_by_default() {
        let path = write_temp("yaml.yml", "device:\n  id: dev-yaml\n");
        let config = load_configuration(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.get_typed::<String>("device.id").unwrap(), "dev-yaml");
    }

    #[test]
    fn loads_json_by_extension() {
        let path = write_temp("json.json", r#"{"position": {"enable": true, "lat": 45.0}}"#);
        let config = load_configuration(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(config.get_typed::<bool>("position.enable").unwrap());
        assert_eq!(config.get_typed::<f64>("position.lat").unwrap(), 45.0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("decorator-stage-does-not-exist.yaml");
        assert!(load_configuration(Some(path.as_path())).is_err());
    }
}
