//! The `config` module loads broker settings from an optional TOML file and
//! `TOPICQ_`-prefixed environment variables, filling gaps with defaults.
//!
//! Nested keys use a double underscore in the environment, for example
//! `TOPICQ_SERVER__PORT=9000` or `TOPICQ_BROKER__MAX_FRAME_BYTES=1048576`.

mod settings;

use std::path::Path;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{BrokerSettings, LoggingSettings, ServerSettings, Settings};

const DEFAULT_CONFIG_FILE: &str = "config/default";
const ENV_PREFIX: &str = "TOPICQ";

/// Loads the configuration from `config/default.*` (if present) and the
/// environment, merged over default values.
pub fn load_config() -> Result<Settings, ConfigError> {
    load(File::with_name(DEFAULT_CONFIG_FILE).required(false))
}

/// Like [`load_config`] but reads the given file, which must exist.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    load(File::from(path.as_ref()).required(true))
}

fn load<S>(file: S) -> Result<Settings, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let config = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Try to deserialize what is available, then merge with defaults
    let partial: PartialSettings = config.try_deserialize()?;
    Ok(partial.merge_with_defaults())
}
