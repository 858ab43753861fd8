use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use hearth_core::models::GenerationConfig;
use serde::Deserialize;
use uuid::Uuid;

const CONFIG_FILE: &str = "hearth.toml";
const ENV_PREFIX: &str = "HEARTH_";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub database_path: String,
    pub generation: GenerationSettings,
    /// Used by `pattern add` when `--family` is omitted
    pub default_family: Option<Uuid>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "hearth.db".to_string(),
            generation: GenerationSettings::default(),
            default_family: None,
        }
    }
}

/// Generation tunables as they appear in the config file
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GenerationSettings {
    /// Days ahead generated on create and activate
    pub lookahead_days: i64,
    /// Cap on tasks created by one generation run
    pub max_instances: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        let core = GenerationConfig::default();
        Self {
            lookahead_days: core.lookahead_days,
            max_instances: core.max_instances,
        }
    }
}

impl From<&GenerationSettings> for GenerationConfig {
    fn from(settings: &GenerationSettings) -> Self {
        GenerationConfig {
            lookahead_days: settings.lookahead_days,
            max_instances: settings.max_instances,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::from_figment(Self::figment())
    }

    /// `hearth.toml` in the working directory, overridden by `HEARTH_*`
    /// variables. Nested keys use `__`, e.g. `HEARTH_GENERATION__MAX_INSTANCES`.
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        let config: Config = figment.extract()?;
        if config.generation.lookahead_days < 0 {
            return Err(figment::Error::from(format!(
                "generation.lookahead_days must not be negative, got {}",
                config.generation.lookahead_days
            )));
        }
        Ok(config)
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::from(&self.generation)
    }
}
