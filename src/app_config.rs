use crate::light::WriteMode;
use config::{Config, ConfigError};
use serde::Deserialize;
use std::str::FromStr;
use tracing::Level;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    core: Core,
    devices: Devices,
    #[serde(default)]
    light: Light,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    pub fn light(&self) -> &Light {
        &self.light
    }
}

#[derive(Debug, Deserialize)]
pub struct Core {
    log_level: String,
}

impl Core {
    /// The configured log level, `INFO` when it cannot be parsed.
    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

#[derive(Debug, Deserialize)]
pub struct Devices {
    directory: String,
    extension: String,
}

impl Devices {
    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Light {
    #[serde(default)]
    write_mode: WriteMode,
}

impl Light {
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                core: Core {
                    log_level: "info".to_string(),
                },
                devices: Devices {
                    directory: "devices".to_string(),
                    extension: "json".to_string(),
                },
                light: Light::default(),
            },
        }
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.core.log_level = level.to_string();
        self
    }

    pub fn write_mode(mut self, write_mode: WriteMode) -> Self {
        self.config.light.write_mode = write_mode;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
