use crate::error::{RainforceError, Result};
use crate::models::{HyetoMethod, HyetographParams, InterpMethod, RainInputType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "rainforce.toml";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the forcing pipeline
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// Working CRS (EPSG code) of sites, regions and catchments
    pub crs: ConfigValue<u32>,
    /// Minimum retained coverage weight when sites are excluded
    pub min_coverage_weight: ConfigValue<f64>,
    pub storm_length_mins: ConfigValue<u32>,
    pub time_to_peak_mins: ConfigValue<u32>,
    pub increment_mins: ConfigValue<u32>,
    pub interp_method: ConfigValue<InterpMethod>,
    pub hyeto_method: ConfigValue<HyetoMethod>,
    pub input_type: ConfigValue<RainInputType>,
    /// Grid spacing of the varying field in working-CRS units
    pub grid_cell_size: ConfigValue<f64>,
    pub output_dir: ConfigValue<PathBuf>,
    /// Base URL of the upstream statistics service
    pub source_url: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let hyetograph = HyetographParams::default();
        Self {
            crs: ConfigValue::new(4326, ConfigSource::Default),
            min_coverage_weight: ConfigValue::new(0.8, ConfigSource::Default),
            storm_length_mins: ConfigValue::new(hyetograph.storm_length_mins, ConfigSource::Default),
            time_to_peak_mins: ConfigValue::new(hyetograph.time_to_peak_mins, ConfigSource::Default),
            increment_mins: ConfigValue::new(hyetograph.increment_mins, ConfigSource::Default),
            interp_method: ConfigValue::new(hyetograph.interp, ConfigSource::Default),
            hyeto_method: ConfigValue::new(hyetograph.method, ConfigSource::Default),
            input_type: ConfigValue::new(RainInputType::Uniform, ConfigSource::Default),
            grid_cell_size: ConfigValue::new(0.001, ConfigSource::Default),
            output_dir: ConfigValue::new(PathBuf::from("output"), ConfigSource::Default),
            source_url: ConfigValue::new("http://localhost:8080".to_string(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| RainforceError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| RainforceError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(crs) = file_config.crs {
            self.crs.update(crs, ConfigSource::File);
        }
        if let Some(weight) = file_config.min_coverage_weight {
            self.min_coverage_weight.update(parse_coverage_weight(weight)?, ConfigSource::File);
        }
        if let Some(mins) = file_config.storm_length_mins {
            self.storm_length_mins.update(mins, ConfigSource::File);
        }
        if let Some(mins) = file_config.time_to_peak_mins {
            self.time_to_peak_mins.update(mins, ConfigSource::File);
        }
        if let Some(mins) = file_config.increment_mins {
            self.increment_mins.update(mins, ConfigSource::File);
        }
        if let Some(method) = file_config.interp_method {
            self.interp_method.update(parse_interp_method(&method)?, ConfigSource::File);
        }
        if let Some(method) = file_config.hyeto_method {
            self.hyeto_method.update(parse_hyeto_method(&method)?, ConfigSource::File);
        }
        if let Some(input_type) = file_config.input_type {
            self.input_type.update(parse_input_type(&input_type)?, ConfigSource::File);
        }
        if let Some(size) = file_config.grid_cell_size {
            self.grid_cell_size.update(parse_cell_size(size)?, ConfigSource::File);
        }
        if let Some(dir) = file_config.output_dir {
            self.output_dir.update(dir, ConfigSource::File);
        }
        if let Some(url) = file_config.source_url {
            self.source_url.update(url, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // RAINFORCE_CRS
        if let Ok(crs_str) = env::var("RAINFORCE_CRS") {
            match crs_str.trim_start_matches("EPSG:").parse::<u32>() {
                Ok(crs) => self.crs.update(crs, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid RAINFORCE_CRS value '{}': expected integer EPSG code",
                    crs_str
                ),
            }
        }

        // RAINFORCE_MIN_COVERAGE_WEIGHT
        if let Ok(weight_str) = env::var("RAINFORCE_MIN_COVERAGE_WEIGHT") {
            match weight_str.parse::<f64>().map_err(|_| ()).and_then(|w| {
                parse_coverage_weight(w).map_err(|_| ())
            }) {
                Ok(weight) => self.min_coverage_weight.update(weight, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid RAINFORCE_MIN_COVERAGE_WEIGHT value '{}': expected a number in [0, 1]",
                    weight_str
                ),
            }
        }

        for (var, target) in [
            ("RAINFORCE_STORM_LENGTH_MINS", &mut self.storm_length_mins),
            ("RAINFORCE_TIME_TO_PEAK_MINS", &mut self.time_to_peak_mins),
            ("RAINFORCE_INCREMENT_MINS", &mut self.increment_mins),
        ] {
            if let Ok(mins_str) = env::var(var) {
                match mins_str.parse::<u32>() {
                    Ok(mins) => target.update(mins, ConfigSource::Environment),
                    Err(_) => tracing::warn!(
                        "Invalid {} value '{}': expected whole minutes",
                        var,
                        mins_str
                    ),
                }
            }
        }

        // RAINFORCE_INTERP_METHOD
        if let Ok(method_str) = env::var("RAINFORCE_INTERP_METHOD") {
            match parse_interp_method(&method_str) {
                Ok(method) => self.interp_method.update(method, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid RAINFORCE_INTERP_METHOD value '{}': expected linear or cubic",
                    method_str
                ),
            }
        }

        // RAINFORCE_HYETO_METHOD
        if let Ok(method_str) = env::var("RAINFORCE_HYETO_METHOD") {
            match parse_hyeto_method(&method_str) {
                Ok(method) => self.hyeto_method.update(method, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid RAINFORCE_HYETO_METHOD value '{}': expected alt_block or chicago",
                    method_str
                ),
            }
        }

        // RAINFORCE_INPUT_TYPE
        if let Ok(type_str) = env::var("RAINFORCE_INPUT_TYPE") {
            match parse_input_type(&type_str) {
                Ok(input_type) => self.input_type.update(input_type, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid RAINFORCE_INPUT_TYPE value '{}': expected uniform or varying",
                    type_str
                ),
            }
        }

        // RAINFORCE_GRID_CELL_SIZE
        if let Ok(size_str) = env::var("RAINFORCE_GRID_CELL_SIZE") {
            match size_str
                .parse::<f64>()
                .map_err(|_| ())
                .and_then(|s| parse_cell_size(s).map_err(|_| ()))
            {
                Ok(size) => self.grid_cell_size.update(size, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid RAINFORCE_GRID_CELL_SIZE value '{}': expected a positive number",
                    size_str
                ),
            }
        }

        if let Ok(dir) = env::var("RAINFORCE_OUTPUT_DIR") {
            self.output_dir.update(PathBuf::from(dir), ConfigSource::Environment);
        }

        if let Ok(url) = env::var("RAINFORCE_SOURCE_URL") {
            self.source_url.update(url, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(crs) = overrides.crs {
            self.crs.update(crs, ConfigSource::Cli);
        }
        if let Some(weight) = overrides.min_coverage_weight {
            self.min_coverage_weight.update(weight, ConfigSource::Cli);
        }
        if let Some(mins) = overrides.storm_length_mins {
            self.storm_length_mins.update(mins, ConfigSource::Cli);
        }
        if let Some(mins) = overrides.time_to_peak_mins {
            self.time_to_peak_mins.update(mins, ConfigSource::Cli);
        }
        if let Some(mins) = overrides.increment_mins {
            self.increment_mins.update(mins, ConfigSource::Cli);
        }
        if let Some(method) = overrides.interp_method {
            self.interp_method.update(method, ConfigSource::Cli);
        }
        if let Some(method) = overrides.hyeto_method {
            self.hyeto_method.update(method, ConfigSource::Cli);
        }
        if let Some(input_type) = overrides.input_type {
            self.input_type.update(input_type, ConfigSource::Cli);
        }
        if let Some(size) = overrides.grid_cell_size {
            self.grid_cell_size.update(size, ConfigSource::Cli);
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir.update(dir, ConfigSource::Cli);
        }
        if let Some(url) = overrides.source_url {
            self.source_url.update(url, ConfigSource::Cli);
        }
    }

    /// Design storm parameters assembled from the layered values
    pub fn hyetograph_params(&self) -> HyetographParams {
        HyetographParams {
            storm_length_mins: self.storm_length_mins.value,
            time_to_peak_mins: self.time_to_peak_mins.value,
            increment_mins: self.increment_mins.value,
            interp: self.interp_method.value,
            method: self.hyeto_method.value,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("crs".to_string(), (format!("EPSG:{}", self.crs.value), self.crs.source));
        map.insert(
            "min_coverage_weight".to_string(),
            (self.min_coverage_weight.value.to_string(), self.min_coverage_weight.source),
        );
        map.insert(
            "storm_length_mins".to_string(),
            (self.storm_length_mins.value.to_string(), self.storm_length_mins.source),
        );
        map.insert(
            "time_to_peak_mins".to_string(),
            (self.time_to_peak_mins.value.to_string(), self.time_to_peak_mins.source),
        );
        map.insert(
            "increment_mins".to_string(),
            (self.increment_mins.value.to_string(), self.increment_mins.source),
        );
        map.insert(
            "interp_method".to_string(),
            (self.interp_method.value.to_string(), self.interp_method.source),
        );
        map.insert(
            "hyeto_method".to_string(),
            (self.hyeto_method.value.to_string(), self.hyeto_method.source),
        );
        map.insert(
            "input_type".to_string(),
            (self.input_type.value.to_string(), self.input_type.source),
        );
        map.insert(
            "grid_cell_size".to_string(),
            (self.grid_cell_size.value.to_string(), self.grid_cell_size.source),
        );
        map.insert(
            "output_dir".to_string(),
            (self.output_dir.value.display().to_string(), self.output_dir.source),
        );
        map.insert("source_url".to_string(), (self.source_url.value.clone(), self.source_url.source));

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    crs: Option<u32>,
    min_coverage_weight: Option<f64>,
    storm_length_mins: Option<u32>,
    time_to_peak_mins: Option<u32>,
    increment_mins: Option<u32>,
    interp_method: Option<String>,
    hyeto_method: Option<String>,
    input_type: Option<String>,
    grid_cell_size: Option<f64>,
    output_dir: Option<PathBuf>,
    source_url: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub crs: Option<u32>,
    pub min_coverage_weight: Option<f64>,
    pub storm_length_mins: Option<u32>,
    pub time_to_peak_mins: Option<u32>,
    pub increment_mins: Option<u32>,
    pub interp_method: Option<InterpMethod>,
    pub hyeto_method: Option<HyetoMethod>,
    pub input_type: Option<RainInputType>,
    pub grid_cell_size: Option<f64>,
    pub output_dir: Option<PathBuf>,
    pub source_url: Option<String>,
}

fn as_config_error(key: &str, err: RainforceError) -> RainforceError {
    RainforceError::ConfigInvalid { key: key.to_string(), reason: err.to_string() }
}

/// Parse interpolation method from string
pub fn parse_interp_method(s: &str) -> Result<InterpMethod> {
    s.parse().map_err(|e| as_config_error("interp_method", e))
}

/// Parse hyetograph method from string
pub fn parse_hyeto_method(s: &str) -> Result<HyetoMethod> {
    s.parse().map_err(|e| as_config_error("hyeto_method", e))
}

/// Parse rain input type from string
pub fn parse_input_type(s: &str) -> Result<RainInputType> {
    s.parse().map_err(|e| as_config_error("input_type", e))
}

/// Validate a minimum coverage weight
pub fn parse_coverage_weight(weight: f64) -> Result<f64> {
    if weight.is_finite() && (0.0..=1.0).contains(&weight) {
        Ok(weight)
    } else {
        Err(RainforceError::ConfigInvalid {
            key: "min_coverage_weight".to_string(),
            reason: format!("{} is not in [0, 1]", weight),
        })
    }
}

/// Validate a grid cell size
pub fn parse_cell_size(size: f64) -> Result<f64> {
    if size.is_finite() && size > 0.0 {
        Ok(size)
    } else {
        Err(RainforceError::ConfigInvalid {
            key: "grid_cell_size".to_string(),
            reason: format!("{} is not a positive cell size", size),
        })
    }
}
