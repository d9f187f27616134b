//! Configuration loading utilities for CLI commands

use crate::cli::{SourceArgs, StormArgs};
use anyhow::{Context, Result};
use rainforce_core::config::{
    parse_cell_size, parse_coverage_weight, parse_hyeto_method, parse_input_type,
    parse_interp_method, CliConfigOverrides, LayeredConfig, CONFIG_FILE_NAME,
};
use std::path::{Path, PathBuf};

/// Configuration file to read: the explicit one, else `rainforce.toml` in the
/// working directory when it exists
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(CONFIG_FILE_NAME);
            default.is_file().then_some(default)
        }
    }
}

/// Load layered configuration: defaults, file, environment
pub fn load_config(explicit: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_path(explicit) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides on top
pub fn load_config_with_overrides(
    explicit: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(explicit)?;
    config.update_from_cli(overrides);
    Ok(config)
}

/// Overrides shared by every command that synthesizes a storm
pub fn storm_overrides(storm: &StormArgs, source: &SourceArgs) -> Result<CliConfigOverrides> {
    Ok(CliConfigOverrides {
        storm_length_mins: storm.storm_length,
        time_to_peak_mins: storm.time_to_peak,
        increment_mins: storm.increment,
        interp_method: storm.interp.as_deref().map(parse_interp_method).transpose()?,
        hyeto_method: storm.method.as_deref().map(parse_hyeto_method).transpose()?,
        source_url: source.source_url.clone(),
        ..CliConfigOverrides::default()
    })
}

/// Validate and attach the run-only overrides
pub fn with_run_overrides(
    mut overrides: CliConfigOverrides,
    input_type: Option<&str>,
    cell_size: Option<f64>,
    output_dir: Option<PathBuf>,
    min_coverage_weight: Option<f64>,
) -> Result<CliConfigOverrides> {
    overrides.input_type = input_type.map(parse_input_type).transpose()?;
    overrides.grid_cell_size = cell_size.map(parse_cell_size).transpose()?;
    overrides.output_dir = output_dir;
    overrides.min_coverage_weight = min_coverage_weight.map(parse_coverage_weight).transpose()?;
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainforce_core::config::ConfigSource;
    use rainforce_core::models::{HyetoMethod, RainInputType};
    use std::fs;

    #[test]
    fn test_explicit_file_then_cli() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "storm_length_mins = 720\ntime_to_peak_mins = 360\n").unwrap();

        let storm = StormArgs {
            time_to_peak: Some(120),
            method: Some("chicago".to_string()),
            ..StormArgs::default()
        };
        let overrides = storm_overrides(&storm, &SourceArgs::default()).unwrap();
        let config = load_config_with_overrides(Some(&path), overrides).unwrap();

        assert_eq!(config.storm_length_mins.value, 720);
        assert_eq!(config.storm_length_mins.source, ConfigSource::File);
        assert_eq!(config.time_to_peak_mins.value, 120);
        assert_eq!(config.time_to_peak_mins.source, ConfigSource::Cli);
        assert_eq!(config.hyeto_method.value, HyetoMethod::Chicago);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_run_overrides_are_validated() {
        let overrides =
            with_run_overrides(CliConfigOverrides::default(), Some("varying"), Some(25.0), None, None)
                .unwrap();
        assert_eq!(overrides.input_type, Some(RainInputType::Varying));
        assert_eq!(overrides.grid_cell_size, Some(25.0));

        assert!(with_run_overrides(CliConfigOverrides::default(), None, Some(0.0), None, None).is_err());
        assert!(with_run_overrides(CliConfigOverrides::default(), None, None, None, Some(1.5)).is_err());
        assert!(storm_overrides(
            &StormArgs { interp: Some("spline".to_string()), ..StormArgs::default() },
            &SourceArgs::default()
        )
        .is_err());
    }
}
