//! Config command implementation

use crate::cli::{ConfigArgs, SourceArgs};
use crate::config_loader::{config_path, load_config_with_overrides, storm_overrides};
use crate::output::OutputWriter;
use crate::output_types::{source_label, ConfigRow};
use anyhow::Result;
use rainforce_core::config::LayeredConfig;
use std::path::Path;

pub fn execute(args: ConfigArgs, output: &OutputWriter, config_file: Option<&Path>) -> Result<()> {
    let mut overrides = storm_overrides(&args.storm, &SourceArgs::default())?;
    overrides.crs = args.crs;
    let config = load_config_with_overrides(config_file, overrides)?;
    let rows = config_rows(&config);

    if output.is_json() {
        return output.result(rows);
    }

    output.section("Effective Configuration");
    match config_path(config_file) {
        Some(path) => output.kv("File", path.display()),
        None => output.kv("File", "(none)"),
    }
    output.table(rows);

    let params = config.hyetograph_params();
    if let Err(e) = params.validate() {
        output.warning(format!("Storm parameters are not usable: {}", e));
    }

    Ok(())
}

/// Every configuration key with its value and source, sorted by key
fn config_rows(config: &LayeredConfig) -> Vec<ConfigRow> {
    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow {
            key,
            value,
            source: source_label(source).to_string(),
        })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    rows
}
