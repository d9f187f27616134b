//! Hyetograph command implementation

use crate::cli::{HyetographArgs, StorageBackend};
use crate::config_loader::{load_config_with_overrides, storm_overrides};
use crate::inputs::{rainfall_source, scenario};
use crate::output::OutputWriter;
use crate::output_types::HyetographOutput;
use crate::storage::Storage;
use anyhow::{Context, Result};
use rainforce_core::models::SiteId;
use rainforce_synthesis::{PipelineSettings, RainfallPipeline};
use std::path::Path;

pub async fn execute(
    args: HyetographArgs,
    output: &OutputWriter,
    backend: StorageBackend,
    config_file: Option<&Path>,
) -> Result<()> {
    let overrides = storm_overrides(&args.storm, &args.source)?;
    let config = load_config_with_overrides(config_file, overrides)?;
    let scenario = scenario(&args.scenario)?;

    let storage = Storage::new(backend).await?;
    let source = rainfall_source(&args.source, &config)?;
    let settings = PipelineSettings::from_config(&config);
    let method = settings.params.method;

    let pipeline = RainfallPipeline::new(
        storage.registry,
        storage.influence,
        storage.statistics,
        source,
        settings,
    );

    let site_id = SiteId::new(args.site.trim());
    let hyetograph = pipeline
        .site_hyetograph(&site_id, &scenario, args.scenario.kind.into())
        .await
        .with_context(|| format!("Failed to synthesize the hyetograph of site {}", site_id))?;

    let summary = HyetographOutput::new(&hyetograph, scenario.key());
    if output.is_json() {
        return output.result(summary);
    }

    output.section(format!("Hyetograph {}", summary.site_id));
    output.kv("Scenario", &summary.scenario);
    output.kv("Method", method);
    output.kv("Increment", format!("{} min", summary.increment_mins));
    output.kv("Total depth", format!("{:.2} mm", summary.total_depth_mm));
    if let Some(peak) = summary.peak_mins {
        output.kv("Peak", format!("{} min", peak));
    }
    output.table(summary.points);

    Ok(())
}
