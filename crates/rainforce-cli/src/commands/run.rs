//! Run command implementation

use crate::cli::{RunArgs, StorageBackend};
use crate::config_loader::{load_config_with_overrides, storm_overrides, with_run_overrides};
use crate::inputs::{forcing_request, rainfall_source};
use crate::output::OutputWriter;
use crate::output_types::CoverageRow;
use crate::storage::Storage;
use anyhow::{Context, Result};
use rainforce_synthesis::{PipelineSettings, RainfallPipeline};
use std::path::Path;

pub async fn execute(
    args: RunArgs,
    output: &OutputWriter,
    backend: StorageBackend,
    config_file: Option<&Path>,
) -> Result<()> {
    let mut overrides = storm_overrides(&args.storm, &args.source)?;
    overrides.crs = args.request.crs;
    let overrides = with_run_overrides(
        overrides,
        args.input_type.as_deref(),
        args.cell_size,
        args.output_dir.clone(),
        args.min_coverage_weight,
    )?;
    let config = load_config_with_overrides(config_file, overrides)?;

    let request = forcing_request(&args.request, &args.scenario, &config)?;
    let storage = Storage::new(backend).await?;
    let source = rainfall_source(&args.source, &config)?;

    let pipeline = RainfallPipeline::new(
        storage.registry,
        storage.influence,
        storage.statistics,
        source,
        PipelineSettings::from_config(&config),
    );

    let report = pipeline
        .run_with_progress(&request, |phase| tracing::debug!(phase = %phase, "Pipeline phase"))
        .await
        .context("Forcing run failed")?;

    if output.is_json() {
        return output.result(&report);
    }

    output.section("Rainfall Forcing");
    output.kv("Run", report.run_id);
    output.kv("Scenario", &report.scenario);
    output.kv("Input type", report.input_type);
    output.kv("Time steps", report.time_steps);
    output.kv("Peak intensity", format!("{:.2} mm/hr", report.peak_intensity_mmhr));

    output.section("Contributing Sites");
    let rows: Vec<CoverageRow> = report
        .sites
        .iter()
        .map(|s| CoverageRow { site_id: s.site_id.to_string(), weight: s.weight, area_m2: s.area_m2 })
        .collect();
    output.table(rows);

    if !report.excluded.is_empty() {
        let excluded: Vec<String> = report.excluded.iter().map(|s| s.to_string()).collect();
        output.warning(format!(
            "Excluded {} unavailable site(s): {} ({:.1}% of the catchment retained)",
            excluded.len(),
            excluded.join(", "),
            report.retained_weight * 100.0
        ));
    }
    for removed in &report.removed_artifacts {
        output.info(format!("Removed stale artifact {}", removed.display()));
    }
    output.success(format!("Wrote {}", report.artifact.display()));

    Ok(())
}
