//! Partition command implementation

use crate::cli::{PartitionArgs, ScenarioArgs, StorageBackend, StormArgs};
use crate::config_loader::{load_config_with_overrides, storm_overrides};
use crate::inputs::{forcing_request, rainfall_source};
use crate::output::OutputWriter;
use crate::output_types::{CoverageRow, PartitionOutput};
use crate::storage::Storage;
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use rainforce_core::models::SiteCoverage;
use rainforce_synthesis::{PipelineSettings, RainfallPipeline};
use std::fs;
use std::path::Path;

pub async fn execute(
    args: PartitionArgs,
    output: &OutputWriter,
    backend: StorageBackend,
    config_file: Option<&Path>,
) -> Result<()> {
    let mut overrides = storm_overrides(&StormArgs::default(), &args.source)?;
    overrides.crs = args.request.crs;
    let config = load_config_with_overrides(config_file, overrides)?;

    // Partitioning needs no scenario; the default one only fills the request
    let request = forcing_request(&args.request, &ScenarioArgs::default(), &config)?;
    let storage = Storage::new(backend).await?;
    let source = rainfall_source(&args.source, &config)?;

    let pipeline = RainfallPipeline::new(
        storage.registry,
        storage.influence,
        storage.statistics,
        source,
        PipelineSettings::from_config(&config),
    );

    let areas = if args.rebuild {
        pipeline.rebuild_influence_areas(&request).await
    } else {
        pipeline.influence_areas(&request).await
    }
    .context("Failed to partition the region")?;

    let coverages = pipeline.coverage(&request).await.context("Failed to resolve coverage")?;

    let exported = match &args.export {
        Some(path) => {
            fs::write(path, coverage_geojson(&coverages).to_string())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Some(path.display().to_string())
        }
        None => None,
    };

    let rows = coverage_rows(&coverages);
    if output.is_json() {
        return output.result(PartitionOutput {
            influence_areas: areas.len(),
            rebuilt: args.rebuild,
            coverage: rows,
            exported,
        });
    }

    output.section("Catchment Coverage");
    output.kv("Influence areas", areas.len());
    output.kv("Covering sites", rows.len());
    output.table(rows);
    if let Some(path) = exported {
        output.success(format!("Exported coverage polygons to {}", path));
    }

    Ok(())
}

/// Coverage rows, largest share first
fn coverage_rows(coverages: &[SiteCoverage]) -> Vec<CoverageRow> {
    let mut rows: Vec<CoverageRow> = coverages.iter().map(CoverageRow::from).collect();
    rows.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    rows
}

/// Clipped coverage polygons with their site and weight as properties
fn coverage_geojson(coverages: &[SiteCoverage]) -> FeatureCollection {
    let features = coverages
        .iter()
        .map(|coverage| {
            let mut properties = JsonObject::new();
            properties.insert("site_id".to_string(), JsonValue::from(coverage.site_id.to_string()));
            properties.insert("weight".to_string(), JsonValue::from(coverage.weight));
            properties.insert("area_m2".to_string(), JsonValue::from(coverage.area_m2));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&coverage.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection { bbox: None, features, foreign_members: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainforce_core::models::SiteId;
    use rainforce_geo::models::bbox_polygon;

    fn coverage(id: &str, weight: f64) -> SiteCoverage {
        SiteCoverage {
            site_id: SiteId::new(id),
            site_location: [0.0, 0.0],
            geometry: bbox_polygon(0.0, 0.0, weight, 1.0),
            area_m2: weight * 1.0e6,
            weight,
        }
    }

    #[test]
    fn test_rows_sorted_by_weight() {
        let rows = coverage_rows(&[coverage("a", 0.25), coverage("b", 0.75)]);
        assert_eq!(rows[0].site_id, "b");
        assert_eq!(rows[1].site_id, "a");
    }

    #[test]
    fn test_geojson_export_properties() {
        let collection = coverage_geojson(&[coverage("a", 0.25)]);
        let json: serde_json::Value = serde_json::from_str(&collection.to_string()).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        let feature = &json["features"][0];
        assert_eq!(feature["properties"]["site_id"], "a");
        assert_eq!(feature["properties"]["weight"], 0.25);
        assert_eq!(feature["geometry"]["type"], "MultiPolygon");
    }
}
