mod common;

use common::{depth_records, CountingSource};
use rainforce_core::models::{
    HyetoMethod, HyetographParams, InterpMethod, RainInputType, Scenario, Site,
};
use rainforce_core::RainforceError;
use rainforce_geo::models::bbox_polygon;
use rainforce_store::{
    MemoryInfluenceAreaStore, MemorySiteRegistry, MemoryStatisticsStore, SiteRegistry,
};
use rainforce_synthesis::{ForcingRequest, PipelinePhase, PipelineSettings, RainfallPipeline};
use std::fs;
use std::path::Path;
use std::sync::Arc;

struct Fixture {
    pipeline: RainfallPipeline,
    source: Arc<CountingSource>,
    registry: Arc<MemorySiteRegistry>,
    influence: Arc<MemoryInfluenceAreaStore>,
}

fn sites() -> Vec<Site> {
    vec![
        Site::new("ne", 1.0, 1.0),
        Site::new("nw", -1.0, 1.0),
        Site::new("sw", -1.0, -1.0),
        Site::new("se", 1.0, -1.0),
    ]
}

fn fixture(output_dir: &Path, input_type: RainInputType) -> Fixture {
    let records = vec![
        depth_records("ne", 1.0),
        depth_records("nw", 2.0),
        depth_records("sw", 1.0),
        depth_records("se", 1.0),
    ]
    .into_iter()
    .flatten()
    .collect();
    let source = Arc::new(CountingSource::new(sites(), records));
    let registry = Arc::new(MemorySiteRegistry::new());
    let influence = Arc::new(MemoryInfluenceAreaStore::new());

    let settings = PipelineSettings {
        params: HyetographParams {
            storm_length_mins: 60,
            time_to_peak_mins: 30,
            increment_mins: 10,
            interp: InterpMethod::Cubic,
            method: HyetoMethod::AltBlock,
        },
        input_type,
        grid_cell_size: 0.05,
        output_dir: output_dir.to_path_buf(),
        ..PipelineSettings::default()
    };

    let pipeline = RainfallPipeline::new(
        registry.clone(),
        influence.clone(),
        Arc::new(MemoryStatisticsStore::new()),
        source.clone(),
        settings,
    );
    Fixture { pipeline, source, registry, influence }
}

/// Square catchment split evenly between the two northern sites
fn request() -> ForcingRequest {
    ForcingRequest::new(bbox_polygon(-0.5, 0.2, 0.5, 0.6), Scenario::default())
        .with_region(bbox_polygon(-2.0, -2.0, 2.0, 2.0))
}

#[tokio::test]
async fn uniform_run_writes_weighted_series() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(dir.path(), RainInputType::Uniform);

    let mut phases = Vec::new();
    let report = fx.pipeline.run_with_progress(&request(), |p| phases.push(p)).await.unwrap();

    assert_eq!(phases, PipelinePhase::ALL.to_vec());
    assert_eq!(fx.registry.site_count().await.unwrap(), 4);
    assert_eq!(report.artifact, dir.path().join("rain_forcing.txt"));
    assert_eq!(report.input_type, RainInputType::Uniform);
    assert_eq!(report.time_steps, 7);
    assert!(report.excluded.is_empty());

    let mut sites: Vec<(String, f64)> =
        report.sites.iter().map(|s| (s.site_id.to_string(), s.weight)).collect();
    sites.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].0, "ne");
    assert_eq!(sites[1].0, "nw");
    assert!((sites[0].1 - 0.5).abs() < 1e-6);
    assert!((sites[1].1 - 0.5).abs() < 1e-6);

    // nw has twice the depth of ne, so the mean storm delivers 1.5 x 18 mm
    let text = fs::read_to_string(&report.artifact).unwrap();
    let rows: Vec<(f64, f64)> = text
        .lines()
        .map(|line| {
            let mut cols = line.split_whitespace().map(|c| c.parse::<f64>().unwrap());
            (cols.next().unwrap(), cols.next().unwrap())
        })
        .collect();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[3].0, 1800.0);
    let depth: f64 = rows.iter().map(|(_, intensity)| intensity * 10.0 / 60.0).sum();
    assert!((depth - 27.0).abs() < 1e-4);
}

#[tokio::test]
async fn second_run_reuses_partition_and_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(dir.path(), RainInputType::Uniform);

    fx.pipeline.run(&request()).await.unwrap();
    let fetches = fx.source.fetches();
    assert!(fetches > 0);

    let report = fx.pipeline.run(&request()).await.unwrap();
    assert_eq!(fx.source.fetches(), fetches);
    assert_eq!(fx.influence.region_count(), 1);
    assert_eq!(report.removed_artifacts, vec![dir.path().join("rain_forcing.txt")]);
}

#[tokio::test]
async fn varying_run_writes_consistent_cube() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(dir.path(), RainInputType::Varying);

    let report = fx.pipeline.run(&request()).await.unwrap();
    assert_eq!(report.artifact, dir.path().join("rain_forcing.json"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report.artifact).unwrap()).unwrap();
    assert_eq!(json["units"], "mm/hr");
    assert_eq!(json["x"].as_array().unwrap().len(), 20);
    assert_eq!(json["y"].as_array().unwrap().len(), 8);
    assert_eq!(json["time"].as_array().unwrap().len(), 7);

    // West half follows nw (double depth), east half follows ne
    let peak = &json["data"][3][0];
    let west = peak[0].as_f64().unwrap();
    let east = peak[19].as_f64().unwrap();
    assert!((west - 2.0 * east).abs() < 1e-9);
}

#[tokio::test]
async fn outage_of_half_the_catchment_fails() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(dir.path(), RainInputType::Uniform);
    fx.source.take_offline("nw");

    let err = fx.pipeline.run(&request()).await.unwrap_err();
    assert!(matches!(err, RainforceError::InsufficientCoverage { .. }));
    assert!(!dir.path().join("rain_forcing.txt").exists());
}

#[tokio::test]
async fn catchment_outside_region_has_no_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(dir.path(), RainInputType::Uniform);

    let far = ForcingRequest::new(bbox_polygon(10.0, 10.0, 11.0, 11.0), Scenario::default())
        .with_region(bbox_polygon(-2.0, -2.0, 2.0, 2.0));
    let err = fx.pipeline.run(&far).await.unwrap_err();
    assert!(matches!(err, RainforceError::NoCoverage { .. }));
}

#[tokio::test]
async fn default_region_spans_sites_and_catchment() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(dir.path(), RainInputType::Uniform);

    let request = ForcingRequest::new(bbox_polygon(0.2, -0.6, 0.6, 0.6), Scenario::default());
    let report = fx.pipeline.run(&request).await.unwrap();

    let mut ids: Vec<String> = report.sites.iter().map(|s| s.site_id.to_string()).collect();
    ids.sort();
    assert_eq!(ids, vec!["ne", "se"]);
}

#[tokio::test]
async fn catchments_past_the_site_extent_share_a_default_region() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(dir.path(), RainInputType::Uniform);

    for east_edge in [1.3, 1.6, 2.9] {
        let request =
            ForcingRequest::new(bbox_polygon(0.5, 0.2, east_edge, 0.6), Scenario::default());
        let areas = fx.pipeline.influence_areas(&request).await.unwrap();
        assert_eq!(areas.len(), 4);
    }
    assert_eq!(fx.influence.region_count(), 1);

    let inside = ForcingRequest::new(bbox_polygon(-0.5, 0.2, 0.5, 0.6), Scenario::default());
    fx.pipeline.influence_areas(&inside).await.unwrap();
    assert_eq!(fx.influence.region_count(), 2);
}

#[tokio::test]
async fn invalid_storm_fails_before_upstream_traffic() {
    let dir = tempfile::tempdir().unwrap();
    let mut fx = fixture(dir.path(), RainInputType::Uniform);
    let mut settings = fx.pipeline.settings().clone();
    settings.params.time_to_peak_mins = 90;
    fx.pipeline = RainfallPipeline::new(
        fx.registry.clone(),
        fx.influence.clone(),
        Arc::new(MemoryStatisticsStore::new()),
        fx.source.clone(),
        settings,
    );

    let err = fx.pipeline.run(&request()).await.unwrap_err();
    assert!(matches!(err, RainforceError::InvalidParameter { .. }));
    assert_eq!(fx.source.fetches(), 0);
    assert_eq!(fx.registry.site_count().await.unwrap(), 0);
}

#[tokio::test]
async fn single_site_hyetograph() {
    let dir = tempfile::tempdir().unwrap();
    let fx = fixture(dir.path(), RainInputType::Uniform);

    let hyetograph = fx
        .pipeline
        .site_hyetograph(
            &rainforce_core::models::SiteId::new("ne"),
            &Scenario::default(),
            rainforce_core::models::StatisticKind::Depth,
        )
        .await
        .unwrap();
    assert_eq!(hyetograph.len(), 7);
    assert_eq!(hyetograph.peak().unwrap().mins, 30.0);
    assert!((hyetograph.total_depth_mm() - 18.0).abs() < 1e-9);
}
