use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use rainforce_core::config::LayeredConfig;
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::statistic::durations_covering;
use rainforce_core::models::{
    Crs, Hyetograph, HyetographParams, InfluenceArea, RainInputType, Scenario, Site, SiteCoverage,
    SiteId, StatisticKind,
};
use rainforce_core::ports::RainfallSource;
use rainforce_geo::models::bbox_polygon;
use rainforce_geo::spatial::{sites_within, tiled_envelope};
use rainforce_geo::transform::{crs_match, to_working_crs, to_working_crs_point};
use rainforce_geo::validation::ensure_valid;
use rainforce_geo::resolve_coverage;
use rainforce_store::{InfluenceAreaStore, SiteRegistry, StatisticsStore};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::artifact::ArtifactWriter;
use crate::forcing::assemble;
use crate::hyetograph::{synthesize, synthesize_all};
use crate::partitioner::InfluencePartitioner;
use crate::statistics::StatisticsCache;

/// Site locations are registered as longitude/latitude
fn site_crs() -> Crs {
    Crs::wgs84()
}

/// Run-wide settings resolved from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub crs: Crs,
    pub params: HyetographParams,
    pub input_type: RainInputType,
    pub grid_cell_size: f64,
    pub output_dir: PathBuf,
    pub min_coverage_weight: f64,
}

impl PipelineSettings {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            crs: Crs::from_epsg(config.crs.value),
            params: config.hyetograph_params(),
            input_type: config.input_type.value,
            grid_cell_size: config.grid_cell_size.value,
            output_dir: config.output_dir.value.clone(),
            min_coverage_weight: config.min_coverage_weight.value,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&LayeredConfig::with_defaults())
    }
}

/// One forcing request: a catchment and the design scenario
#[derive(Debug, Clone)]
pub struct ForcingRequest {
    pub catchment: MultiPolygon<f64>,
    pub catchment_crs: Crs,
    /// Domain to partition into influence areas; defaults to the extent of
    /// all registered sites and the catchment
    pub region: Option<MultiPolygon<f64>>,
    pub scenario: Scenario,
    pub kind: StatisticKind,
}

impl ForcingRequest {
    pub fn new(catchment: MultiPolygon<f64>, scenario: Scenario) -> Self {
        Self {
            catchment,
            catchment_crs: site_crs(),
            region: None,
            scenario,
            kind: StatisticKind::Depth,
        }
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.catchment_crs = crs;
        self
    }

    pub fn with_region(mut self, region: MultiPolygon<f64>) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_kind(mut self, kind: StatisticKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Stage reached by a running pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Bootstrap,
    Partition,
    Coverage,
    Statistics,
    Synthesis,
    Assembly,
    Write,
}

impl PipelinePhase {
    pub const ALL: [PipelinePhase; 7] = [
        PipelinePhase::Bootstrap,
        PipelinePhase::Partition,
        PipelinePhase::Coverage,
        PipelinePhase::Statistics,
        PipelinePhase::Synthesis,
        PipelinePhase::Assembly,
        PipelinePhase::Write,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PipelinePhase::Bootstrap => "bootstrap",
            PipelinePhase::Partition => "partition",
            PipelinePhase::Coverage => "coverage",
            PipelinePhase::Statistics => "statistics",
            PipelinePhase::Synthesis => "synthesis",
            PipelinePhase::Assembly => "assembly",
            PipelinePhase::Write => "write",
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Contribution of one site to the forcing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteWeight {
    pub site_id: SiteId,
    pub weight: f64,
    pub area_m2: f64,
}

impl From<&SiteCoverage> for SiteWeight {
    fn from(coverage: &SiteCoverage) -> Self {
        Self { site_id: coverage.site_id.clone(), weight: coverage.weight, area_m2: coverage.area_m2 }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct ForcingReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub artifact: PathBuf,
    pub removed_artifacts: Vec<PathBuf>,
    pub input_type: RainInputType,
    pub scenario: String,
    pub sites: Vec<SiteWeight>,
    pub excluded: Vec<SiteId>,
    /// Original weight of the sites used
    pub retained_weight: f64,
    pub time_steps: usize,
    pub peak_intensity_mmhr: f64,
}

/// Rainfall forcing pipeline
///
/// Chains site bootstrap, influence partitioning, coverage resolution, the
/// statistics barrier, hyetograph synthesis, forcing assembly and artifact
/// output for one catchment and scenario per run.
pub struct RainfallPipeline {
    registry: Arc<dyn SiteRegistry>,
    source: Arc<dyn RainfallSource>,
    partitioner: InfluencePartitioner,
    statistics: StatisticsCache,
    settings: PipelineSettings,
}

impl RainfallPipeline {
    pub fn new(
        registry: Arc<dyn SiteRegistry>,
        influence: Arc<dyn InfluenceAreaStore>,
        statistics: Arc<dyn StatisticsStore>,
        source: Arc<dyn RainfallSource>,
        settings: PipelineSettings,
    ) -> Self {
        let statistics = StatisticsCache::new(source.clone(), statistics)
            .with_min_coverage_weight(settings.min_coverage_weight);

        Self {
            registry,
            source,
            partitioner: InfluencePartitioner::new(influence),
            statistics,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn statistics(&self) -> &StatisticsCache {
        &self.statistics
    }

    /// Fill an empty site registry from the upstream source
    ///
    /// Returns the number of sites fetched; 0 when the registry was already populated.
    pub async fn bootstrap_sites(&self) -> Result<usize> {
        if self.registry.site_count().await? > 0 {
            return Ok(0);
        }

        let sites = self.source.list_sites().await?;
        let stored = self.registry.store_sites(&sites).await?;
        tracing::info!(sites = stored, source = self.source.name(), "Bootstrapped site registry");
        Ok(stored)
    }

    /// Catchment in the working CRS, validated
    pub fn working_catchment(&self, request: &ForcingRequest) -> Result<MultiPolygon<f64>> {
        let catchment =
            to_working_crs(request.catchment.clone(), &request.catchment_crs, &self.settings.crs)?;
        ensure_valid(&catchment, "catchment")?;
        Ok(catchment)
    }

    /// Region to partition and the sites partitioning it, in the working CRS
    async fn partition_domain(
        &self,
        request: &ForcingRequest,
        catchment: &MultiPolygon<f64>,
    ) -> Result<(MultiPolygon<f64>, Vec<Site>)> {
        let crs = &self.settings.crs;

        if let Some(region) = &request.region {
            let region = to_working_crs(region.clone(), &request.catchment_crs, crs)?;
            ensure_valid(&region, "region")?;

            let sites = if crs_match(crs, &site_crs()) {
                self.registry.list_sites(&region).await?
            } else {
                let all = self.working_sites(self.registry.all_sites().await?)?;
                sites_within(&all, &region).into_iter().cloned().collect()
            };
            return Ok((region, sites));
        }

        let sites = self.working_sites(self.registry.all_sites().await?)?;
        let locations: Vec<[f64; 2]> = sites.iter().map(|s| s.location).collect();
        // Site extent, grown in whole tiles only when the catchment reaches past it
        let extent = tiled_envelope(catchment, &locations).ok_or_else(|| {
            RainforceError::insufficient_input("partition", "no sites and an empty catchment")
        })?;
        let region = bbox_polygon(extent.min().x, extent.min().y, extent.max().x, extent.max().y);
        Ok((region, sites))
    }

    fn working_sites(&self, sites: Vec<Site>) -> Result<Vec<Site>> {
        sites
            .into_iter()
            .map(|mut site| {
                site.location = to_working_crs_point(site.location, &site_crs(), &self.settings.crs)?;
                Ok(site)
            })
            .collect()
    }

    /// Influence areas for the request's partition domain, from the store when possible
    pub async fn influence_areas(&self, request: &ForcingRequest) -> Result<Vec<InfluenceArea>> {
        self.bootstrap_sites().await?;
        let catchment = self.working_catchment(request)?;
        let (region, sites) = self.partition_domain(request, &catchment).await?;
        self.partitioner.get_or_build(&region, &sites).await
    }

    /// Recompute and store the partition of the request's domain
    pub async fn rebuild_influence_areas(&self, request: &ForcingRequest) -> Result<Vec<InfluenceArea>> {
        self.bootstrap_sites().await?;
        let catchment = self.working_catchment(request)?;
        let (region, sites) = self.partition_domain(request, &catchment).await?;
        self.partitioner.rebuild(&region, &sites).await
    }

    /// Coverage of the request's catchment by site influence areas
    pub async fn coverage(&self, request: &ForcingRequest) -> Result<Vec<SiteCoverage>> {
        let areas = self.influence_areas(request).await?;
        let catchment = self.working_catchment(request)?;
        resolve_coverage(&areas, &catchment, &self.settings.crs)
    }

    /// Hyetograph of a single site under the configured storm
    pub async fn site_hyetograph(
        &self,
        site_id: &SiteId,
        scenario: &Scenario,
        kind: StatisticKind,
    ) -> Result<Hyetograph> {
        let params = &self.settings.params;
        params.validate()?;
        scenario.validate()?;

        let durations = durations_covering(params.storm_length_mins)?;
        let table = self.statistics.site_table(site_id, scenario, &durations, kind).await?;
        synthesize(&table, params)
    }

    pub async fn run(&self, request: &ForcingRequest) -> Result<ForcingReport> {
        self.run_with_progress(request, |_| {}).await
    }

    /// Run the pipeline, reporting each phase as it starts
    pub async fn run_with_progress<F>(&self, request: &ForcingRequest, mut progress: F) -> Result<ForcingReport>
    where
        F: FnMut(PipelinePhase) + Send,
    {
        let run_id = Uuid::new_v4();
        let settings = &self.settings;
        let params = &settings.params;

        tracing::info!(
            run_id = %run_id,
            scenario = %request.scenario,
            input_type = %settings.input_type,
            crs = %settings.crs,
            "Starting forcing run"
        );

        // Malformed requests fail before any upstream traffic
        params.validate()?;
        request.scenario.validate()?;
        let durations = durations_covering(params.storm_length_mins)?;
        let catchment = self.working_catchment(request)?;

        progress(PipelinePhase::Bootstrap);
        self.bootstrap_sites().await?;

        progress(PipelinePhase::Partition);
        let (region, sites) = self.partition_domain(request, &catchment).await?;
        let areas = self.partitioner.get_or_build(&region, &sites).await?;

        progress(PipelinePhase::Coverage);
        let coverages = resolve_coverage(&areas, &catchment, &settings.crs)?;
        tracing::info!(run_id = %run_id, sites = coverages.len(), "Catchment coverage resolved");

        progress(PipelinePhase::Statistics);
        let fetched = self
            .statistics
            .fetch_for_coverage(&coverages, &request.scenario, &durations, request.kind)
            .await?;

        progress(PipelinePhase::Synthesis);
        let hyetographs = synthesize_all(&fetched.tables, params)?;

        progress(PipelinePhase::Assembly);
        let field = assemble(
            settings.input_type,
            &fetched.coverages,
            &hyetographs,
            &catchment,
            &settings.crs,
            settings.grid_cell_size,
        )?;

        progress(PipelinePhase::Write);
        let written = ArtifactWriter::new(&settings.output_dir).write(&field)?;

        let peak_intensity_mmhr = hyetographs
            .iter()
            .flat_map(|h| h.intensities())
            .fold(0.0, f64::max);

        let report = ForcingReport {
            run_id,
            generated_at: Utc::now(),
            artifact: written.path,
            removed_artifacts: written.removed,
            input_type: field.input_type(),
            scenario: request.scenario.key(),
            sites: fetched.coverages.iter().map(SiteWeight::from).collect(),
            excluded: fetched.excluded,
            retained_weight: fetched.retained_weight,
            time_steps: field.time_steps(),
            peak_intensity_mmhr,
        };

        tracing::info!(
            run_id = %run_id,
            artifact = %report.artifact.display(),
            excluded = report.excluded.len(),
            "Forcing run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_follow_config_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.crs, Crs::wgs84());
        assert_eq!(settings.params, HyetographParams::default());
        assert_eq!(settings.input_type, RainInputType::Uniform);
        assert_eq!(settings.min_coverage_weight, 0.8);
    }

    #[test]
    fn test_phase_labels() {
        let labels: Vec<&str> = PipelinePhase::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(
            labels,
            vec!["bootstrap", "partition", "coverage", "statistics", "synthesis", "assembly", "write"]
        );
    }
}
