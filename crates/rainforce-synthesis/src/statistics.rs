//! Read-through cache of rainfall statistics with the partial-coverage policy.

use futures::future::join_all;
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{
    statistic::validate_duration, DepthTable, RainfallStatistic, Scenario, SiteCoverage, SiteId,
    StatisticKey, StatisticKind,
};
use rainforce_core::ports::RainfallSource;
use rainforce_geo::coverage::{renormalize, retained_weight};
use rainforce_store::StatisticsStore;
use std::sync::Arc;

/// Default share of the catchment that must keep statistics for a run to proceed
pub const DEFAULT_MIN_COVERAGE_WEIGHT: f64 = 0.8;

/// Statistics gathered for every covering site of a catchment
#[derive(Debug, Clone)]
pub struct CoverageStatistics {
    /// Coverages of the sites that returned statistics, re-weighted to sum to 1
    pub coverages: Vec<SiteCoverage>,
    /// Depth tables, in the same order as `coverages`
    pub tables: Vec<DepthTable>,
    /// Sites dropped because the upstream was unavailable
    pub excluded: Vec<SiteId>,
    /// Original weight of the retained sites
    pub retained_weight: f64,
}

/// Fetches each statistic once from the upstream and serves it from the store after
pub struct StatisticsCache {
    source: Arc<dyn RainfallSource>,
    store: Arc<dyn StatisticsStore>,
    min_coverage_weight: f64,
}

impl StatisticsCache {
    pub fn new(source: Arc<dyn RainfallSource>, store: Arc<dyn StatisticsStore>) -> Self {
        Self { source, store, min_coverage_weight: DEFAULT_MIN_COVERAGE_WEIGHT }
    }

    pub fn with_min_coverage_weight(mut self, weight: f64) -> Self {
        self.min_coverage_weight = weight;
        self
    }

    pub fn min_coverage_weight(&self) -> f64 {
        self.min_coverage_weight
    }

    /// Get a normalised statistic, fetching it on first access
    pub async fn get(
        &self,
        site_id: &SiteId,
        scenario: &Scenario,
        duration_mins: u32,
        kind: StatisticKind,
    ) -> Result<RainfallStatistic> {
        let key = StatisticKey::new(site_id.clone(), scenario.clone(), duration_mins, kind);

        if let Some(stored) = self.store.get(&key).await? {
            return Ok(stored);
        }

        validate_duration(site_id, duration_mins)?;

        let raw = self.source.fetch(site_id, duration_mins, scenario, kind).await?;
        let statistic = RainfallStatistic::from_raw(&key, &raw)?;

        // Racing writers store the same value; the last one wins
        self.store.put(&statistic).await?;

        tracing::debug!(
            site_id = %site_id,
            scenario = %scenario,
            duration_mins,
            source = self.source.name(),
            value = statistic.value,
            "Fetched statistic"
        );
        Ok(statistic)
    }

    /// Depth table of one site over the given durations
    pub async fn site_table(
        &self,
        site_id: &SiteId,
        scenario: &Scenario,
        durations: &[u32],
        kind: StatisticKind,
    ) -> Result<DepthTable> {
        let mut statistics = Vec::with_capacity(durations.len());
        for duration in durations {
            statistics.push(self.get(site_id, scenario, *duration, kind).await?);
        }
        DepthTable::from_statistics(site_id.clone(), &statistics)
    }

    /// Fetch tables for all covering sites concurrently, applying the exclusion policy
    ///
    /// Sites whose upstream is unavailable are dropped as long as the remaining
    /// sites still cover at least `min_coverage_weight` of the catchment. Any
    /// other failure aborts the whole request.
    pub async fn fetch_for_coverage(
        &self,
        coverages: &[SiteCoverage],
        scenario: &Scenario,
        durations: &[u32],
        kind: StatisticKind,
    ) -> Result<CoverageStatistics> {
        scenario.validate()?;

        let results = join_all(
            coverages.iter().map(|c| self.site_table(&c.site_id, scenario, durations, kind)),
        )
        .await;

        let mut tables = Vec::with_capacity(coverages.len());
        let mut excluded = Vec::new();
        for (coverage, result) in coverages.iter().zip(results) {
            match result {
                Ok(table) => tables.push(table),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(
                        site_id = %coverage.site_id,
                        weight = coverage.weight,
                        error = %e,
                        "Excluding site without statistics"
                    );
                    excluded.push(coverage.site_id.clone());
                }
                Err(e) => return Err(e),
            }
        }

        if excluded.is_empty() {
            return Ok(CoverageStatistics {
                coverages: coverages.to_vec(),
                tables,
                excluded,
                retained_weight: 1.0,
            });
        }

        let retained = retained_weight(coverages, &excluded);
        if retained < self.min_coverage_weight {
            return Err(RainforceError::InsufficientCoverage {
                scenario: scenario.key(),
                available: retained,
                required: self.min_coverage_weight,
                excluded: excluded.iter().map(|s| s.to_string()).collect(),
            });
        }

        tracing::info!(
            excluded = excluded.len(),
            retained_weight = retained,
            "Renormalising coverage after exclusions"
        );
        Ok(CoverageStatistics {
            coverages: renormalize(coverages, &excluded)?,
            tables,
            excluded,
            retained_weight: retained,
        })
    }
}
