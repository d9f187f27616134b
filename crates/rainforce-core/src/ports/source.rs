use async_trait::async_trait;

use crate::error::Result;
use crate::models::{RawStatistic, Scenario, Site, SiteId, StatisticKind};

/// Port for the upstream rainfall statistics service
///
/// Implementations return values in whatever unit the upstream reports;
/// normalisation happens in the statistics cache. Transport failures must be
/// reported as `RainforceError::UpstreamUnavailable` so callers can apply the
/// partial-coverage policy.
#[async_trait]
pub trait RainfallSource: Send + Sync {
    /// Every site the upstream service publishes statistics for
    async fn list_sites(&self) -> Result<Vec<Site>>;

    /// Fetch one statistic for a site, duration and scenario
    async fn fetch(
        &self,
        site_id: &SiteId,
        duration_mins: u32,
        scenario: &Scenario,
        kind: StatisticKind,
    ) -> Result<RawStatistic>;

    /// Short label used in logs
    fn name(&self) -> &str;
}
