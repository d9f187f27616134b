use async_trait::async_trait;
use geo::MultiPolygon;
use rainforce_core::error::Result;
use rainforce_core::models::{InfluenceArea, RainfallStatistic, Site, StatisticKey};

/// Port for the registry of rainfall sites
#[async_trait]
pub trait SiteRegistry: Send + Sync {
    /// Insert or replace sites by id, returning how many were written
    async fn store_sites(&self, sites: &[Site]) -> Result<usize>;

    /// Every registered site
    async fn all_sites(&self) -> Result<Vec<Site>>;

    /// Sites located within (or on the boundary of) a region
    async fn list_sites(&self, region: &MultiPolygon<f64>) -> Result<Vec<Site>>;

    /// Number of registered sites
    async fn site_count(&self) -> Result<usize>;
}

/// Port for cached influence areas, keyed by region geometry
///
/// Regions are matched by topological equality, not by textual identity.
#[async_trait]
pub trait InfluenceAreaStore: Send + Sync {
    /// Influence areas previously stored for an equal region
    async fn find_by_region(&self, region: &MultiPolygon<f64>) -> Result<Option<Vec<InfluenceArea>>>;

    /// Store the areas of a region, replacing any entry for an equal region
    async fn put(&self, region: &MultiPolygon<f64>, areas: &[InfluenceArea]) -> Result<()>;

    /// Drop the entry for a region; returns whether one existed
    async fn remove(&self, region: &MultiPolygon<f64>) -> Result<bool>;
}

/// Port for normalised rainfall statistics
#[async_trait]
pub trait StatisticsStore: Send + Sync {
    /// Get a stored statistic
    async fn get(&self, key: &StatisticKey) -> Result<Option<RainfallStatistic>>;

    /// Store a statistic; a later write for the same key replaces the earlier one
    async fn put(&self, statistic: &RainfallStatistic) -> Result<()>;

    /// Number of stored statistics
    async fn count(&self) -> Result<usize>;
}
