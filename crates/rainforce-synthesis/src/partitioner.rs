use geo::MultiPolygon;
use rainforce_core::error::Result;
use rainforce_core::models::{InfluenceArea, Site};
use rainforce_geo::voronoi::partition;
use rainforce_store::InfluenceAreaStore;
use std::sync::Arc;

/// Influence partitioning backed by the influence-area store
///
/// A region is partitioned once; later requests for an equal region are
/// served from the store. Stored partitions are only replaced through
/// [`InfluencePartitioner::rebuild`].
pub struct InfluencePartitioner {
    store: Arc<dyn InfluenceAreaStore>,
}

impl InfluencePartitioner {
    pub fn new(store: Arc<dyn InfluenceAreaStore>) -> Self {
        Self { store }
    }

    /// Stored areas for the region, computing and storing them on a miss
    pub async fn get_or_build(
        &self,
        region: &MultiPolygon<f64>,
        sites: &[Site],
    ) -> Result<Vec<InfluenceArea>> {
        if let Some(areas) = self.store.find_by_region(region).await? {
            tracing::debug!(areas = areas.len(), "Influence areas served from store");
            return Ok(areas);
        }
        self.rebuild(region, sites).await
    }

    /// Recompute the partition of a region and replace any stored entry
    pub async fn rebuild(
        &self,
        region: &MultiPolygon<f64>,
        sites: &[Site],
    ) -> Result<Vec<InfluenceArea>> {
        let areas = partition(sites, region)?;
        self.store.put(region, &areas).await?;

        tracing::info!(sites = sites.len(), areas = areas.len(), "Partitioned region into influence areas");
        Ok(areas)
    }
}
