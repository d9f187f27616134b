//! In-memory storage implementations for development and testing.
//!
//! Lock poisoning is reported as a `Storage` error. For persistence across
//! runs, use the PostgreSQL backend.

use async_trait::async_trait;
use geo::MultiPolygon;
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{InfluenceArea, RainfallStatistic, Site, SiteId, StatisticKey};
use rainforce_geo::spatial::{covers_point, same_region};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::ports::{InfluenceAreaStore, SiteRegistry, StatisticsStore};

fn poisoned<T>(_: PoisonError<T>) -> RainforceError {
    RainforceError::Storage("in-memory store lock poisoned".to_string())
}

/// In-memory implementation of SiteRegistry
#[derive(Debug, Clone, Default)]
pub struct MemorySiteRegistry {
    sites: Arc<RwLock<HashMap<SiteId, Site>>>,
}

impl MemorySiteRegistry {
    /// Create a new in-memory site registry
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SiteRegistry for MemorySiteRegistry {
    async fn store_sites(&self, sites: &[Site]) -> Result<usize> {
        let mut store = self.sites.write().map_err(poisoned)?;
        for site in sites {
            store.insert(site.id.clone(), site.clone());
        }
        Ok(sites.len())
    }

    async fn all_sites(&self) -> Result<Vec<Site>> {
        let store = self.sites.read().map_err(poisoned)?;
        let mut sites: Vec<Site> = store.values().cloned().collect();
        sites.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sites)
    }

    async fn list_sites(&self, region: &MultiPolygon<f64>) -> Result<Vec<Site>> {
        let store = self.sites.read().map_err(poisoned)?;
        let mut sites: Vec<Site> =
            store.values().filter(|s| covers_point(region, s.location)).cloned().collect();
        sites.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sites)
    }

    async fn site_count(&self) -> Result<usize> {
        Ok(self.sites.read().map_err(poisoned)?.len())
    }
}

/// In-memory implementation of InfluenceAreaStore
#[derive(Debug, Clone, Default)]
pub struct MemoryInfluenceAreaStore {
    regions: Arc<RwLock<Vec<(MultiPolygon<f64>, Vec<InfluenceArea>)>>>,
}

impl MemoryInfluenceAreaStore {
    /// Create a new in-memory influence area store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached regions
    pub fn region_count(&self) -> usize {
        self.regions.read().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl InfluenceAreaStore for MemoryInfluenceAreaStore {
    async fn find_by_region(&self, region: &MultiPolygon<f64>) -> Result<Option<Vec<InfluenceArea>>> {
        let regions = self.regions.read().map_err(poisoned)?;
        Ok(regions
            .iter()
            .find(|(stored, _)| same_region(stored, region))
            .map(|(_, areas)| areas.clone()))
    }

    async fn put(&self, region: &MultiPolygon<f64>, areas: &[InfluenceArea]) -> Result<()> {
        let mut regions = self.regions.write().map_err(poisoned)?;
        regions.retain(|(stored, _)| !same_region(stored, region));
        regions.push((region.clone(), areas.to_vec()));
        Ok(())
    }

    async fn remove(&self, region: &MultiPolygon<f64>) -> Result<bool> {
        let mut regions = self.regions.write().map_err(poisoned)?;
        let before = regions.len();
        regions.retain(|(stored, _)| !same_region(stored, region));
        Ok(regions.len() != before)
    }
}

/// In-memory implementation of StatisticsStore
#[derive(Debug, Clone, Default)]
pub struct MemoryStatisticsStore {
    statistics: Arc<RwLock<HashMap<StatisticKey, RainfallStatistic>>>,
}

impl MemoryStatisticsStore {
    /// Create a new in-memory statistics store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatisticsStore for MemoryStatisticsStore {
    async fn get(&self, key: &StatisticKey) -> Result<Option<RainfallStatistic>> {
        let statistics = self.statistics.read().map_err(poisoned)?;
        Ok(statistics.get(key).cloned())
    }

    async fn put(&self, statistic: &RainfallStatistic) -> Result<()> {
        let mut statistics = self.statistics.write().map_err(poisoned)?;
        statistics.insert(statistic.key(), statistic.clone());
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.statistics.read().map_err(poisoned)?.len())
    }
}
