//! File-backed statistics source.
//!
//! Reads a JSON document of sites and tabulated statistics, for offline runs
//! and reproducible test fixtures:
//!
//! ```json
//! {
//!   "sites": [{ "id": "A64971", "location": [174.78, -41.29] }],
//!   "statistics": [
//!     { "site_id": "A64971", "scenario": { "return_period": 100.0 },
//!       "kind": "depth", "duration_mins": 60, "value": 18.0, "unit": "mm" }
//!   ]
//! }
//! ```

use async_trait::async_trait;
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{RawStatistic, Scenario, Site, SiteId, StatisticKey, StatisticKind};
use rainforce_core::ports::RainfallSource;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// One tabulated upstream value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticRecord {
    pub site_id: SiteId,
    pub scenario: Scenario,
    #[serde(default)]
    pub kind: StatisticKind,
    pub duration_mins: u32,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Deserialize)]
struct TableDocument {
    #[serde(default)]
    sites: Vec<Site>,
    #[serde(default)]
    statistics: Vec<StatisticRecord>,
}

/// In-process source over a fixed table of statistics
#[derive(Debug, Clone, Default)]
pub struct TableRainfallSource {
    sites: Vec<Site>,
    values: HashMap<StatisticKey, RawStatistic>,
    published: HashSet<SiteId>,
}

impl TableRainfallSource {
    pub fn new(sites: Vec<Site>, records: Vec<StatisticRecord>) -> Self {
        let mut published: HashSet<SiteId> = sites.iter().map(|s| s.id.clone()).collect();
        let mut values = HashMap::with_capacity(records.len());

        for record in records {
            published.insert(record.site_id.clone());
            values.insert(
                StatisticKey::new(record.site_id, record.scenario, record.duration_mins, record.kind),
                RawStatistic::new(record.value, record.unit),
            );
        }

        Self { sites, values, published }
    }

    /// Load a table from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let document: TableDocument = serde_json::from_str(&text).map_err(|e| {
            RainforceError::Serialization(format!("Invalid statistics table {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            sites = document.sites.len(),
            statistics = document.statistics.len(),
            "Loaded statistics table"
        );
        Ok(Self::new(document.sites, document.statistics))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl RainfallSource for TableRainfallSource {
    async fn list_sites(&self) -> Result<Vec<Site>> {
        Ok(self.sites.clone())
    }

    async fn fetch(
        &self,
        site_id: &SiteId,
        duration_mins: u32,
        scenario: &Scenario,
        kind: StatisticKind,
    ) -> Result<RawStatistic> {
        if !self.published.contains(site_id) {
            return Err(RainforceError::UpstreamUnavailable {
                site_id: site_id.to_string(),
                scenario: scenario.key(),
                reason: "site is not in the statistics table".to_string(),
            });
        }

        let key = StatisticKey::new(site_id.clone(), scenario.clone(), duration_mins, kind);
        self.values.get(&key).cloned().ok_or_else(|| RainforceError::DurationOutOfRange {
            site_id: site_id.to_string(),
            duration_mins: duration_mins as f64,
            reason: format!("no {} tabulated for scenario {}", kind, scenario),
        })
    }

    fn name(&self) -> &str {
        "table"
    }
}
