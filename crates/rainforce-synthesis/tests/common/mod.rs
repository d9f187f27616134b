#![allow(dead_code)]

use async_trait::async_trait;
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{RawStatistic, Scenario, Site, SiteId, StatisticKind};
use rainforce_core::ports::RainfallSource;
use rainforce_source::{StatisticRecord, TableRainfallSource};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Table-backed source that counts fetches and can take sites offline
pub struct CountingSource {
    table: TableRainfallSource,
    fetches: AtomicUsize,
    offline: Mutex<HashSet<SiteId>>,
}

impl CountingSource {
    pub fn new(sites: Vec<Site>, records: Vec<StatisticRecord>) -> Self {
        Self {
            table: TableRainfallSource::new(sites, records),
            fetches: AtomicUsize::new(0),
            offline: Mutex::new(HashSet::new()),
        }
    }

    pub fn take_offline(&self, site: &str) {
        self.offline.lock().unwrap().insert(SiteId::new(site));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RainfallSource for CountingSource {
    async fn list_sites(&self) -> Result<Vec<Site>> {
        self.table.list_sites().await
    }

    async fn fetch(
        &self,
        site_id: &SiteId,
        duration_mins: u32,
        scenario: &Scenario,
        kind: StatisticKind,
    ) -> Result<RawStatistic> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.offline.lock().unwrap().contains(site_id) {
            return Err(RainforceError::UpstreamUnavailable {
                site_id: site_id.to_string(),
                scenario: scenario.key(),
                reason: "connection refused".to_string(),
            });
        }
        self.table.fetch(site_id, duration_mins, scenario, kind).await
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Depth records for a site, scaled from a base depth-duration curve
pub fn depth_records(site: &str, scale: f64) -> Vec<StatisticRecord> {
    [(10, 5.0), (20, 8.5), (30, 12.0), (60, 18.0), (120, 24.0)]
        .into_iter()
        .map(|(duration_mins, depth)| StatisticRecord {
            site_id: SiteId::new(site),
            scenario: Scenario::default(),
            kind: StatisticKind::Depth,
            duration_mins,
            value: depth * scale,
            unit: "mm".to_string(),
        })
        .collect()
}
