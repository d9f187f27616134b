use async_trait::async_trait;
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{RawStatistic, Scenario, Site, SiteId, StatisticKind};
use rainforce_core::ports::RainfallSource;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Default timeout for a single upstream request
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for a remote depth-duration-frequency service
///
/// Endpoints, relative to the base URL:
/// * `GET sites` returns `[{"site_id", "name", "lon", "lat"}]`
/// * `GET sites/{id}/{depth|intensity}?duration=&ari=[&rcp=&period=]` returns
///   `{"value", "unit"}`
pub struct HttpRainfallSource {
    base_url: Url,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SiteResponse {
    site_id: String,
    #[serde(default)]
    name: Option<String>,
    lon: f64,
    lat: f64,
}

#[derive(Debug, Deserialize)]
struct StatisticResponse {
    value: f64,
    unit: String,
}

impl HttpRainfallSource {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        // A trailing slash makes relative joins append rather than replace
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| RainforceError::ConfigInvalid {
            key: "source_url".to_string(),
            reason: format!("'{}' is not a valid URL: {}", base_url, e),
        })?;

        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            RainforceError::ConfigInvalid {
                key: "source_url".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            }
        })?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn sites_url(&self) -> Result<Url> {
        self.join("sites")
    }

    fn statistic_url(
        &self,
        site_id: &SiteId,
        duration_mins: u32,
        scenario: &Scenario,
        kind: StatisticKind,
    ) -> Result<Url> {
        let mut url = self.join(&format!("sites/{}/{}", site_id, kind.as_str()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("duration", &duration_mins.to_string());
            query.append_pair("ari", &scenario.return_period.to_string());
            if let (Some(rcp), Some(period)) = (&scenario.rcp, &scenario.time_period) {
                query.append_pair("rcp", rcp.label());
                query.append_pair("period", period);
            }
        }
        Ok(url)
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            RainforceError::invalid_parameter("source path", format!("{}: {}", path, e))
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        unavailable: impl Fn(String) -> RainforceError,
    ) -> Result<T> {
        tracing::debug!(%url, "Requesting upstream");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(format!("request to {} failed: {}", self.base_url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("upstream returned {}: {}", status, body.trim())));
        }

        response.json::<T>().await.map_err(|e| {
            RainforceError::Serialization(format!("Malformed upstream response: {}", e))
        })
    }
}

#[async_trait]
impl RainfallSource for HttpRainfallSource {
    async fn list_sites(&self) -> Result<Vec<Site>> {
        let url = self.sites_url()?;
        let sites: Vec<SiteResponse> = self
            .get_json(url, |reason| RainforceError::UpstreamUnavailable {
                site_id: "*".to_string(),
                scenario: "-".to_string(),
                reason,
            })
            .await?;

        Ok(sites
            .into_iter()
            .map(|s| Site { id: SiteId::new(s.site_id), name: s.name, location: [s.lon, s.lat] })
            .collect())
    }

    async fn fetch(
        &self,
        site_id: &SiteId,
        duration_mins: u32,
        scenario: &Scenario,
        kind: StatisticKind,
    ) -> Result<RawStatistic> {
        let url = self.statistic_url(site_id, duration_mins, scenario, kind)?;
        let statistic: StatisticResponse = self
            .get_json(url, |reason| RainforceError::UpstreamUnavailable {
                site_id: site_id.to_string(),
                scenario: scenario.key(),
                reason,
            })
            .await?;

        Ok(RawStatistic::new(statistic.value, statistic.unit))
    }

    fn name(&self) -> &str {
        "http"
    }
}
