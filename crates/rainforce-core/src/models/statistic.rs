//! Rainfall depth/intensity statistics and their canonical units.

use crate::error::{RainforceError, Result};
use crate::models::scenario::Scenario;
use crate::models::site::SiteId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard durations (minutes) tabulated by the upstream statistics service
pub const STANDARD_DURATIONS_MINS: [u32; 12] =
    [10, 20, 30, 60, 120, 360, 720, 1440, 2880, 4320, 5760, 7200];

/// Whether a statistic is a total depth or a mean intensity over its duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    /// Total rainfall depth in mm
    #[default]
    Depth,
    /// Mean rainfall intensity in mm/hr
    Intensity,
}

impl StatisticKind {
    pub fn canonical_unit(&self) -> &'static str {
        match self {
            StatisticKind::Depth => "mm",
            StatisticKind::Intensity => "mm/hr",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticKind::Depth => "depth",
            StatisticKind::Intensity => "intensity",
        }
    }

    /// Multiplier from a unit label to this kind's canonical unit
    fn conversion_factor(&self, unit: &str) -> Option<f64> {
        let unit = unit.trim().to_lowercase().replace(' ', "");
        match self {
            StatisticKind::Depth => match unit.as_str() {
                "mm" | "millimetre" | "millimetres" | "millimeter" | "millimeters" => Some(1.0),
                "cm" => Some(10.0),
                "m" => Some(1000.0),
                "in" | "inch" | "inches" => Some(25.4),
                _ => None,
            },
            StatisticKind::Intensity => match unit.as_str() {
                "mm/hr" | "mm/h" | "mmhr" | "mmh-1" | "mm/hour" => Some(1.0),
                "mm/min" => Some(60.0),
                "cm/hr" | "cm/h" => Some(10.0),
                "in/hr" | "in/h" => Some(25.4),
                _ => None,
            },
        }
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unnormalised value as returned by the upstream source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStatistic {
    pub value: f64,
    pub unit: String,
}

impl RawStatistic {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self { value, unit: unit.into() }
    }
}

/// Cache key of a statistic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatisticKey {
    pub site_id: SiteId,
    pub scenario: Scenario,
    pub duration_mins: u32,
    pub kind: StatisticKind,
}

impl StatisticKey {
    pub fn new(
        site_id: SiteId,
        scenario: Scenario,
        duration_mins: u32,
        kind: StatisticKind,
    ) -> Self {
        Self { site_id, scenario, duration_mins, kind }
    }
}

impl fmt::Display for StatisticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}min/{}",
            self.site_id, self.scenario, self.duration_mins, self.kind
        )
    }
}

/// A normalised statistic: value in mm (depth) or mm/hr (intensity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallStatistic {
    pub site_id: SiteId,
    pub scenario: Scenario,
    pub duration_mins: u32,
    pub kind: StatisticKind,
    pub value: f64,
}

impl RainfallStatistic {
    /// Normalise an upstream payload into canonical units for `key`
    pub fn from_raw(key: &StatisticKey, raw: &RawStatistic) -> Result<Self> {
        let factor = key.kind.conversion_factor(&raw.unit).ok_or_else(|| {
            RainforceError::UnitConversion {
                site_id: key.site_id.to_string(),
                unit: raw.unit.clone(),
                expected: key.kind.canonical_unit().to_string(),
            }
        })?;

        if !raw.value.is_finite() || raw.value < 0.0 {
            return Err(RainforceError::InvalidParameter {
                name: format!("statistic {}", key),
                reason: format!("upstream value {} is not a non-negative number", raw.value),
            });
        }

        validate_duration(&key.site_id, key.duration_mins)?;

        Ok(Self {
            site_id: key.site_id.clone(),
            scenario: key.scenario.clone(),
            duration_mins: key.duration_mins,
            kind: key.kind,
            value: raw.value * factor,
        })
    }

    pub fn key(&self) -> StatisticKey {
        StatisticKey::new(self.site_id.clone(), self.scenario.clone(), self.duration_mins, self.kind)
    }

    /// Total depth in mm over the statistic's duration
    pub fn depth_mm(&self) -> f64 {
        match self.kind {
            StatisticKind::Depth => self.value,
            StatisticKind::Intensity => self.value * self.duration_mins as f64 / 60.0,
        }
    }
}

/// Reject durations that are not one of the standard buckets
pub fn validate_duration(site_id: &SiteId, duration_mins: u32) -> Result<()> {
    if STANDARD_DURATIONS_MINS.contains(&duration_mins) {
        Ok(())
    } else {
        Err(RainforceError::DurationOutOfRange {
            site_id: site_id.to_string(),
            duration_mins: duration_mins as f64,
            reason: format!("not a standard duration bucket {:?}", STANDARD_DURATIONS_MINS),
        })
    }
}

/// Standard durations needed to cover a storm of `storm_length_mins`
///
/// Returns every bucket up to and including the first one that reaches the
/// storm length, or an error if the storm is longer than the longest bucket.
pub fn durations_covering(storm_length_mins: u32) -> Result<Vec<u32>> {
    let mut durations = Vec::new();
    for duration in STANDARD_DURATIONS_MINS {
        durations.push(duration);
        if duration >= storm_length_mins {
            return Ok(durations);
        }
    }
    Err(RainforceError::DurationOutOfRange {
        site_id: "*".to_string(),
        duration_mins: storm_length_mins as f64,
        reason: format!(
            "storm length exceeds the longest tabulated duration ({} min)",
            STANDARD_DURATIONS_MINS[STANDARD_DURATIONS_MINS.len() - 1]
        ),
    })
}

/// Depth-duration table of one site, sorted by duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthTable {
    pub site_id: SiteId,
    /// (duration in minutes, depth in mm)
    pub entries: Vec<(u32, f64)>,
}

impl DepthTable {
    pub fn new(site_id: SiteId, mut entries: Vec<(u32, f64)>) -> Result<Self> {
        entries.sort_by_key(|(duration, _)| *duration);
        entries.dedup_by_key(|(duration, _)| *duration);

        if entries.is_empty() {
            return Err(RainforceError::insufficient_input(
                "depth table",
                format!("site {} has no tabulated durations", site_id),
            ));
        }

        if entries.iter().any(|(duration, depth)| *duration == 0 || !depth.is_finite() || *depth < 0.0)
        {
            return Err(RainforceError::InvalidParameter {
                name: format!("depth table of site {}", site_id),
                reason: "durations must be positive and depths non-negative".to_string(),
            });
        }

        if entries.windows(2).any(|pair| pair[1].1 < pair[0].1) {
            return Err(RainforceError::InvalidParameter {
                name: format!("depth table of site {}", site_id),
                reason: "depth must not decrease with duration".to_string(),
            });
        }

        Ok(Self { site_id, entries })
    }

    /// Build a table from normalised statistics of one site
    pub fn from_statistics(site_id: SiteId, statistics: &[RainfallStatistic]) -> Result<Self> {
        let entries = statistics
            .iter()
            .filter(|s| s.site_id == site_id)
            .map(|s| (s.duration_mins, s.depth_mm()))
            .collect();
        Self::new(site_id, entries)
    }

    pub fn max_duration(&self) -> u32 {
        self.entries.last().map(|(duration, _)| *duration).unwrap_or(0)
    }
}
