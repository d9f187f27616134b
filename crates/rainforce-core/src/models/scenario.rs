use crate::error::{RainforceError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Representative Concentration Pathway of a climate projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rcp {
    #[serde(rename = "2.6")]
    Rcp26,
    #[serde(rename = "4.5")]
    Rcp45,
    #[serde(rename = "6.0")]
    Rcp60,
    #[serde(rename = "8.5")]
    Rcp85,
}

impl Rcp {
    /// Radiative forcing in W/m²
    pub fn value(&self) -> f64 {
        match self {
            Rcp::Rcp26 => 2.6,
            Rcp::Rcp45 => 4.5,
            Rcp::Rcp60 => 6.0,
            Rcp::Rcp85 => 8.5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rcp::Rcp26 => "2.6",
            Rcp::Rcp45 => "4.5",
            Rcp::Rcp60 => "6.0",
            Rcp::Rcp85 => "8.5",
        }
    }
}

impl FromStr for Rcp {
    type Err = RainforceError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().to_lowercase();
        let trimmed = trimmed.strip_prefix("rcp").unwrap_or(&trimmed);
        match trimmed {
            "2.6" | "26" => Ok(Rcp::Rcp26),
            "4.5" | "45" => Ok(Rcp::Rcp45),
            "6.0" | "6" | "60" => Ok(Rcp::Rcp60),
            "8.5" | "85" => Ok(Rcp::Rcp85),
            _ => Err(RainforceError::InvalidParameter {
                name: "rcp".to_string(),
                reason: format!("Unknown RCP '{}'. Use 2.6, 4.5, 6.0, or 8.5", s),
            }),
        }
    }
}

/// Composite scenario key: return period, emission scenario and projection epoch
///
/// A scenario without an RCP is the historical (current climate) baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Average recurrence interval in years
    pub return_period: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rcp: Option<Rcp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period: Option<String>,
}

impl Scenario {
    pub fn historical(return_period: f64) -> Self {
        Self { return_period, rcp: None, time_period: None }
    }

    pub fn projected(return_period: f64, rcp: Rcp, time_period: impl Into<String>) -> Self {
        Self { return_period, rcp: Some(rcp), time_period: Some(time_period.into()) }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.return_period.is_finite() || self.return_period <= 0.0 {
            return Err(RainforceError::invalid_parameter(
                "return_period",
                format!("must be a positive number of years, got {}", self.return_period),
            ));
        }
        if self.rcp.is_some() != self.time_period.is_some() {
            return Err(RainforceError::invalid_parameter(
                "scenario",
                "a projected scenario needs both an RCP and a time period",
            ));
        }
        Ok(())
    }

    /// Stable string form used as a storage key and in error context
    pub fn key(&self) -> String {
        match (&self.rcp, &self.time_period) {
            (Some(rcp), Some(period)) => {
                format!("ari={};rcp={};period={}", self.return_period, rcp.label(), period)
            }
            _ => format!("ari={};historical", self.return_period),
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::projected(100.0, Rcp::Rcp26, "2031-2050")
    }
}

impl PartialEq for Scenario {
    fn eq(&self, other: &Self) -> bool {
        self.return_period.to_bits() == other.return_period.to_bits()
            && self.rcp == other.rcp
            && self.time_period == other.time_period
    }
}

impl Eq for Scenario {}

impl Hash for Scenario {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.return_period.to_bits().hash(state);
        self.rcp.hash(state);
        self.time_period.hash(state);
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_scenario() {
        let scenario = Scenario::default();
        assert_eq!(scenario.key(), "ari=100;rcp=2.6;period=2031-2050");
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_scenario_hash_distinguishes_fields() {
        let mut set = HashSet::new();
        set.insert(Scenario::default());
        set.insert(Scenario::default());
        set.insert(Scenario::historical(100.0));
        set.insert(Scenario::projected(100.0, Rcp::Rcp85, "2081-2100"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_invalid_scenarios() {
        assert!(Scenario::historical(0.0).validate().is_err());
        assert!(Scenario::historical(f64::NAN).validate().is_err());

        let half_projected =
            Scenario { return_period: 10.0, rcp: Some(Rcp::Rcp45), time_period: None };
        assert!(half_projected.validate().is_err());
    }

    #[test]
    fn test_parse_rcp() {
        assert_eq!("2.6".parse::<Rcp>().unwrap(), Rcp::Rcp26);
        assert_eq!("RCP8.5".parse::<Rcp>().unwrap(), Rcp::Rcp85);
        assert_eq!("6".parse::<Rcp>().unwrap(), Rcp::Rcp60);
        assert!("3.0".parse::<Rcp>().is_err());
    }
}
