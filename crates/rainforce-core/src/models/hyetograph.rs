use crate::error::{RainforceError, Result};
use crate::models::site::SiteId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interpolation of the depth-duration curve between tabulated durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterpMethod {
    Linear,
    /// Monotone (shape-preserving) piecewise cubic
    #[default]
    Cubic,
}

impl FromStr for InterpMethod {
    type Err = RainforceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(InterpMethod::Linear),
            "cubic" | "pchip" | "monotone_cubic" => Ok(InterpMethod::Cubic),
            _ => Err(RainforceError::UnsupportedMethod {
                kind: "interpolation".to_string(),
                name: s.to_string(),
                expected: "linear, cubic".to_string(),
            }),
        }
    }
}

impl fmt::Display for InterpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpMethod::Linear => f.write_str("linear"),
            InterpMethod::Cubic => f.write_str("cubic"),
        }
    }
}

/// Temporal distribution of the design depth over the storm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HyetoMethod {
    #[default]
    AltBlock,
    Chicago,
}

impl FromStr for HyetoMethod {
    type Err = RainforceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "alt_block" | "alternating_block" => Ok(HyetoMethod::AltBlock),
            "chicago" => Ok(HyetoMethod::Chicago),
            _ => Err(RainforceError::UnsupportedMethod {
                kind: "hyetograph".to_string(),
                name: s.to_string(),
                expected: "alt_block, chicago".to_string(),
            }),
        }
    }
}

impl fmt::Display for HyetoMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HyetoMethod::AltBlock => f.write_str("alt_block"),
            HyetoMethod::Chicago => f.write_str("chicago"),
        }
    }
}

/// Design storm parameters shared by every site of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyetographParams {
    pub storm_length_mins: u32,
    pub time_to_peak_mins: u32,
    pub increment_mins: u32,
    pub interp: InterpMethod,
    pub method: HyetoMethod,
}

impl Default for HyetographParams {
    fn default() -> Self {
        Self {
            storm_length_mins: 2880,
            time_to_peak_mins: 1440,
            increment_mins: 10,
            interp: InterpMethod::Cubic,
            method: HyetoMethod::AltBlock,
        }
    }
}

impl HyetographParams {
    pub fn validate(&self) -> Result<()> {
        if self.increment_mins == 0 {
            return Err(RainforceError::invalid_parameter("increment", "must be positive"));
        }
        if self.storm_length_mins == 0 {
            return Err(RainforceError::invalid_parameter("storm_length", "must be positive"));
        }
        if self.storm_length_mins % self.increment_mins != 0 {
            return Err(RainforceError::invalid_parameter(
                "storm_length",
                format!(
                    "{} min is not a multiple of the {} min increment",
                    self.storm_length_mins, self.increment_mins
                ),
            ));
        }
        if self.time_to_peak_mins > self.storm_length_mins {
            return Err(RainforceError::invalid_parameter(
                "time_to_peak",
                format!(
                    "{} min lies outside [0, {}]",
                    self.time_to_peak_mins, self.storm_length_mins
                ),
            ));
        }
        if self.time_to_peak_mins % self.increment_mins != 0 {
            return Err(RainforceError::invalid_parameter(
                "time_to_peak",
                format!(
                    "{} min does not fall on a {} min increment",
                    self.time_to_peak_mins, self.increment_mins
                ),
            ));
        }
        Ok(())
    }

    /// Number of points in a synthesized series
    pub fn point_count(&self) -> usize {
        (self.storm_length_mins / self.increment_mins) as usize + 1
    }
}

/// One step of a hyetograph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyetographPoint {
    pub mins: f64,
    pub seconds: f64,
    pub intensity_mmhr: f64,
}

/// Rainfall intensity series of one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyetograph {
    pub site_id: SiteId,
    pub increment_mins: u32,
    pub points: Vec<HyetographPoint>,
}

impl Hyetograph {
    pub fn intensities(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.intensity_mmhr)
    }

    /// Depth in mm represented by the series
    pub fn total_depth_mm(&self) -> f64 {
        let hours = self.increment_mins as f64 / 60.0;
        self.intensities().map(|i| i * hours).sum()
    }

    /// Point with the highest intensity (first one on ties)
    pub fn peak(&self) -> Option<&HyetographPoint> {
        self.points.iter().fold(None, |best: Option<&HyetographPoint>, p| match best {
            Some(b) if b.intensity_mmhr >= p.intensity_mmhr => Some(b),
            _ => Some(p),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
