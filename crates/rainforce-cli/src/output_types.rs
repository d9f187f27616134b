use rainforce_core::config::ConfigSource;
use rainforce_core::models::{Hyetograph, SiteCoverage};
use serde::Serialize;
use tabled::Tabled;

/// One site's share of a catchment
#[derive(Debug, Serialize, Tabled)]
pub struct CoverageRow {
    #[tabled(rename = "Site")]
    pub site_id: String,
    #[tabled(rename = "Weight", display_with = "display_fraction")]
    pub weight: f64,
    #[tabled(rename = "Area (km²)", display_with = "display_km2")]
    pub area_m2: f64,
}

impl From<&SiteCoverage> for CoverageRow {
    fn from(coverage: &SiteCoverage) -> Self {
        Self {
            site_id: coverage.site_id.to_string(),
            weight: coverage.weight,
            area_m2: coverage.area_m2,
        }
    }
}

/// Output for partition command
#[derive(Debug, Serialize)]
pub struct PartitionOutput {
    pub influence_areas: usize,
    pub rebuilt: bool,
    pub coverage: Vec<CoverageRow>,
    pub exported: Option<String>,
}

/// One time step of a hyetograph
#[derive(Debug, Serialize, Tabled)]
pub struct HyetographRow {
    #[tabled(rename = "Minutes")]
    pub mins: f64,
    #[tabled(rename = "Seconds")]
    pub seconds: f64,
    #[tabled(rename = "Intensity (mm/hr)", display_with = "display_intensity")]
    pub intensity_mmhr: f64,
}

/// Output for hyetograph command
#[derive(Debug, Serialize)]
pub struct HyetographOutput {
    pub site_id: String,
    pub scenario: String,
    pub increment_mins: u32,
    pub total_depth_mm: f64,
    pub peak_mins: Option<f64>,
    pub points: Vec<HyetographRow>,
}

impl HyetographOutput {
    pub fn new(hyetograph: &Hyetograph, scenario: String) -> Self {
        Self {
            site_id: hyetograph.site_id.to_string(),
            scenario,
            increment_mins: hyetograph.increment_mins,
            total_depth_mm: hyetograph.total_depth_mm(),
            peak_mins: hyetograph.peak().map(|p| p.mins),
            points: hyetograph
                .points
                .iter()
                .map(|p| HyetographRow { mins: p.mins, seconds: p.seconds, intensity_mmhr: p.intensity_mmhr })
                .collect(),
        }
    }
}

/// One effective configuration value
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

pub fn source_label(source: ConfigSource) -> &'static str {
    match source {
        ConfigSource::Default => "default",
        ConfigSource::File => "file",
        ConfigSource::Environment => "environment",
        ConfigSource::Cli => "cli",
    }
}

fn display_fraction(value: &f64) -> String {
    format!("{:.3}", value)
}

fn display_km2(value: &f64) -> String {
    format!("{:.3}", value / 1.0e6)
}

fn display_intensity(value: &f64) -> String {
    format!("{:.2}", value)
}
