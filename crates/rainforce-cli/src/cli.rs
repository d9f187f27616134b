use clap::{Args, Parser, Subcommand};
use rainforce_core::models::StatisticKind;
use std::path::PathBuf;

/// Rainforce - design-storm rainfall forcing for flood models
#[derive(Parser, Debug)]
#[command(name = "rainforce")]
#[command(about = "Design-storm rainfall forcing for flood models", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Storage backend to use (memory or postgres)
    #[arg(long, global = true, default_value = "memory")]
    pub storage: StorageBackend,

    /// Configuration file (defaults to ./rainforce.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StorageBackend {
    /// In-memory storage (default, nothing persists between runs)
    Memory,
    /// PostgreSQL persistent storage (DATABASE_URL)
    Postgres,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize the rainfall forcing of a catchment and write the artifact
    Run(RunArgs),

    /// Show how site influence areas cover a catchment
    Partition(PartitionArgs),

    /// Synthesize the design-storm hyetograph of a single site
    Hyetograph(HyetographArgs),

    /// Show the effective configuration and where each value comes from
    Config(ConfigArgs),
}

/// Statistic requested from the upstream service
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum KindArg {
    #[default]
    Depth,
    Intensity,
}

impl From<KindArg> for StatisticKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Depth => StatisticKind::Depth,
            KindArg::Intensity => StatisticKind::Intensity,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScenarioArgs {
    /// Average recurrence interval in years
    #[arg(long, default_value = "100")]
    pub ari: f64,

    /// Emission scenario (2.6, 4.5, 6.0 or 8.5)
    #[arg(long, conflicts_with = "historical")]
    pub rcp: Option<String>,

    /// Projection epoch, e.g. 2031-2050
    #[arg(long, conflicts_with = "historical")]
    pub period: Option<String>,

    /// Use the current-climate baseline instead of a projection
    #[arg(long)]
    pub historical: bool,

    /// Statistic to request from the upstream service
    #[arg(long, value_enum, default_value = "depth")]
    pub kind: KindArg,
}

impl Default for ScenarioArgs {
    fn default() -> Self {
        Self { ari: 100.0, rcp: None, period: None, historical: false, kind: KindArg::Depth }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct StormArgs {
    /// Storm length in minutes
    #[arg(long, value_name = "MINS")]
    pub storm_length: Option<u32>,

    /// Time to peak in minutes
    #[arg(long, value_name = "MINS")]
    pub time_to_peak: Option<u32>,

    /// Time step of the series in minutes
    #[arg(long, value_name = "MINS")]
    pub increment: Option<u32>,

    /// Depth-duration interpolation (linear or cubic)
    #[arg(long, value_name = "METHOD")]
    pub interp: Option<String>,

    /// Temporal distribution (alt_block or chicago)
    #[arg(long, value_name = "METHOD")]
    pub method: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Read statistics from a local JSON table instead of the upstream service
    #[arg(long, value_name = "PATH", conflicts_with = "source_url")]
    pub source_file: Option<PathBuf>,

    /// Base URL of the upstream statistics service
    #[arg(long, value_name = "URL")]
    pub source_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Catchment geometry file (GeoJSON or WKT)
    pub catchment: PathBuf,

    /// EPSG code of the catchment and region geometries (defaults to the working CRS)
    #[arg(long, value_name = "EPSG")]
    pub catchment_crs: Option<u32>,

    /// Region to partition into influence areas (GeoJSON or WKT)
    #[arg(long, value_name = "PATH")]
    pub region: Option<PathBuf>,

    /// Working CRS (EPSG code)
    #[arg(long, value_name = "EPSG")]
    pub crs: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    #[command(flatten)]
    pub scenario: ScenarioArgs,

    #[command(flatten)]
    pub storm: StormArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Forcing representation (uniform or varying)
    #[arg(long, value_name = "TYPE")]
    pub input_type: Option<String>,

    /// Grid spacing of a varying field, in working-CRS units
    #[arg(long, value_name = "SIZE")]
    pub cell_size: Option<f64>,

    /// Directory the forcing artifact is written to
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Minimum share of the catchment that must keep statistics
    #[arg(long, value_name = "WEIGHT")]
    pub min_coverage_weight: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct PartitionArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Recompute the influence areas even when cached
    #[arg(long)]
    pub rebuild: bool,

    /// Write the clipped coverage polygons as a GeoJSON FeatureCollection
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct HyetographArgs {
    /// Site identifier
    pub site: String,

    #[command(flatten)]
    pub scenario: ScenarioArgs,

    #[command(flatten)]
    pub storm: StormArgs,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub storm: StormArgs,

    /// Working CRS (EPSG code)
    #[arg(long, value_name = "EPSG")]
    pub crs: Option<u32>,
}
