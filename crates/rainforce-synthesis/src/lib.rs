//! Rainforce Synthesis - From catchment coverage to solver forcing
//!
//! This crate holds the use-case layer of the pipeline: the statistics cache
//! with its partial-failure policy, the cached influence partitioner,
//! hyetograph synthesis, forcing assembly, artifact output and the pipeline
//! orchestrator that chains them.

pub mod artifact;
pub mod forcing;
pub mod hyetograph;
pub mod interpolation;
pub mod partitioner;
pub mod pipeline;
pub mod statistics;

pub use artifact::ArtifactWriter;
pub use forcing::{assemble, build_cube, check_consistency, uniform_forcing, CONSISTENCY_TOLERANCE};
pub use hyetograph::{synthesize, synthesize_all};
pub use interpolation::DepthCurve;
pub use partitioner::InfluencePartitioner;
pub use pipeline::{ForcingReport, ForcingRequest, PipelinePhase, PipelineSettings, RainfallPipeline};
pub use statistics::{CoverageStatistics, StatisticsCache};
