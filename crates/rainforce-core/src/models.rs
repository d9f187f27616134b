pub mod forcing;
pub mod geometry;
pub mod hyetograph;
pub mod influence;
pub mod scenario;
pub mod site;
pub mod statistic;

pub use forcing::{ForcingCube, ForcingField, RainInputType, UniformForcing};
pub use geometry::Crs;
pub use hyetograph::{HyetoMethod, Hyetograph, HyetographParams, HyetographPoint, InterpMethod};
pub use influence::{InfluenceArea, SiteCoverage};
pub use scenario::{Rcp, Scenario};
pub use site::{Site, SiteId};
pub use statistic::{
    DepthTable, RainfallStatistic, RawStatistic, StatisticKey, StatisticKind,
    STANDARD_DURATIONS_MINS,
};
