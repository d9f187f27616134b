use crate::models::site::SiteId;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Area of nearest-site influence (Voronoi cell clipped to the region)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceArea {
    pub site_id: SiteId,
    /// Site location (longitude, latitude or projected x, y)
    pub site_location: [f64; 2],
    pub geometry: MultiPolygon<f64>,
}

/// Influence area of one site clipped to a catchment, with its area weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteCoverage {
    pub site_id: SiteId,
    pub site_location: [f64; 2],
    pub geometry: MultiPolygon<f64>,
    /// Area of the clipped geometry in square metres
    pub area_m2: f64,
    /// Share of the catchment covered by this site, in [0, 1]
    pub weight: f64,
}
