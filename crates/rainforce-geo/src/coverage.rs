//! Coverage resolution: which sites cover a catchment, and by how much.

use crate::models::Crs;
use crate::spatial::{area_m2, bounding_boxes_intersect, envelope};
use geo::{BooleanOps, MultiPolygon};
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{InfluenceArea, SiteCoverage, SiteId};

/// Intersect influence areas with a catchment and weight each site by area
///
/// Weights sum to 1. Areas that do not touch the catchment are dropped.
pub fn resolve_coverage(
    areas: &[InfluenceArea],
    catchment: &MultiPolygon<f64>,
    crs: &Crs,
) -> Result<Vec<SiteCoverage>> {
    let catchment_bbox = envelope(catchment).ok_or_else(|| {
        RainforceError::insufficient_input("coverage", "catchment polygon is empty")
    })?;

    let mut coverages = Vec::new();
    for area in areas {
        let overlaps = envelope(&area.geometry)
            .map(|bbox| bounding_boxes_intersect(&bbox, &catchment_bbox))
            .unwrap_or(false);
        if !overlaps {
            continue;
        }

        let clipped = area.geometry.intersection(catchment);
        let clipped_area = area_m2(&clipped, crs);
        if clipped.0.is_empty() || clipped_area <= 0.0 {
            continue;
        }

        coverages.push(SiteCoverage {
            site_id: area.site_id.clone(),
            site_location: area.site_location,
            geometry: clipped,
            area_m2: clipped_area,
            weight: 0.0,
        });
    }

    let total: f64 = coverages.iter().map(|c| c.area_m2).sum();
    if coverages.is_empty() || total <= 0.0 {
        return Err(RainforceError::NoCoverage { catchment: describe_extent(catchment) });
    }

    for coverage in &mut coverages {
        coverage.weight = coverage.area_m2 / total;
    }

    tracing::debug!(
        sites = coverages.len(),
        catchment_area_m2 = total,
        "Resolved catchment coverage"
    );
    Ok(coverages)
}

/// Total weight of the coverages not listed in `excluded`
pub fn retained_weight(coverages: &[SiteCoverage], excluded: &[SiteId]) -> f64 {
    coverages.iter().filter(|c| !excluded.contains(&c.site_id)).map(|c| c.weight).sum()
}

/// Drop excluded sites and rescale the remaining weights to sum to 1
pub fn renormalize(coverages: &[SiteCoverage], excluded: &[SiteId]) -> Result<Vec<SiteCoverage>> {
    let mut kept: Vec<SiteCoverage> =
        coverages.iter().filter(|c| !excluded.contains(&c.site_id)).cloned().collect();

    let total: f64 = kept.iter().map(|c| c.area_m2).sum();
    if kept.is_empty() || total <= 0.0 {
        return Err(RainforceError::NoCoverage {
            catchment: format!("all {} covering sites excluded", coverages.len()),
        });
    }

    for coverage in &mut kept {
        coverage.weight = coverage.area_m2 / total;
    }
    Ok(kept)
}

fn describe_extent(geometry: &MultiPolygon<f64>) -> String {
    match envelope(geometry) {
        Some(bbox) => format!(
            "[{:.6}, {:.6}, {:.6}, {:.6}]",
            bbox.min().x,
            bbox.min().y,
            bbox.max().x,
            bbox.max().y
        ),
        None => "<empty>".to_string(),
    }
}
