//! Influence partitioning: nearest-site (Voronoi) tessellation of a region.
//!
//! Each site's cell starts as a box enclosing the region and every site, and is
//! cut by the perpendicular bisector of each neighbour in order of increasing
//! distance. Once a neighbour is farther than twice the current cell radius its
//! bisector cannot reach the cell, so the scan stops. The finished convex cell
//! is then intersected with the region.

use crate::index::SiteIndex;
use crate::spatial::envelope_with_points;
use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{InfluenceArea, Site};
use std::collections::HashMap;

/// Partition `region` into the influence areas of `sites`
///
/// Sites sharing a location collapse onto the first of them. Sites whose cell
/// does not reach the region produce no area.
pub fn partition(sites: &[Site], region: &MultiPolygon<f64>) -> Result<Vec<InfluenceArea>> {
    if region.0.is_empty() || region.unsigned_area() <= 0.0 {
        return Err(RainforceError::insufficient_input("partition", "region polygon is empty"));
    }
    if sites.is_empty() {
        return Err(RainforceError::insufficient_input("partition", "no sites to partition by"));
    }

    let distinct = dedupe_coincident(sites);
    let points: Vec<[f64; 2]> = distinct.iter().map(|s| s.location).collect();

    if distinct.len() < 3 {
        tracing::warn!(
            sites = distinct.len(),
            "Fewer than 3 distinct sites; influence areas degenerate to strips"
        );
    } else if all_collinear(&points) {
        tracing::warn!(sites = distinct.len(), "All sites are collinear; influence areas are strips");
    }

    let bounds = envelope_with_points(region, &points).ok_or_else(|| {
        RainforceError::insufficient_input("partition", "region has no finite extent")
    })?;
    let pad = bounds.width().max(bounds.height()).max(1.0);
    let frame = [
        Coord { x: bounds.min().x - pad, y: bounds.min().y - pad },
        Coord { x: bounds.max().x + pad, y: bounds.min().y - pad },
        Coord { x: bounds.max().x + pad, y: bounds.max().y + pad },
        Coord { x: bounds.min().x - pad, y: bounds.max().y + pad },
    ];

    let index = SiteIndex::from_points(&points);
    let mut areas = Vec::with_capacity(distinct.len());

    for (i, site) in distinct.iter().enumerate() {
        let cell = nearest_site_cell(i, &points, &index, &frame);
        if cell.len() < 3 {
            continue;
        }

        let polygon = Polygon::new(LineString::from(cell), vec![]);
        let clipped = polygon.intersection(region);
        if clipped.0.is_empty() || clipped.unsigned_area() <= 0.0 {
            tracing::debug!(site_id = %site.id, "Site cell does not reach the region");
            continue;
        }

        areas.push(InfluenceArea {
            site_id: site.id.clone(),
            site_location: site.location,
            geometry: clipped,
        });
    }

    tracing::info!(sites = distinct.len(), areas = areas.len(), "Partitioned region");
    Ok(areas)
}

/// Keep the first site at every location, warning about the rest
fn dedupe_coincident(sites: &[Site]) -> Vec<&Site> {
    let mut seen: HashMap<(u64, u64), &Site> = HashMap::new();
    let mut distinct = Vec::with_capacity(sites.len());

    for site in sites {
        // +0.0 normalises negative zero
        let key = ((site.location[0] + 0.0).to_bits(), (site.location[1] + 0.0).to_bits());
        match seen.get(&key) {
            Some(kept) => tracing::warn!(
                site_id = %site.id,
                kept = %kept.id,
                "Coincident site collapsed into an existing site"
            ),
            None => {
                seen.insert(key, site);
                distinct.push(site);
            }
        }
    }

    distinct
}

fn all_collinear(points: &[[f64; 2]]) -> bool {
    let Some(origin) = points.first() else {
        return true;
    };
    let Some(other) = points.iter().find(|p| *p != origin) else {
        return true;
    };

    let dx = other[0] - origin[0];
    let dy = other[1] - origin[1];
    let scale = dx * dx + dy * dy;

    points.iter().all(|p| {
        let cross = dx * (p[1] - origin[1]) - dy * (p[0] - origin[0]);
        cross.abs() <= 1e-12 * scale.max(f64::MIN_POSITIVE)
    })
}

/// Convex cell of site `i`, as an open ring
fn nearest_site_cell(
    i: usize,
    points: &[[f64; 2]],
    index: &SiteIndex,
    frame: &[Coord<f64>; 4],
) -> Vec<Coord<f64>> {
    let site = points[i];
    let mut cell: Vec<Coord<f64>> = frame.to_vec();

    for (j, distance) in index.by_distance(site) {
        if j == i {
            continue;
        }
        if distance > 2.0 * cell_radius(site, &cell) {
            break;
        }
        cell = clip_to_bisector(&cell, site, points[j]);
        if cell.len() < 3 {
            break;
        }
    }

    cell
}

fn cell_radius(site: [f64; 2], cell: &[Coord<f64>]) -> f64 {
    cell.iter()
        .map(|c| ((c.x - site[0]).powi(2) + (c.y - site[1]).powi(2)).sqrt())
        .fold(0.0, f64::max)
}

/// Keep the part of `cell` closer to `site` than to `other`
fn clip_to_bisector(cell: &[Coord<f64>], site: [f64; 2], other: [f64; 2]) -> Vec<Coord<f64>> {
    let normal = Coord { x: other[0] - site[0], y: other[1] - site[1] };
    let mid = Coord { x: (site[0] + other[0]) / 2.0, y: (site[1] + other[1]) / 2.0 };
    let side = |c: &Coord<f64>| (c.x - mid.x) * normal.x + (c.y - mid.y) * normal.y;

    let n = cell.len();
    let mut out = Vec::with_capacity(n + 1);
    for k in 0..n {
        let a = cell[k];
        let b = cell[(k + 1) % n];
        let fa = side(&a);
        let fb = side(&b);

        if fa <= 0.0 {
            out.push(a);
        }
        if (fa < 0.0 && fb > 0.0) || (fa > 0.0 && fb < 0.0) {
            let t = fa / (fa - fb);
            out.push(Coord { x: a.x + t * (b.x - a.x), y: a.y + t * (b.y - a.y) });
        }
    }
    out
}
