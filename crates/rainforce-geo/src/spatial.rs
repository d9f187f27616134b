use crate::models::Crs;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::algorithm::intersects::Intersects;
use geo::{Area, Coord, GeodesicArea, MultiPolygon, Point, Rect, Relate};
use rainforce_core::models::Site;

/// Area of a geometry in square metres (or squared CRS units when projected)
///
/// Geographic coordinates are measured on the WGS84 ellipsoid so that degree
/// cells at different latitudes are weighted by their true size.
pub fn area_m2(geometry: &MultiPolygon<f64>, crs: &Crs) -> f64 {
    if crs.is_geographic() {
        geometry.geodesic_area_unsigned()
    } else {
        geometry.unsigned_area()
    }
}

/// Check if a point lies inside or on the boundary of a geometry
pub fn covers_point(geometry: &MultiPolygon<f64>, point: [f64; 2]) -> bool {
    let point = Point::new(point[0], point[1]);
    geometry.contains(&point) || geometry.intersects(&point)
}

/// Sites whose location lies within (or on the boundary of) a region
pub fn sites_within<'a>(sites: &'a [Site], region: &MultiPolygon<f64>) -> Vec<&'a Site> {
    sites.iter().filter(|site| covers_point(region, site.location)).collect()
}

/// Bounding rectangle of a geometry
pub fn envelope(geometry: &MultiPolygon<f64>) -> Option<Rect<f64>> {
    geometry.bounding_rect()
}

/// Bounding rectangle of a geometry together with extra points
pub fn envelope_with_points(geometry: &MultiPolygon<f64>, points: &[[f64; 2]]) -> Option<Rect<f64>> {
    let mut min = Coord { x: f64::INFINITY, y: f64::INFINITY };
    let mut max = Coord { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY };

    let mut extend = |c: Coord<f64>| {
        min.x = min.x.min(c.x);
        min.y = min.y.min(c.y);
        max.x = max.x.max(c.x);
        max.y = max.y.max(c.y);
    };

    if let Some(rect) = geometry.bounding_rect() {
        extend(rect.min());
        extend(rect.max());
    }
    for p in points {
        extend(Coord { x: p[0], y: p[1] });
    }

    if min.x.is_finite() && max.x.is_finite() {
        Some(Rect::new(min, max))
    } else {
        None
    }
}

/// Extent of a set of points, grown in whole tiles of that extent until it
/// also covers a geometry
///
/// While the geometry lies inside the points' extent the result is exactly
/// that extent, so geometries reaching slightly past it share one envelope.
/// A degenerate extent (one point, or collinear points) falls back to tiles
/// of the larger side of the combined envelope.
pub fn tiled_envelope(geometry: &MultiPolygon<f64>, points: &[[f64; 2]]) -> Option<Rect<f64>> {
    let full = envelope_with_points(geometry, points)?;
    let Some(anchor) = envelope_with_points(&MultiPolygon::new(vec![]), points) else {
        return Some(full);
    };

    let fallback = match full.width().max(full.height()) {
        side if side > 0.0 => side,
        _ => 1.0,
    };
    let tile = |side: f64| if side > 0.0 { side } else { fallback };

    let snap = |lo: f64, hi: f64, anchor_lo: f64, anchor_hi: f64, tile: f64| {
        let below = ((anchor_lo - lo) / tile).ceil().max(0.0);
        let above = ((hi - anchor_hi) / tile).ceil().max(0.0);
        (anchor_lo - below * tile, anchor_hi + above * tile)
    };

    let (min_x, max_x) =
        snap(full.min().x, full.max().x, anchor.min().x, anchor.max().x, tile(anchor.width()));
    let (min_y, max_y) =
        snap(full.min().y, full.max().y, anchor.min().y, anchor.max().y, tile(anchor.height()));

    Some(Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y }))
}

/// Check if two geometries describe the same region (topological equality)
///
/// Vertex order, ring start and polygon order do not matter.
pub fn same_region(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    if a.0.is_empty() || b.0.is_empty() {
        return a.0.is_empty() && b.0.is_empty();
    }
    if a == b {
        return true;
    }
    match (envelope(a), envelope(b)) {
        (Some(ra), Some(rb)) if ra == rb => a.relate(b).is_equal_topo(),
        _ => false,
    }
}

/// Check if two bounding boxes intersect
pub fn bounding_boxes_intersect(bbox1: &Rect<f64>, bbox2: &Rect<f64>) -> bool {
    let x_overlap = bbox1.min().x <= bbox2.max().x && bbox1.max().x >= bbox2.min().x;
    let y_overlap = bbox1.min().y <= bbox2.max().y && bbox1.max().y >= bbox2.min().y;

    x_overlap && y_overlap
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use crate::models::bbox_polygon;

    #[test]
    fn test_planar_area_for_projected_crs() {
        let square = bbox_polygon(0.0, 0.0, 100.0, 50.0);
        assert!((area_m2(&square, &Crs::nztm()) - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_geodesic_area_for_geographic_crs() {
        // One degree square at the equator is roughly 12,300 km²
        let square = bbox_polygon(0.0, 0.0, 1.0, 1.0);
        let area = area_m2(&square, &Crs::wgs84());
        assert!(area > 12.2e9 && area < 12.4e9, "area was {}", area);

        // The same degree square near 60°S is about half as large
        let southern = bbox_polygon(0.0, -61.0, 1.0, -60.0);
        let ratio = area_m2(&southern, &Crs::wgs84()) / area;
        assert!(ratio > 0.45 && ratio < 0.55, "ratio was {}", ratio);
    }

    #[test]
    fn test_sites_within_includes_boundary() {
        let region = bbox_polygon(0.0, 0.0, 10.0, 10.0);
        let sites = vec![
            Site::new("inside", 5.0, 5.0),
            Site::new("edge", 10.0, 5.0),
            Site::new("outside", 15.0, 5.0),
        ];
        let within: Vec<&str> = sites_within(&sites, &region).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(within, vec!["inside", "edge"]);
    }

    #[test]
    fn test_envelope_with_points() {
        let region = bbox_polygon(0.0, 0.0, 1.0, 1.0);
        let rect = envelope_with_points(&region, &[[-2.0, 0.5], [0.5, 3.0]]).unwrap();
        assert_eq!(rect.min(), Coord { x: -2.0, y: 0.0 });
        assert_eq!(rect.max(), Coord { x: 1.0, y: 3.0 });

        let empty: MultiPolygon<f64> = MultiPolygon::new(vec![]);
        assert!(envelope_with_points(&empty, &[]).is_none());
    }

    #[test]
    fn test_tiled_envelope_is_site_extent_for_inner_geometry() {
        let points = [[-1.0, -1.0], [1.0, 1.0]];
        let rect = tiled_envelope(&bbox_polygon(-0.5, 0.2, 0.5, 0.6), &points).unwrap();
        assert_eq!(rect.min(), Coord { x: -1.0, y: -1.0 });
        assert_eq!(rect.max(), Coord { x: 1.0, y: 1.0 });
    }

    #[test]
    fn test_tiled_envelope_grows_in_whole_tiles() {
        let points = [[-1.0, -1.0], [1.0, 1.0]];
        let slightly = tiled_envelope(&bbox_polygon(0.5, 0.2, 1.3, 0.6), &points).unwrap();
        let further = tiled_envelope(&bbox_polygon(0.5, 0.2, 2.9, 0.6), &points).unwrap();
        assert_eq!(slightly, further);
        assert_eq!(slightly.max(), Coord { x: 3.0, y: 1.0 });

        let west = tiled_envelope(&bbox_polygon(-3.5, -0.5, 0.0, 0.5), &points).unwrap();
        assert_eq!(west.min(), Coord { x: -5.0, y: -1.0 });
        assert_eq!(west.max(), Coord { x: 1.0, y: 1.0 });
    }

    #[test]
    fn test_tiled_envelope_without_points() {
        let region = bbox_polygon(0.0, 0.0, 2.0, 1.0);
        let rect = tiled_envelope(&region, &[]).unwrap();
        assert_eq!(rect.max(), Coord { x: 2.0, y: 1.0 });

        let single = tiled_envelope(&region, &[[0.5, 0.5]]).unwrap();
        assert!(single.min().x <= 0.0 && single.max().x >= 2.0);
        assert!(single.min().y <= 0.0 && single.max().y >= 1.0);
    }

    #[test]
    fn test_same_region_ignores_vertex_order() {
        let a = bbox_polygon(0.0, 0.0, 2.0, 1.0);
        let b = MultiPolygon::new(vec![polygon![
            (x: 2.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
        ]]);
        let c = bbox_polygon(0.0, 0.0, 2.0, 1.5);

        assert!(same_region(&a, &a.clone()));
        assert!(same_region(&a, &b));
        assert!(!same_region(&a, &c));
    }

    #[test]
    fn test_bounding_boxes_intersect() {
        let a = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        let b = Rect::new(Coord { x: 1.0, y: 1.0 }, Coord { x: 2.0, y: 2.0 });
        let c = Rect::new(Coord { x: 3.0, y: 3.0 }, Coord { x: 4.0, y: 4.0 });
        assert!(bounding_boxes_intersect(&a, &b));
        assert!(!bounding_boxes_intersect(&a, &c));
    }
}
