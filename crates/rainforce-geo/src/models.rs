//! Geometry input/output for rainforce-geo.
//!
//! Every polygonal input (region, catchment) is normalised to a single
//! `geo::MultiPolygon<f64>` value type. This module converts GeoJSON and WKT
//! text into that type and back.

use geo::{Geometry as GeoGeometry, MultiPolygon, Polygon, Rect};
use geojson::GeoJson;
use rainforce_core::error::{RainforceError, Result};
use wkt::{ToWkt, TryFromWkt};

pub use rainforce_core::models::{Crs, InfluenceArea, SiteCoverage};

/// Parse a polygonal geometry from either GeoJSON or WKT text
pub fn parse_polygonal(text: &str) -> Result<MultiPolygon<f64>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') {
        parse_geojson(trimmed)
    } else {
        parse_wkt(trimmed)
    }
}

/// Parse a GeoJSON geometry, feature or feature collection into one multipolygon
pub fn parse_geojson(text: &str) -> Result<MultiPolygon<f64>> {
    let geojson: GeoJson = text.parse().map_err(|e| RainforceError::InvalidGeometry {
        location: "GeoJSON".to_string(),
        reason: format!("Failed to parse GeoJSON: {}", e),
    })?;

    let collection = geojson::quick_collection(&geojson).map_err(|e| {
        RainforceError::InvalidGeometry {
            location: "GeoJSON".to_string(),
            reason: format!("Failed to convert GeoJSON geometry: {}", e),
        }
    })?;

    let mut polygons = Vec::new();
    for (i, geometry) in collection.0.into_iter().enumerate() {
        collect_polygons(geometry, &format!("GeoJSON[{}]", i), &mut polygons)?;
    }
    Ok(MultiPolygon::new(polygons))
}

/// Parse a WKT `POLYGON` or `MULTIPOLYGON`
pub fn parse_wkt(text: &str) -> Result<MultiPolygon<f64>> {
    let geometry =
        GeoGeometry::<f64>::try_from_wkt_str(text).map_err(|e| RainforceError::InvalidGeometry {
            location: "WKT".to_string(),
            reason: format!("Failed to parse WKT: {}", e),
        })?;

    let mut polygons = Vec::new();
    collect_polygons(geometry, "WKT", &mut polygons)?;
    Ok(MultiPolygon::new(polygons))
}

fn collect_polygons(
    geometry: GeoGeometry<f64>,
    location: &str,
    polygons: &mut Vec<Polygon<f64>>,
) -> Result<()> {
    match geometry {
        GeoGeometry::Polygon(p) => polygons.push(p),
        GeoGeometry::MultiPolygon(mp) => polygons.extend(mp.0),
        GeoGeometry::Rect(r) => polygons.push(r.to_polygon()),
        GeoGeometry::Triangle(t) => polygons.push(t.to_polygon()),
        GeoGeometry::GeometryCollection(gc) => {
            for (i, member) in gc.0.into_iter().enumerate() {
                collect_polygons(member, &format!("{}[{}]", location, i), polygons)?;
            }
        }
        other => {
            return Err(RainforceError::InvalidGeometry {
                location: location.to_string(),
                reason: format!("expected a polygonal geometry, found {}", geometry_kind(&other)),
            })
        }
    }
    Ok(())
}

fn geometry_kind(geometry: &GeoGeometry<f64>) -> &'static str {
    match geometry {
        GeoGeometry::Point(_) => "Point",
        GeoGeometry::Line(_) => "Line",
        GeoGeometry::LineString(_) => "LineString",
        GeoGeometry::MultiPoint(_) => "MultiPoint",
        GeoGeometry::MultiLineString(_) => "MultiLineString",
        GeoGeometry::Polygon(_) => "Polygon",
        GeoGeometry::MultiPolygon(_) => "MultiPolygon",
        GeoGeometry::GeometryCollection(_) => "GeometryCollection",
        GeoGeometry::Rect(_) => "Rect",
        GeoGeometry::Triangle(_) => "Triangle",
    }
}

/// Serialize a multipolygon as a GeoJSON geometry object
pub fn to_geojson_string(geometry: &MultiPolygon<f64>) -> String {
    let geojson = geojson::Geometry::new(geojson::Value::from(geometry));
    geojson.to_string()
}

/// Stable textual identity of a region, used as a storage key
pub fn region_key(geometry: &MultiPolygon<f64>) -> String {
    geometry.wkt_string()
}

/// Axis-aligned box as a multipolygon
pub fn bbox_polygon(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
    let rect = Rect::new(geo::coord! { x: min_x, y: min_y }, geo::coord! { x: max_x, y: max_y });
    MultiPolygon::new(vec![rect.to_polygon()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn test_parse_wkt_polygon() {
        let mp = parse_polygonal("POLYGON((0 0, 2 0, 2 1, 0 1, 0 0))").unwrap();
        assert_eq!(mp.0.len(), 1);
        assert!((mp.unsigned_area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_geojson_feature_collection() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[2,0],[3,0],[3,1],[2,1],[2,0]]]}}
            ]
        }"#;
        let mp = parse_polygonal(text).unwrap();
        assert_eq!(mp.0.len(), 2);
        assert!((mp.unsigned_area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_polygonal_input_rejected() {
        let err = parse_polygonal("POINT(1 2)").unwrap_err();
        assert!(matches!(err, RainforceError::InvalidGeometry { .. }));
        assert!(parse_polygonal("not a geometry").is_err());
        assert!(parse_geojson("{\"type\": \"Polygon\"").is_err());
    }

    #[test]
    fn test_geojson_output_parses_back() {
        let bbox = bbox_polygon(0.0, 0.0, 1.0, 1.0);
        let text = to_geojson_string(&bbox);
        assert!(text.contains("MultiPolygon"));
        let parsed = parse_geojson(&text).unwrap();
        assert!((parsed.unsigned_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_region_key_is_stable() {
        let a = bbox_polygon(0.0, 0.0, 1.0, 1.0);
        let b = bbox_polygon(0.0, 0.0, 1.0, 1.0);
        assert_eq!(region_key(&a), region_key(&b));
        assert!(region_key(&a).starts_with("MULTIPOLYGON"));
    }
}
