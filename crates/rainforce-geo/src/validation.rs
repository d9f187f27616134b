use geo::{Area, MultiPolygon, Polygon};
use rainforce_core::error::{RainforceError, Result};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }
}

fn validate_polygon(polygon: &Polygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    let exterior = polygon.exterior();
    if exterior.0.len() < 4 {
        result.add_error(
            "exterior".to_string(),
            format!("Polygon exterior must have at least 4 points, found {}", exterior.0.len()),
        );
    }

    for (i, coord) in exterior.0.iter().enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result.add_error(format!("exterior[{}]", i), "Coordinates must be finite".to_string());
        }
    }

    for (i, interior) in polygon.interiors().iter().enumerate() {
        if interior.0.len() < 4 {
            result.add_error(
                format!("interior[{}]", i),
                format!("Polygon interior must have at least 4 points, found {}", interior.0.len()),
            );
        }
    }

    if result.is_valid && polygon.unsigned_area() <= 0.0 {
        result.add_error("exterior".to_string(), "Polygon has zero area".to_string());
    }

    result
}

/// Validate every member polygon of a multipolygon
pub fn validate_multipolygon(multipolygon: &MultiPolygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if multipolygon.0.is_empty() {
        result.add_error("MultiPolygon".to_string(), "Geometry has no polygons".to_string());
        return result;
    }

    for (i, polygon) in multipolygon.0.iter().enumerate() {
        for error in validate_polygon(polygon).errors {
            result.add_error(format!("MultiPolygon[{}].{}", i, error.location), error.reason);
        }
    }

    result
}

/// Fail with `InvalidGeometry` naming `label` when the geometry is not usable
pub fn ensure_valid(multipolygon: &MultiPolygon<f64>, label: &str) -> Result<()> {
    let validation = validate_multipolygon(multipolygon);
    match validation.errors.first() {
        None => Ok(()),
        Some(error) => Err(RainforceError::InvalidGeometry {
            location: format!("{} {}", label, error.location),
            reason: error.reason.clone(),
        }),
    }
}
