//! CRS checks and reprojection into the working CRS

use crate::models::Crs;
use geo::MultiPolygon;
use rainforce_core::error::{RainforceError, Result};

/// Check if two CRS are the same
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1.epsg == crs2.epsg
}

/// Detect CRS mismatch and return error if they don't match
pub fn check_crs_mismatch(input_crs: &Crs, working_crs: &Crs) -> Result<()> {
    if !crs_match(input_crs, working_crs) {
        return Err(RainforceError::CrsMismatch {
            input_crs: input_crs.to_string(),
            working_crs: working_crs.to_string(),
        });
    }
    Ok(())
}

/// Bring a geometry into the working CRS
///
/// Without the `proj` feature only identity transforms are possible and any
/// mismatch is reported as `CrsMismatch`.
pub fn to_working_crs(
    geometry: MultiPolygon<f64>,
    from_crs: &Crs,
    working_crs: &Crs,
) -> Result<MultiPolygon<f64>> {
    if crs_match(from_crs, working_crs) {
        return Ok(geometry);
    }
    reproject(&geometry, from_crs, working_crs)
}

/// Reproject a single coordinate pair
pub fn to_working_crs_point(point: [f64; 2], from_crs: &Crs, working_crs: &Crs) -> Result<[f64; 2]> {
    if crs_match(from_crs, working_crs) {
        return Ok(point);
    }
    reproject_point(point, from_crs, working_crs)
}

#[cfg(feature = "proj")]
fn projection(from_crs: &Crs, to_crs: &Crs) -> Result<proj::Proj> {
    let from_proj = format!("EPSG:{}", from_crs.epsg);
    let to_proj = format!("EPSG:{}", to_crs.epsg);

    proj::Proj::new_known_crs(&from_proj, &to_proj, None).map_err(|e| {
        RainforceError::ConfigInvalid {
            key: "crs".to_string(),
            reason: format!("Failed to create projection from {} to {}: {}", from_proj, to_proj, e),
        }
    })
}

#[cfg(feature = "proj")]
fn reproject(
    geometry: &MultiPolygon<f64>,
    from_crs: &Crs,
    to_crs: &Crs,
) -> Result<MultiPolygon<f64>> {
    use geo::MapCoords;

    let proj = projection(from_crs, to_crs)?;
    geometry
        .try_map_coords(|coord| {
            proj.convert((coord.x, coord.y)).map(|(x, y)| geo::Coord { x, y })
        })
        .map_err(|e| RainforceError::InvalidGeometry {
            location: format!("reprojection {} -> {}", from_crs, to_crs),
            reason: format!("Projection failed: {}", e),
        })
}

#[cfg(feature = "proj")]
fn reproject_point(point: [f64; 2], from_crs: &Crs, to_crs: &Crs) -> Result<[f64; 2]> {
    let proj = projection(from_crs, to_crs)?;
    let (x, y) = proj.convert((point[0], point[1])).map_err(|e| {
        RainforceError::InvalidGeometry {
            location: format!("reprojection {} -> {}", from_crs, to_crs),
            reason: format!("Projection failed: {}", e),
        }
    })?;
    Ok([x, y])
}

#[cfg(not(feature = "proj"))]
fn reproject(
    geometry: &MultiPolygon<f64>,
    from_crs: &Crs,
    to_crs: &Crs,
) -> Result<MultiPolygon<f64>> {
    check_crs_mismatch(from_crs, to_crs)?;
    Ok(geometry.clone())
}

#[cfg(not(feature = "proj"))]
fn reproject_point(point: [f64; 2], from_crs: &Crs, to_crs: &Crs) -> Result<[f64; 2]> {
    check_crs_mismatch(from_crs, to_crs)?;
    Ok(point)
}
