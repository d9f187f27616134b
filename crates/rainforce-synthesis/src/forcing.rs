//! Forcing assembly: coverage weights and hyetographs into solver forcing.

use geo::MultiPolygon;
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{
    Crs, ForcingCube, ForcingField, Hyetograph, RainInputType, SiteCoverage, UniformForcing,
};
use rainforce_geo::index::SiteIndex;
use rainforce_geo::spatial::{covers_point, envelope};

/// Upper bound on cells in one time slice of a gridded field
pub const MAX_GRID_CELLS: usize = 4_000_000;

/// Hyetograph of every coverage, in coverage order, on one shared time axis
fn site_series<'a>(
    coverages: &[SiteCoverage],
    hyetographs: &'a [Hyetograph],
) -> Result<Vec<&'a Hyetograph>> {
    let series = coverages
        .iter()
        .map(|coverage| {
            hyetographs.iter().find(|h| h.site_id == coverage.site_id).ok_or_else(|| {
                RainforceError::insufficient_input(
                    "forcing assembly",
                    format!("no hyetograph for covering site {}", coverage.site_id),
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let Some(first) = series.first() else {
        return Err(RainforceError::insufficient_input("forcing assembly", "no covering sites"));
    };

    if let Some(odd) = series
        .iter()
        .find(|h| h.len() != first.len() || h.increment_mins != first.increment_mins)
    {
        return Err(RainforceError::invalid_parameter(
            "hyetographs",
            format!(
                "site {} has {} points every {} min, site {} has {} every {} min",
                odd.site_id,
                odd.len(),
                odd.increment_mins,
                first.site_id,
                first.len(),
                first.increment_mins
            ),
        ));
    }

    Ok(series)
}

/// Coverage-weighted mean intensity of all covering sites at every step
pub fn uniform_forcing(coverages: &[SiteCoverage], hyetographs: &[Hyetograph]) -> Result<UniformForcing> {
    let series = site_series(coverages, hyetographs)?;
    let steps = series[0].len();

    let seconds = series[0].points.iter().map(|p| p.seconds).collect();
    let intensity_mmhr = (0..steps)
        .map(|t| {
            coverages
                .iter()
                .zip(&series)
                .map(|(coverage, h)| coverage.weight * h.points[t].intensity_mmhr)
                .sum()
        })
        .collect();

    Ok(UniformForcing { seconds, intensity_mmhr })
}

/// Grid the catchment and give every inside cell the hyetograph of its site
///
/// A cell belongs to the site whose clipped influence polygon contains its
/// centre; centres on shared edges or in gaps fall back to the nearest
/// covering site. Cells whose centre lies outside the catchment are masked.
pub fn build_cube(
    coverages: &[SiteCoverage],
    hyetographs: &[Hyetograph],
    catchment: &MultiPolygon<f64>,
    crs: &Crs,
    cell_size: f64,
) -> Result<ForcingCube> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(RainforceError::invalid_parameter(
            "grid_cell_size",
            format!("must be a positive number, got {}", cell_size),
        ));
    }

    let series = site_series(coverages, hyetographs)?;
    let bbox = envelope(catchment)
        .ok_or_else(|| RainforceError::insufficient_input("forcing grid", "catchment polygon is empty"))?;

    let nx = ((bbox.width() / cell_size).ceil() as usize).max(1);
    let ny = ((bbox.height() / cell_size).ceil() as usize).max(1);
    if nx.saturating_mul(ny) > MAX_GRID_CELLS {
        return Err(RainforceError::invalid_parameter(
            "grid_cell_size",
            format!("{} x {} cells exceeds the limit of {}", nx, ny, MAX_GRID_CELLS),
        ));
    }

    let x: Vec<f64> = (0..nx).map(|i| bbox.min().x + (i as f64 + 0.5) * cell_size).collect();
    let y: Vec<f64> = (0..ny).map(|j| bbox.min().y + (j as f64 + 0.5) * cell_size).collect();

    let locations: Vec<[f64; 2]> = coverages.iter().map(|c| c.site_location).collect();
    let index = SiteIndex::from_points(&locations);
    let envelopes: Vec<_> = coverages.iter().map(|c| envelope(&c.geometry)).collect();

    let mut cell_sites = Vec::with_capacity(nx * ny);
    for cy in &y {
        for cx in &x {
            let centre = [*cx, *cy];
            if !covers_point(catchment, centre) {
                cell_sites.push(None);
                continue;
            }

            let owner = coverages.iter().zip(&envelopes).position(|(coverage, extent)| {
                extent.map(|b| {
                    b.min().x <= centre[0]
                        && centre[0] <= b.max().x
                        && b.min().y <= centre[1]
                        && centre[1] <= b.max().y
                })
                .unwrap_or(false)
                    && covers_point(&coverage.geometry, centre)
            });
            cell_sites.push(owner.or_else(|| index.nearest(centre)));
        }
    }

    if cell_sites.iter().all(Option::is_none) {
        return Err(RainforceError::invalid_parameter(
            "grid_cell_size",
            format!("no cell centre of a {} grid falls inside the catchment", cell_size),
        ));
    }

    let steps = series[0].len();
    let mut data = Vec::with_capacity(steps * nx * ny);
    for t in 0..steps {
        data.extend(
            cell_sites
                .iter()
                .map(|site| site.map(|s| series[s].points[t].intensity_mmhr).unwrap_or(0.0)),
        );
    }

    tracing::debug!(nx, ny, steps, "Built gridded forcing");
    Ok(ForcingCube {
        crs: crs.clone(),
        x,
        y,
        seconds: series[0].points.iter().map(|p| p.seconds).collect(),
        sites: coverages.iter().map(|c| c.site_id.clone()).collect(),
        cell_sites,
        data,
    })
}

/// Largest deviation of a gridded field's spatial mean from the uniform
/// series, relative to the peak uniform intensity
pub const CONSISTENCY_TOLERANCE: f64 = 0.05;

/// Check a gridded field against the uniform series it must agree with
///
/// At every step the area-weighted mean over inside cells must lie within
/// `tolerance` x the peak uniform intensity of the uniform value. A grid too
/// coarse to resolve the coverage weights fails here.
pub fn check_consistency(cube: &ForcingCube, uniform: &UniformForcing, tolerance: f64) -> Result<()> {
    if cube.nt() != uniform.len() {
        return Err(RainforceError::invalid_parameter(
            "forcing grid",
            format!("{} steps do not match {} uniform steps", cube.nt(), uniform.len()),
        ));
    }

    let peak = uniform.intensity_mmhr.iter().copied().fold(0.0, f64::max);
    let allowed = tolerance * peak + 1e-9;

    let mut worst: f64 = 0.0;
    for t in 0..cube.nt() {
        let mean = cube.spatial_mean(t);
        let deviation = (mean - uniform.intensity_mmhr[t]).abs();
        if deviation > allowed {
            return Err(RainforceError::invalid_parameter(
                "grid_cell_size",
                format!(
                    "gridded mean {:.4} mm/hr at step {} deviates from the uniform {:.4} mm/hr by more than {:.4}; use a finer grid",
                    mean, t, uniform.intensity_mmhr[t], allowed
                ),
            ));
        }
        worst = worst.max(deviation);
    }

    tracing::debug!(worst, allowed, steps = cube.nt(), "Gridded forcing consistent with uniform series");
    Ok(())
}

/// Build the forcing representation requested for the solver
pub fn assemble(
    input_type: RainInputType,
    coverages: &[SiteCoverage],
    hyetographs: &[Hyetograph],
    catchment: &MultiPolygon<f64>,
    crs: &Crs,
    cell_size: f64,
) -> Result<ForcingField> {
    let uniform = uniform_forcing(coverages, hyetographs)?;
    match input_type {
        RainInputType::Uniform => Ok(ForcingField::Uniform(uniform)),
        RainInputType::Varying => {
            let cube = build_cube(coverages, hyetographs, catchment, crs, cell_size)?;
            check_consistency(&cube, &uniform, CONSISTENCY_TOLERANCE)?;
            Ok(ForcingField::Varying(cube))
        }
    }
}
