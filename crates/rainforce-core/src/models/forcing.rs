use crate::error::{RainforceError, Result};
use crate::models::geometry::Crs;
use crate::models::site::SiteId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Representation of the rainfall forcing handed to the flood solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RainInputType {
    /// One catchment-mean intensity series
    #[default]
    Uniform,
    /// Gridded (x, y, time) intensity field
    Varying,
}

impl FromStr for RainInputType {
    type Err = RainforceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "uniform" => Ok(RainInputType::Uniform),
            "varying" | "distributed" | "gridded" => Ok(RainInputType::Varying),
            _ => Err(RainforceError::UnsupportedMethod {
                kind: "rain input".to_string(),
                name: s.to_string(),
                expected: "uniform, varying".to_string(),
            }),
        }
    }
}

impl fmt::Display for RainInputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RainInputType::Uniform => f.write_str("uniform"),
            RainInputType::Varying => f.write_str("varying"),
        }
    }
}

/// Catchment-mean intensity series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformForcing {
    /// Elapsed time since storm start
    pub seconds: Vec<f64>,
    pub intensity_mmhr: Vec<f64>,
}

impl UniformForcing {
    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }
}

/// Gridded intensity field indexed by (time, y, x)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcingCube {
    pub crs: Crs,
    /// Cell-centre x coordinates, ascending
    pub x: Vec<f64>,
    /// Cell-centre y coordinates, ascending
    pub y: Vec<f64>,
    /// Elapsed time since storm start
    pub seconds: Vec<f64>,
    /// Sites referenced by `cell_sites`
    pub sites: Vec<SiteId>,
    /// Index into `sites` for every (y, x) cell; `None` outside the catchment
    pub cell_sites: Vec<Option<usize>>,
    /// Intensities in mm/hr, laid out `[t][y][x]`; 0 outside the catchment
    pub data: Vec<f64>,
}

impl ForcingCube {
    pub fn nx(&self) -> usize {
        self.x.len()
    }

    pub fn ny(&self) -> usize {
        self.y.len()
    }

    pub fn nt(&self) -> usize {
        self.seconds.len()
    }

    pub fn value(&self, t: usize, j: usize, i: usize) -> f64 {
        self.data[(t * self.ny() + j) * self.nx() + i]
    }

    /// Time slice `t` as a `[y][x]` slice
    pub fn slice(&self, t: usize) -> &[f64] {
        let cells = self.nx() * self.ny();
        &self.data[t * cells..(t + 1) * cells]
    }

    /// Number of cells inside the catchment
    pub fn active_cells(&self) -> usize {
        self.cell_sites.iter().filter(|c| c.is_some()).count()
    }

    /// Relative area of every (y, x) cell
    ///
    /// Cells of a projected grid are equal; cells of a geographic grid are
    /// weighted by the area of their latitude band, matching the geodesic
    /// areas behind the coverage weights.
    pub fn cell_weights(&self) -> Vec<f64> {
        let row_weights: Vec<f64> = if self.crs.is_geographic() && self.ny() > 1 {
            let half = (self.y[1] - self.y[0]).abs() / 2.0;
            self.y
                .iter()
                .map(|lat| ((lat + half).to_radians().sin() - (lat - half).to_radians().sin()).abs())
                .collect()
        } else {
            vec![1.0; self.ny()]
        };

        row_weights
            .iter()
            .flat_map(|w| std::iter::repeat(*w).take(self.nx()))
            .collect()
    }

    /// Area-weighted mean intensity over the cells inside the catchment at step `t`
    pub fn spatial_mean(&self, t: usize) -> f64 {
        let weights = self.cell_weights();
        let (sum, total) = self
            .slice(t)
            .iter()
            .zip(&self.cell_sites)
            .zip(&weights)
            .filter(|((_, site), _)| site.is_some())
            .fold((0.0, 0.0), |(sum, total), ((value, _), w)| (sum + value * w, total + w));
        if total > 0.0 {
            sum / total
        } else {
            0.0
        }
    }

    /// Share of the inside area assigned to each entry of `sites`
    pub fn site_fractions(&self) -> Vec<f64> {
        let mut areas = vec![0.0; self.sites.len()];
        let mut total = 0.0;
        for (site, w) in self.cell_sites.iter().zip(self.cell_weights()) {
            if let Some(idx) = site {
                areas[*idx] += w;
                total += w;
            }
        }
        if total > 0.0 {
            areas.iter_mut().for_each(|a| *a /= total);
        }
        areas
    }
}

/// Forcing in the representation selected for the solver
#[derive(Debug, Clone, PartialEq)]
pub enum ForcingField {
    Uniform(UniformForcing),
    Varying(ForcingCube),
}

impl ForcingField {
    pub fn input_type(&self) -> RainInputType {
        match self {
            ForcingField::Uniform(_) => RainInputType::Uniform,
            ForcingField::Varying(_) => RainInputType::Varying,
        }
    }

    pub fn time_steps(&self) -> usize {
        match self {
            ForcingField::Uniform(series) => series.len(),
            ForcingField::Varying(cube) => cube.nt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cube() -> ForcingCube {
        // 2x2 grid, one cell outside the catchment, two time steps
        ForcingCube {
            crs: Crs::nztm(),
            x: vec![0.5, 1.5],
            y: vec![0.5, 1.5],
            seconds: vec![0.0, 600.0],
            sites: vec![SiteId::new("a"), SiteId::new("b")],
            cell_sites: vec![Some(0), Some(1), Some(1), None],
            data: vec![1.0, 4.0, 4.0, 0.0, 2.0, 8.0, 8.0, 0.0],
        }
    }

    #[test]
    fn test_cube_indexing() {
        let cube = small_cube();
        assert_eq!(cube.value(1, 0, 1), 8.0);
        assert_eq!(cube.slice(0), &[1.0, 4.0, 4.0, 0.0]);
        assert_eq!(cube.active_cells(), 3);
    }

    #[test]
    fn test_spatial_mean_ignores_masked_cells() {
        let cube = small_cube();
        assert!((cube.spatial_mean(0) - 3.0).abs() < 1e-12);
        assert!((cube.spatial_mean(1) - 6.0).abs() < 1e-12);

        let fractions = cube.site_fractions();
        assert!((fractions[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((fractions[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_geographic_cells_weighted_by_latitude() {
        // One column, a cell at the equator and one at 60°N
        let cube = ForcingCube {
            crs: Crs::wgs84(),
            x: vec![0.5],
            y: vec![0.0, 60.0],
            seconds: vec![0.0],
            sites: vec![SiteId::new("a"), SiteId::new("b")],
            cell_sites: vec![Some(0), Some(1)],
            data: vec![0.0, 30.0],
        };

        let weights = cube.cell_weights();
        let ratio = weights[1] / weights[0];
        assert!((ratio - 0.5).abs() < 0.01, "ratio was {}", ratio);

        // The northern cell is half the size, so it holds a third of the area
        let fractions = cube.site_fractions();
        assert!((fractions[1] - ratio / (1.0 + ratio)).abs() < 1e-12);
        assert!((cube.spatial_mean(0) - 30.0 * fractions[1]).abs() < 1e-9);

        let projected = ForcingCube { crs: Crs::nztm(), ..cube };
        assert_eq!(projected.cell_weights(), vec![1.0, 1.0]);
        assert!((projected.spatial_mean(0) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_input_type() {
        assert_eq!("Uniform".parse::<RainInputType>().unwrap(), RainInputType::Uniform);
        assert_eq!("varying".parse::<RainInputType>().unwrap(), RainInputType::Varying);
        assert!("radar".parse::<RainInputType>().is_err());
    }
}
