//! Depth-duration curve interpolation.

use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{DepthTable, InterpMethod, SiteId};

/// Continuous depth-duration curve of one site, anchored at (0, 0)
#[derive(Debug, Clone)]
pub struct DepthCurve {
    site_id: SiteId,
    method: InterpMethod,
    /// Durations in minutes, strictly increasing, starting at 0
    x: Vec<f64>,
    /// Depths in mm
    y: Vec<f64>,
    /// Hermite slopes at each knot (cubic only)
    slopes: Vec<f64>,
}

impl DepthCurve {
    pub fn new(table: &DepthTable, method: InterpMethod) -> Self {
        let mut x = vec![0.0];
        let mut y = vec![0.0];
        for (duration, depth) in &table.entries {
            x.push(*duration as f64);
            y.push(*depth);
        }

        let slopes = match method {
            InterpMethod::Linear => Vec::new(),
            InterpMethod::Cubic => monotone_slopes(&x, &y),
        };

        Self { site_id: table.site_id.clone(), method, x, y, slopes }
    }

    /// Longest duration the curve is defined for
    pub fn max_duration(&self) -> f64 {
        self.x.last().copied().unwrap_or(0.0)
    }

    /// Depth in mm accumulated over `mins`
    pub fn depth_at(&self, mins: f64) -> Result<f64> {
        let max = self.max_duration();
        if !(0.0..=max).contains(&mins) {
            return Err(RainforceError::DurationOutOfRange {
                site_id: self.site_id.to_string(),
                duration_mins: mins,
                reason: format!("outside the tabulated range [0, {}] min", max),
            });
        }

        // Index of the interval [x[k], x[k+1]] containing mins
        let k = match self.x.partition_point(|v| *v <= mins) {
            0 => 0,
            p => (p - 1).min(self.x.len() - 2),
        };

        let h = self.x[k + 1] - self.x[k];
        let t = (mins - self.x[k]) / h;

        let value = match self.method {
            InterpMethod::Linear => self.y[k] + t * (self.y[k + 1] - self.y[k]),
            InterpMethod::Cubic => {
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                let h10 = t3 - 2.0 * t2 + t;
                let h01 = -2.0 * t3 + 3.0 * t2;
                let h11 = t3 - t2;
                h00 * self.y[k]
                    + h10 * h * self.slopes[k]
                    + h01 * self.y[k + 1]
                    + h11 * h * self.slopes[k + 1]
            }
        };

        Ok(value.max(0.0))
    }
}

/// Fritsch-Carlson knot slopes; keeps the interpolant monotone on monotone data
fn monotone_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|k| (y[k + 1] - y[k]) / h[k]).collect();

    if n == 2 {
        return vec![delta[0]; 2];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        if delta[k - 1] * delta[k] > 0.0 {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
        }
    }

    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

/// Shape-preserving three-point end slope
fn end_slope(h0: f64, h1: f64, delta0: f64, delta1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * delta0 - h0 * delta1) / (h0 + h1);
    if d.signum() != delta0.signum() || delta0 == 0.0 {
        0.0
    } else if delta0.signum() != delta1.signum() && d.abs() > (3.0 * delta0).abs() {
        3.0 * delta0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DepthTable {
        DepthTable::new(SiteId::new("a"), vec![(10, 5.0), (30, 12.0), (60, 18.0)]).unwrap()
    }

    #[test]
    fn test_curve_passes_through_knots() {
        for method in [InterpMethod::Linear, InterpMethod::Cubic] {
            let curve = DepthCurve::new(&table(), method);
            assert_eq!(curve.depth_at(0.0).unwrap(), 0.0);
            assert!((curve.depth_at(10.0).unwrap() - 5.0).abs() < 1e-12);
            assert!((curve.depth_at(30.0).unwrap() - 12.0).abs() < 1e-12);
            assert!((curve.depth_at(60.0).unwrap() - 18.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let curve = DepthCurve::new(&table(), InterpMethod::Linear);
        assert!((curve.depth_at(20.0).unwrap() - 8.5).abs() < 1e-12);
        assert!((curve.depth_at(45.0).unwrap() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_cubic_is_non_decreasing() {
        let table = DepthTable::new(
            SiteId::new("a"),
            vec![(10, 5.0), (20, 5.0), (30, 12.0), (60, 12.5), (120, 30.0)],
        )
        .unwrap();
        let curve = DepthCurve::new(&table, InterpMethod::Cubic);

        let mut previous = 0.0;
        for step in 0..=1200 {
            let depth = curve.depth_at(step as f64 * 0.1).unwrap();
            assert!(depth + 1e-12 >= previous, "decrease at {} min", step as f64 * 0.1);
            previous = depth;
        }
        // Flat segment stays flat
        assert!((curve.depth_at(15.0).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_beyond_table_is_out_of_range() {
        let curve = DepthCurve::new(&table(), InterpMethod::Cubic);
        let err = curve.depth_at(61.0).unwrap_err();
        assert!(matches!(err, RainforceError::DurationOutOfRange { ref site_id, .. } if site_id == "a"));
    }

    #[test]
    fn test_single_entry_table() {
        let table = DepthTable::new(SiteId::new("a"), vec![(60, 18.0)]).unwrap();
        let curve = DepthCurve::new(&table, InterpMethod::Cubic);
        assert!((curve.depth_at(30.0).unwrap() - 9.0).abs() < 1e-12);
    }
}
