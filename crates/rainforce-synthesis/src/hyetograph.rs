//! Design-storm hyetograph synthesis.
//!
//! The depth-duration curve of a site is sampled at every increment of the
//! storm and the resulting depth blocks are arranged in time, either by the
//! alternating-block method or along a Chicago mass curve. Each point carries
//! the mean intensity of the increment ending at its time, so the series has
//! `storm_length / increment + 1` points and starts at t = 0.

use crate::interpolation::DepthCurve;
use rainforce_core::error::{RainforceError, Result};
use rainforce_core::models::{
    DepthTable, HyetoMethod, Hyetograph, HyetographParams, HyetographPoint,
};

/// Synthesize the hyetograph of one site
pub fn synthesize(table: &DepthTable, params: &HyetographParams) -> Result<Hyetograph> {
    params.validate()?;

    let storm = params.storm_length_mins;
    if storm > table.max_duration() {
        return Err(RainforceError::DurationOutOfRange {
            site_id: table.site_id.to_string(),
            duration_mins: storm as f64,
            reason: format!(
                "storm length exceeds the longest tabulated duration ({} min)",
                table.max_duration()
            ),
        });
    }

    let curve = DepthCurve::new(table, params.interp);
    let blocks = match params.method {
        HyetoMethod::AltBlock => alternating_blocks(&curve, params)?,
        HyetoMethod::Chicago => chicago_blocks(&curve, params)?,
    };

    let increment = params.increment_mins as f64;
    let points = blocks
        .iter()
        .enumerate()
        .map(|(k, depth)| {
            let mins = k as f64 * increment;
            HyetographPoint { mins, seconds: mins * 60.0, intensity_mmhr: depth / increment * 60.0 }
        })
        .collect();

    Ok(Hyetograph { site_id: table.site_id.clone(), increment_mins: params.increment_mins, points })
}

/// Synthesize one hyetograph per site on a shared time axis
pub fn synthesize_all(tables: &[DepthTable], params: &HyetographParams) -> Result<Vec<Hyetograph>> {
    let hyetographs = tables
        .iter()
        .map(|table| synthesize(table, params))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        sites = hyetographs.len(),
        points = params.point_count(),
        method = %params.method,
        interp = %params.interp,
        "Synthesized hyetographs"
    );
    Ok(hyetographs)
}

/// Incremental depths of the cumulative curve, one per increment
fn increments(cumulative: &[f64]) -> Vec<f64> {
    let mut blocks = Vec::with_capacity(cumulative.len());
    blocks.push(0.0);
    blocks.extend(cumulative.windows(2).map(|w| (w[1] - w[0]).max(0.0)));
    blocks
}

/// Share of the largest block moved from each block tied with it to the peak
const PEAK_SEPARATION: f64 = 1e-6;

/// Keep the largest of descending blocks strictly above the rest
///
/// Linear segments of the depth-duration curve yield equal blocks; each block
/// tied with the largest hands `PEAK_SEPARATION` of it to the peak block, so
/// the total depth is unchanged.
fn separate_peak(sorted: &mut [f64]) {
    let Some((largest, rest)) = sorted.split_first_mut() else {
        return;
    };
    if *largest <= 0.0 {
        return;
    }

    let top = *largest;
    let shift = PEAK_SEPARATION * top;
    let mut tied = 0usize;
    for block in rest.iter_mut().take_while(|b| top - **b <= top * 1e-9) {
        *block -= shift;
        tied += 1;
    }
    *largest += shift * tied as f64;
}

fn alternating_blocks(curve: &DepthCurve, params: &HyetographParams) -> Result<Vec<f64>> {
    let n = params.point_count();
    let increment = params.increment_mins as f64;

    let cumulative = (0..n)
        .map(|k| curve.depth_at(k as f64 * increment))
        .collect::<Result<Vec<_>>>()?;

    let mut sorted = increments(&cumulative);
    sorted.sort_by(|a, b| b.total_cmp(a));
    separate_peak(&mut sorted);

    let peak = (params.time_to_peak_mins / params.increment_mins) as usize;
    let mut arranged = vec![0.0; n];
    let mut after = peak + 1;
    let mut before = peak;
    let mut place_after = true;

    let mut values = sorted.into_iter();
    if let Some(largest) = values.next() {
        arranged[peak] = largest;
    }
    for value in values {
        let use_after = (place_after && after < n) || before == 0;
        if use_after {
            arranged[after] = value;
            after += 1;
        } else {
            before -= 1;
            arranged[before] = value;
        }
        place_after = !place_after;
    }

    Ok(arranged)
}

fn chicago_blocks(curve: &DepthCurve, params: &HyetographParams) -> Result<Vec<f64>> {
    let n = params.point_count();
    let increment = params.increment_mins as f64;
    let storm = params.storm_length_mins as f64;
    let peak = params.time_to_peak_mins as f64;
    let r = peak / storm;
    let total = curve.depth_at(storm)?;

    // Cumulative depth: the depth within any window around the peak follows
    // the depth-duration curve, split r before and 1 - r after the peak
    let mass = |t: f64| -> Result<f64> {
        if t <= peak && r > 0.0 {
            let window = ((peak - t) / r).clamp(0.0, storm);
            Ok(r * total - r * curve.depth_at(window)?)
        } else {
            let window = ((t - peak) / (1.0 - r)).clamp(0.0, storm);
            Ok(r * total + (1.0 - r) * curve.depth_at(window)?)
        }
    };

    let cumulative = (0..n).map(|k| mass(k as f64 * increment)).collect::<Result<Vec<_>>>()?;
    Ok(increments(&cumulative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainforce_core::models::{InterpMethod, SiteId};

    fn table() -> DepthTable {
        DepthTable::new(SiteId::new("a"), vec![(10, 5.0), (30, 12.0), (60, 18.0)]).unwrap()
    }

    fn params(method: HyetoMethod, interp: InterpMethod) -> HyetographParams {
        HyetographParams {
            storm_length_mins: 60,
            time_to_peak_mins: 30,
            increment_mins: 10,
            interp,
            method,
        }
    }

    #[test]
    fn test_alternating_block_single_site() {
        let hyetograph =
            synthesize(&table(), &params(HyetoMethod::AltBlock, InterpMethod::Cubic)).unwrap();

        assert_eq!(hyetograph.len(), 7);
        assert!(hyetograph.intensities().all(|i| i >= 0.0));
        assert_eq!(hyetograph.peak().unwrap().mins, 30.0);
        assert!((hyetograph.total_depth_mm() - 18.0).abs() < 18.0 * 1e-6);

        let times: Vec<f64> = hyetograph.points.iter().map(|p| p.seconds).collect();
        assert_eq!(times, vec![0.0, 600.0, 1200.0, 1800.0, 2400.0, 3000.0, 3600.0]);
    }

    #[test]
    fn test_alternating_block_linear_layout() {
        // Linear blocks: 5, 3.5, 3.5, 2, 2, 2 (+ the zero block at t = 0)
        let hyetograph =
            synthesize(&table(), &params(HyetoMethod::AltBlock, InterpMethod::Linear)).unwrap();
        let depths: Vec<f64> = hyetograph.intensities().map(|i| i / 6.0).collect();
        // Largest at the peak, then after, before, after, ...
        let expected = [0.0, 2.0, 3.5, 5.0, 3.5, 2.0, 2.0];
        for (got, want) in depths.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{:?}", depths);
        }
    }

    #[test]
    fn test_alternating_block_tied_blocks_keep_one_peak() {
        // 5 min steps split the first 10 min segment into two equal 2.5 mm blocks
        let p = HyetographParams {
            increment_mins: 5,
            ..params(HyetoMethod::AltBlock, InterpMethod::Linear)
        };
        let hyetograph = synthesize(&table(), &p).unwrap();

        let max = hyetograph.intensities().fold(0.0, f64::max);
        let at_max: Vec<f64> =
            hyetograph.points.iter().filter(|pt| pt.intensity_mmhr == max).map(|pt| pt.mins).collect();
        assert_eq!(at_max, vec![30.0]);
        assert!((max - 30.0).abs() < 1e-3);
        assert!((hyetograph.total_depth_mm() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_peak_at_storm_edges() {
        for peak in [0, 60] {
            let p = HyetographParams {
                time_to_peak_mins: peak,
                ..params(HyetoMethod::AltBlock, InterpMethod::Cubic)
            };
            let hyetograph = synthesize(&table(), &p).unwrap();
            assert_eq!(hyetograph.peak().unwrap().mins, peak as f64);
            assert!((hyetograph.total_depth_mm() - 18.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_chicago_conserves_depth() {
        for peak in [0, 20, 30, 60] {
            let p = HyetographParams {
                time_to_peak_mins: peak,
                ..params(HyetoMethod::Chicago, InterpMethod::Cubic)
            };
            let hyetograph = synthesize(&table(), &p).unwrap();
            assert_eq!(hyetograph.len(), 7);
            assert!(hyetograph.intensities().all(|i| i >= 0.0));
            assert!((hyetograph.total_depth_mm() - 18.0).abs() < 1e-9, "peak {}", peak);
        }
    }

    #[test]
    fn test_chicago_front_loaded_storm_follows_curve() {
        let p = HyetographParams {
            time_to_peak_mins: 0,
            ..params(HyetoMethod::Chicago, InterpMethod::Linear)
        };
        let hyetograph = synthesize(&table(), &p).unwrap();
        // With the peak at the start the mass curve is the depth curve itself
        assert!((hyetograph.points[1].intensity_mmhr - 30.0).abs() < 1e-9);
        assert!((hyetograph.points[2].intensity_mmhr - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_storm_longer_than_table() {
        let p = HyetographParams {
            storm_length_mins: 120,
            ..params(HyetoMethod::AltBlock, InterpMethod::Cubic)
        };
        let err = synthesize(&table(), &p).unwrap_err();
        assert!(matches!(err, RainforceError::DurationOutOfRange { .. }));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let p = HyetographParams {
            time_to_peak_mins: 90,
            ..params(HyetoMethod::AltBlock, InterpMethod::Cubic)
        };
        assert!(matches!(
            synthesize(&table(), &p).unwrap_err(),
            RainforceError::InvalidParameter { .. }
        ));
    }

    #[test]
    fn test_synthesize_all_shares_time_axis() {
        let other = DepthTable::new(SiteId::new("b"), vec![(10, 8.0), (60, 30.0)]).unwrap();
        let all = synthesize_all(
            &[table(), other],
            &params(HyetoMethod::AltBlock, InterpMethod::Cubic),
        )
        .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].len(), all[1].len());
        assert!((all[1].total_depth_mm() - 30.0).abs() < 1e-9);
    }
}
