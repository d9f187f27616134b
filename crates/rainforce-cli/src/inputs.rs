//! Request inputs assembled from command-line arguments

use crate::cli::{RequestArgs, ScenarioArgs, SourceArgs};
use anyhow::{Context, Result};
use geo::MultiPolygon;
use rainforce_core::config::LayeredConfig;
use rainforce_core::models::{Crs, Rcp, Scenario};
use rainforce_core::ports::RainfallSource;
use rainforce_geo::models::parse_polygonal;
use rainforce_source::{HttpRainfallSource, TableRainfallSource};
use rainforce_synthesis::ForcingRequest;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Read a polygonal geometry from a GeoJSON or WKT file
pub fn read_geometry(path: &Path) -> Result<MultiPolygon<f64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read geometry file {}", path.display()))?;
    parse_polygonal(&text).with_context(|| format!("Failed to parse geometry in {}", path.display()))
}

/// Scenario described by the flags; the projected default fills any part left out
pub fn scenario(args: &ScenarioArgs) -> Result<Scenario> {
    let scenario = if args.historical {
        Scenario::historical(args.ari)
    } else {
        let default = Scenario::default();
        let rcp = match &args.rcp {
            Some(rcp) => rcp.parse::<Rcp>()?,
            None => default.rcp.unwrap_or(Rcp::Rcp26),
        };
        let period = args
            .period
            .clone()
            .or(default.time_period)
            .unwrap_or_else(|| "2031-2050".to_string());
        Scenario::projected(args.ari, rcp, period)
    };

    scenario.validate()?;
    Ok(scenario)
}

pub fn forcing_request(
    args: &RequestArgs,
    scenario_args: &ScenarioArgs,
    config: &LayeredConfig,
) -> Result<ForcingRequest> {
    let catchment = read_geometry(&args.catchment)?;
    let crs = Crs::from_epsg(args.catchment_crs.unwrap_or(config.crs.value));

    let mut request = ForcingRequest::new(catchment, scenario(scenario_args)?)
        .with_crs(crs)
        .with_kind(scenario_args.kind.into());
    if let Some(region) = &args.region {
        request = request.with_region(read_geometry(region)?);
    }
    Ok(request)
}

/// Upstream statistics source: a local table when given, else the HTTP service
pub fn rainfall_source(args: &SourceArgs, config: &LayeredConfig) -> Result<Arc<dyn RainfallSource>> {
    match &args.source_file {
        Some(path) => {
            let table = TableRainfallSource::from_path(path)
                .with_context(|| format!("Failed to load statistics table {}", path.display()))?;
            Ok(Arc::new(table))
        }
        None => {
            let source = HttpRainfallSource::new(&config.source_url.value)
                .context("Failed to configure the upstream statistics client")?;
            Ok(Arc::new(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::KindArg;

    fn scenario_args() -> ScenarioArgs {
        ScenarioArgs { kind: KindArg::Depth, ..ScenarioArgs::default() }
    }

    #[test]
    fn test_default_scenario() {
        assert_eq!(scenario(&scenario_args()).unwrap(), Scenario::default());
    }

    #[test]
    fn test_projected_and_historical() {
        let projected = scenario(&ScenarioArgs {
            ari: 50.0,
            rcp: Some("8.5".to_string()),
            period: Some("2081-2100".to_string()),
            ..scenario_args()
        })
        .unwrap();
        assert_eq!(projected.key(), "ari=50;rcp=8.5;period=2081-2100");

        let historical = scenario(&ScenarioArgs { historical: true, ..scenario_args() }).unwrap();
        assert_eq!(historical.key(), "ari=100;historical");
    }

    #[test]
    fn test_bad_scenario_values() {
        assert!(scenario(&ScenarioArgs { rcp: Some("3.0".to_string()), ..scenario_args() }).is_err());
        assert!(scenario(&ScenarioArgs { ari: -1.0, ..scenario_args() }).is_err());
    }

    #[test]
    fn test_read_wkt_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catchment.wkt");
        fs::write(&path, "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
        assert_eq!(read_geometry(&path).unwrap().0.len(), 1);
        assert!(read_geometry(&dir.path().join("missing.wkt")).is_err());
    }
}
