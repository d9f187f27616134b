//! Property tests for influence partitioning and coverage weights

use geo::{Area, Contains, Point};
use proptest::prelude::*;
use rainforce_core::models::{Crs, Site};
use rainforce_geo::models::bbox_polygon;
use rainforce_geo::{partition, resolve_coverage};

fn sites_strategy() -> impl Strategy<Value = Vec<Site>> {
    prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 1..12).prop_map(|coords| {
        coords
            .into_iter()
            .enumerate()
            .map(|(i, (x, y))| Site::new(format!("site-{}", i), x, y))
            .collect()
    })
}

fn squared_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

proptest! {
    /// Property: influence areas tile the region
    #[test]
    fn test_areas_tile_region(sites in sites_strategy()) {
        let region = bbox_polygon(-8.0, -8.0, 8.0, 8.0);
        let areas = partition(&sites, &region).unwrap();

        let total: f64 = areas.iter().map(|a| a.geometry.unsigned_area()).sum();
        prop_assert!((total - region.unsigned_area()).abs() < 1e-6 * region.unsigned_area());
    }

    /// Property: a region point belongs to the area of its nearest site
    #[test]
    fn test_point_owned_by_nearest_site(
        sites in sites_strategy(),
        x in -8.0f64..8.0,
        y in -8.0f64..8.0,
    ) {
        let region = bbox_polygon(-8.0, -8.0, 8.0, 8.0);
        let areas = partition(&sites, &region).unwrap();

        let nearest = sites
            .iter()
            .map(|s| squared_distance(s.location, [x, y]))
            .fold(f64::INFINITY, f64::min);

        if let Some(owner) = areas.iter().find(|a| a.geometry.contains(&Point::new(x, y))) {
            let owner_distance = squared_distance(owner.site_location, [x, y]);
            prop_assert!(owner_distance <= nearest + 1e-6);
        }
    }

    /// Property: coverage weights of any overlapping catchment sum to one
    #[test]
    fn test_coverage_weights_sum_to_one(
        sites in sites_strategy(),
        x0 in -7.0f64..6.0,
        y0 in -7.0f64..6.0,
        w in 0.1f64..1.0,
        h in 0.1f64..1.0,
    ) {
        let region = bbox_polygon(-8.0, -8.0, 8.0, 8.0);
        let areas = partition(&sites, &region).unwrap();
        let catchment = bbox_polygon(x0, y0, x0 + w, y0 + h);

        let coverages = resolve_coverage(&areas, &catchment, &Crs::nztm()).unwrap();
        let sum: f64 = coverages.iter().map(|c| c.weight).sum();

        prop_assert!((sum - 1.0).abs() < 1e-9);
        prop_assert!(coverages.iter().all(|c| (0.0..=1.0).contains(&c.weight)));
    }
}
