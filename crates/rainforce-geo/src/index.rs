use rstar::primitives::GeomWithData;
use rstar::RTree;

/// Site location tagged with its position in the caller's site list
pub type IndexedSite = GeomWithData<[f64; 2], usize>;

/// R-tree over site locations for nearest-site queries
pub struct SiteIndex {
    tree: RTree<IndexedSite>,
}

impl SiteIndex {
    /// Build an index where each point is tagged with its slice position
    pub fn from_points(points: &[[f64; 2]]) -> Self {
        let indexed: Vec<IndexedSite> =
            points.iter().enumerate().map(|(i, p)| GeomWithData::new(*p, i)).collect();

        Self { tree: RTree::bulk_load(indexed) }
    }

    /// Position of the site nearest to `point`
    pub fn nearest(&self, point: [f64; 2]) -> Option<usize> {
        self.tree.nearest_neighbor(&point).map(|entry| entry.data)
    }

    /// Sites ordered by increasing distance from `point`, with the distance
    pub fn by_distance(&self, point: [f64; 2]) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.tree.nearest_neighbor_iter(&point).map(move |entry| {
            let p = entry.geom();
            let dx = p[0] - point[0];
            let dy = p[1] - point[1];
            (entry.data, (dx * dx + dy * dy).sqrt())
        })
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_site() {
        let index = SiteIndex::from_points(&[[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.nearest([9.0, 1.0]), Some(1));
        assert_eq!(index.nearest([1.0, 6.0]), Some(2));
    }

    #[test]
    fn test_by_distance_is_ordered() {
        let index = SiteIndex::from_points(&[[5.0, 0.0], [1.0, 0.0], [3.0, 0.0]]);
        let order: Vec<(usize, f64)> = index.by_distance([0.0, 0.0]).collect();
        assert_eq!(order.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 2, 0]);
        assert!((order[2].1 - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_index() {
        let index = SiteIndex::from_points(&[]);
        assert!(index.is_empty());
        assert_eq!(index.nearest([0.0, 0.0]), None);
    }
}
