//! Uniform cell grid over a subset of positions.
//!
//! Cells are addressed by a linear index `x + y * dx + z * dx * dy`. Non-empty
//! cells are stored as buckets in ascending linear-index order, and positions
//! within a bucket keep their ascending subset order, so bucketing the same input
//! always produces the same partition.

use super::boundary::Boundary;
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeMap, HashMap};

/// Borrowed coordinate arrays plus the subset of element indices to grid.
/// `radius`, when given, is indexed like `x`.
#[derive(Debug, Clone, Copy)]
pub struct PositionData<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub z: &'a [f64],
    pub indices: &'a [usize],
    pub radius: Option<&'a [f64]>,
}

/// Non-empty cells in offset/count/flat-array form. `array` holds subset positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridBuckets {
    pub offset: Vec<usize>,
    pub count: Vec<usize>,
    pub array: Vec<usize>,
}

impl GridBuckets {
    pub fn len(&self) -> usize {
        self.offset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offset.is_empty()
    }

    pub fn bucket(&self, i: usize) -> &[usize] {
        let start = self.offset[i];
        &self.array[start..start + self.count[i]]
    }
}

/// Hits of a range query, ascending by subset position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupResult {
    pub indices: Vec<usize>,
    pub squared_distances: Vec<f64>,
}

impl LookupResult {
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .copied()
            .zip(self.squared_distances.iter().copied())
    }
}

#[derive(Debug, Clone)]
pub struct GridLookup3D {
    positions: Vec<Point3<f64>>,
    radius: Option<Vec<f64>>,
    max_radius: f64,
    indices: Vec<usize>,
    min: Point3<f64>,
    cell_size: Vector3<f64>,
    dims: [usize; 3],
    cells: HashMap<usize, usize>,
    buckets: GridBuckets,
    boundary: Boundary,
}

impl GridLookup3D {
    pub fn new(data: PositionData<'_>, cell_size: Vector3<f64>) -> Self {
        let cell_size = cell_size.map(|c| if c > 0.0 { c } else { 1.0 });
        let positions: Vec<Point3<f64>> = data
            .indices
            .iter()
            .map(|&i| Point3::new(data.x[i], data.y[i], data.z[i]))
            .collect();
        let radius: Option<Vec<f64>> = data
            .radius
            .map(|r| data.indices.iter().map(|&i| r[i]).collect());
        let max_radius = radius
            .as_ref()
            .map_or(0.0, |r| r.iter().copied().fold(0.0, f64::max));
        let boundary = Boundary::from_points(&positions, radius.as_deref());
        let min = boundary.bbox.min;
        let extent = boundary.bbox.size();
        let dims = [0, 1, 2].map(|i| (extent[i] / cell_size[i]).floor() as usize + 1);

        let mut grid = Self {
            positions,
            radius,
            max_radius,
            indices: data.indices.to_vec(),
            min,
            cell_size,
            dims,
            cells: HashMap::new(),
            buckets: GridBuckets::default(),
            boundary,
        };
        grid.fill_buckets();
        grid
    }

    fn fill_buckets(&mut self) {
        let keys: Vec<usize> = self
            .positions
            .iter()
            .map(|p| {
                let c = self.cell_of(p);
                self.linear_index(c)
            })
            .collect();

        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for &key in &keys {
            *counts.entry(key).or_default() += 1;
        }

        let mut offset = Vec::with_capacity(counts.len());
        let mut count = Vec::with_capacity(counts.len());
        let mut running = 0;
        for (bucket, (&key, &n)) in counts.iter().enumerate() {
            self.cells.insert(key, bucket);
            offset.push(running);
            count.push(n);
            running += n;
        }

        let mut fill = vec![0usize; offset.len()];
        let mut array = vec![0usize; keys.len()];
        for (k, key) in keys.iter().enumerate() {
            let bucket = self.cells[key];
            array[offset[bucket] + fill[bucket]] = k;
            fill[bucket] += 1;
        }

        self.buckets = GridBuckets {
            offset,
            count,
            array,
        };
    }

    fn cell_of(&self, p: &Point3<f64>) -> [usize; 3] {
        [0, 1, 2].map(|i| {
            let c = ((p[i] - self.min[i]) / self.cell_size[i]).floor();
            if c <= 0.0 {
                0
            } else {
                (c as usize).min(self.dims[i] - 1)
            }
        })
    }

    #[inline]
    fn linear_index(&self, c: [usize; 3]) -> usize {
        c[0] + c[1] * self.dims[0] + c[2] * self.dims[0] * self.dims[1]
    }

    pub fn buckets(&self) -> &GridBuckets {
        &self.buckets
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Element index stored at subset position `k`.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn visit(&self, point: &Point3<f64>, radius: f64, mut f: impl FnMut(usize, f64) -> bool) {
        if self.positions.is_empty() {
            return;
        }
        let reach = Vector3::repeat(radius + self.max_radius);
        let lo = self.cell_of(&(point - reach));
        let hi = self.cell_of(&(point + reach));
        for z in lo[2]..=hi[2] {
            for y in lo[1]..=hi[1] {
                for x in lo[0]..=hi[0] {
                    let Some(&bucket) = self.cells.get(&self.linear_index([x, y, z])) else {
                        continue;
                    };
                    for &k in self.buckets.bucket(bucket) {
                        let d2 = (self.positions[k] - point).norm_squared();
                        let limit = radius + self.radius.as_ref().map_or(0.0, |r| r[k]);
                        if d2 <= limit * limit && !f(k, d2) {
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Subset positions within `radius` of `point` (plus each position's own radius, if any).
    pub fn find(&self, point: &Point3<f64>, radius: f64) -> LookupResult {
        let mut hits: Vec<(usize, f64)> = Vec::new();
        self.visit(point, radius, |k, d2| {
            hits.push((k, d2));
            true
        });
        hits.sort_unstable_by_key(|&(k, _)| k);
        let (indices, squared_distances) = hits.into_iter().unzip();
        LookupResult {
            indices,
            squared_distances,
        }
    }

    pub fn check(&self, point: &Point3<f64>, radius: f64) -> bool {
        let mut found = false;
        self.visit(point, radius, |_, _| {
            found = true;
            false
        });
        found
    }

    /// Closest subset position to `point` and its squared distance.
    pub fn nearest(&self, point: &Point3<f64>) -> Option<(usize, f64)> {
        if self.positions.is_empty() || !point.iter().all(|c| c.is_finite()) {
            return None;
        }
        let sphere = &self.boundary.sphere;
        let limit = (point - sphere.center).norm() + sphere.radius;
        let mut radius = self.cell_size.min();
        loop {
            let mut best: Option<(usize, f64)> = None;
            self.visit(point, radius, |k, d2| {
                if best.is_none_or(|(bk, bd)| d2 < bd || (d2 == bd && k < bk)) {
                    best = Some((k, d2));
                }
                true
            });
            if best.is_some() || radius > limit {
                return best;
            }
            radius *= 2.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Points {
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
    }

    fn points(coords: &[[f64; 3]]) -> Points {
        Points {
            x: coords.iter().map(|c| c[0]).collect(),
            y: coords.iter().map(|c| c[1]).collect(),
            z: coords.iter().map(|c| c[2]).collect(),
        }
    }

    fn grid(p: &Points, indices: &[usize], cell: f64) -> GridLookup3D {
        GridLookup3D::new(
            PositionData {
                x: &p.x,
                y: &p.y,
                z: &p.z,
                indices,
                radius: None,
            },
            Vector3::repeat(cell),
        )
    }

    mod bucketing {
        use super::*;

        #[test]
        fn empty_subset_has_no_buckets() {
            let p = points(&[[0.0, 0.0, 0.0]]);
            let g = grid(&p, &[], 4.0);
            assert!(g.buckets().is_empty());
            assert!(g.find(&Point3::origin(), 10.0).is_empty());
            assert!(g.nearest(&Point3::origin()).is_none());
        }

        #[test]
        fn single_point_forms_one_bucket() {
            let p = points(&[[5.0, 5.0, 5.0]]);
            let g = grid(&p, &[0], 64.0);
            assert_eq!(g.buckets().len(), 1);
            assert_eq!(g.buckets().bucket(0), &[0]);
        }

        #[test]
        fn distant_points_land_in_separate_buckets_in_cell_order() {
            let p = points(&[
                [100.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 1.0],
                [101.0, 0.0, 0.0],
            ]);
            let g = grid(&p, &[0, 1, 2, 3], 64.0);
            let b = g.buckets();
            assert_eq!(b.len(), 2);
            assert_eq!(b.bucket(0), &[1, 2]);
            assert_eq!(b.bucket(1), &[0, 3]);
            assert_eq!(b.offset, vec![0, 2]);
            assert_eq!(b.count, vec![2, 2]);
        }

        #[test]
        fn bucket_array_refers_to_subset_positions() {
            let p = points(&[[0.0, 0.0, 0.0], [50.0, 0.0, 0.0], [200.0, 0.0, 0.0]]);
            let g = grid(&p, &[2, 0], 64.0);
            assert_eq!(g.indices(), &[2, 0]);
            assert_eq!(g.buckets().bucket(0), &[1]);
            assert_eq!(g.buckets().bucket(1), &[0]);
        }
    }

    mod queries {
        use super::*;

        fn line() -> Points {
            points(&[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [10.0, 0.0, 0.0],
            ])
        }

        #[test]
        fn find_returns_hits_sorted_by_subset_position() {
            let p = line();
            let g = grid(&p, &[0, 1, 2, 3], 1.0);
            let r = g.find(&Point3::new(1.0, 0.0, 0.0), 1.0);
            assert_eq!(r.indices, vec![0, 1, 2]);
            assert_eq!(r.squared_distances, vec![1.0, 0.0, 1.0]);
        }

        #[test]
        fn find_respects_per_position_radius() {
            let p = line();
            let radius = [0.0, 0.0, 0.0, 5.0];
            let g = GridLookup3D::new(
                PositionData {
                    x: &p.x,
                    y: &p.y,
                    z: &p.z,
                    indices: &[0, 1, 2, 3],
                    radius: Some(&radius),
                },
                Vector3::repeat(2.0),
            );
            let r = g.find(&Point3::new(4.0, 0.0, 0.0), 2.0);
            assert_eq!(r.indices, vec![2, 3]);
        }

        #[test]
        fn find_handles_points_outside_the_grid() {
            let p = line();
            let g = grid(&p, &[0, 1, 2, 3], 1.0);
            assert!(g.find(&Point3::new(-50.0, 0.0, 0.0), 1.0).is_empty());
            assert_eq!(g.find(&Point3::new(-1.0, 0.0, 0.0), 1.0).indices, vec![0]);
        }

        #[test]
        fn check_matches_find() {
            let p = line();
            let g = grid(&p, &[0, 1, 2, 3], 1.0);
            assert!(g.check(&Point3::new(9.5, 0.0, 0.0), 1.0));
            assert!(!g.check(&Point3::new(6.0, 0.0, 0.0), 1.0));
        }

        #[test]
        fn nearest_finds_closest_position() {
            let p = line();
            let g = grid(&p, &[0, 1, 2, 3], 1.0);
            assert_eq!(g.nearest(&Point3::new(7.0, 0.0, 0.0)), Some((3, 9.0)));
            assert_eq!(g.nearest(&Point3::new(-30.0, 0.0, 0.0)).map(|n| n.0), Some(0));
        }

        #[test]
        fn nearest_of_non_finite_point_is_none() {
            let p = line();
            let g = grid(&p, &[0, 1, 2, 3], 1.0);
            assert_eq!(g.nearest(&Point3::new(f64::NAN, 0.0, 0.0)), None);
            assert_eq!(g.nearest(&Point3::new(0.0, f64::INFINITY, 0.0)), None);
        }
    }
}
