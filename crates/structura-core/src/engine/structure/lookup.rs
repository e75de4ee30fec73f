use super::structure::Structure;
use super::unit::Unit;
use crate::core::models::ids::UnitId;
use crate::core::spatial::boundary::Boundary;
use crate::core::spatial::grid::{GridLookup3D, LookupResult, PositionData};
use nalgebra::Point3;
use std::sync::Arc;

/// Hits of a structure-wide query, ascending by unit then by position within the unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureLookupResult {
    pub units: Vec<UnitId>,
    /// Positions within each unit's element set.
    pub indices: Vec<usize>,
    pub squared_distances: Vec<f64>,
}

impl StructureLookupResult {
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Two-level spatial index: a grid over unit bounding spheres, then each unit's own grid.
#[derive(Debug)]
pub struct StructureLookup3D {
    units: Vec<Arc<Unit>>,
    unit_lookup: GridLookup3D,
    boundary: Boundary,
}

impl StructureLookup3D {
    pub fn new(structure: &Structure) -> Self {
        let units = structure.units().to_vec();
        let n = units.len();
        let (mut x, mut y, mut z, mut radius) = (
            Vec::with_capacity(n),
            Vec::with_capacity(n),
            Vec::with_capacity(n),
            Vec::with_capacity(n),
        );
        for unit in &units {
            let sphere = &unit.boundary().sphere;
            x.push(sphere.center.x);
            y.push(sphere.center.y);
            z.push(sphere.center.z);
            radius.push(sphere.radius);
        }
        let indices: Vec<usize> = (0..n).collect();
        let unit_lookup = GridLookup3D::new(
            PositionData {
                x: &x,
                y: &y,
                z: &z,
                indices: &indices,
                radius: Some(&radius),
            },
            structure.config().grid_cell_size,
        );
        let boundary = Boundary::union(units.iter().filter(|u| !u.elements().is_empty()).map(|u| u.boundary()));
        Self {
            units,
            unit_lookup,
            boundary,
        }
    }

    /// Units whose bounding sphere reaches within `radius` of `point`, as positions in `units()`.
    pub fn find_unit_indices(&self, point: &Point3<f64>, radius: f64) -> LookupResult {
        self.unit_lookup.find(point, radius)
    }

    pub fn find(&self, point: &Point3<f64>, radius: f64) -> StructureLookupResult {
        let mut result = StructureLookupResult::default();
        for &u in &self.find_unit_indices(point, radius).indices {
            let unit = &self.units[u];
            let hits = unit.lookup3d().find(point, radius);
            for (k, d2) in hits.iter() {
                result.units.push(unit.id());
                result.indices.push(k);
                result.squared_distances.push(d2);
            }
        }
        result
    }

    pub fn check(&self, point: &Point3<f64>, radius: f64) -> bool {
        self.find_unit_indices(point, radius)
            .indices
            .iter()
            .any(|&u| self.units[u].lookup3d().check(point, radius))
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::ModelBuilder;
    use crate::core::models::entity::EntityType;
    use crate::core::models::model::Model;

    fn spread_model() -> Arc<Model> {
        let mut b = ModelBuilder::new("spread");
        b.add_entity("1", EntityType::Polymer);
        b.start_chain("A", "A", "1")
            .start_residue("ALA", 1)
            .add_atom("CA", "C", Point3::new(0.0, 0.0, 0.0))
            .add_atom("CB", "C", Point3::new(1.0, 0.0, 0.0));
        b.start_chain("B", "B", "1")
            .start_residue("ALA", 1)
            .add_atom("CA", "C", Point3::new(100.0, 0.0, 0.0))
            .add_atom("CB", "C", Point3::new(101.0, 0.0, 0.0));
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn find_descends_into_nearby_units_only() {
        let s = Structure::of_model(&spread_model()).unwrap();
        let lookup = s.lookup3d();
        let hits = lookup.find(&Point3::new(100.4, 0.0, 0.0), 0.5);
        assert_eq!(hits.units, vec![1]);
        assert_eq!(hits.indices, vec![0]);
        assert!((hits.squared_distances[0] - 0.16).abs() < 1e-9);
    }

    #[test]
    fn check_and_unit_indices_agree() {
        let s = Structure::of_model(&spread_model()).unwrap();
        let lookup = s.lookup3d();
        assert!(lookup.check(&Point3::new(0.5, 0.0, 0.0), 0.6));
        assert!(!lookup.check(&Point3::new(50.0, 0.0, 0.0), 5.0));
        assert_eq!(lookup.find_unit_indices(&Point3::new(0.5, 0.0, 0.0), 0.1).indices, vec![0]);
    }

    #[test]
    fn boundary_spans_every_unit() {
        let s = Structure::of_model(&spread_model()).unwrap();
        let b = s.lookup3d().boundary();
        assert_eq!(b.bbox.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(b.bbox.max, Point3::new(101.0, 0.0, 0.0));
    }

    #[test]
    fn empty_structure_finds_nothing() {
        let s = Structure::default();
        assert!(s.lookup3d().find(&Point3::origin(), 10.0).is_empty());
    }
}
