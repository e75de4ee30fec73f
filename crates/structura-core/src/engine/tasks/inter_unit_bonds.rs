use super::intra_unit_bonds::{alt_ids_compatible, geometric_bond};
use crate::core::models::component_bond::LinkFlags;
use crate::core::models::ids::UnitId;
use crate::engine::structure::structure::Structure;
use crate::engine::structure::unit::Unit;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

/// A bond between atoms of two units. Endpoints are positions within each
/// unit's element set, with `(unit_a, index_a) < (unit_b, index_b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterUnitEdge {
    pub unit_a: UnitId,
    pub index_a: usize,
    pub unit_b: UnitId,
    pub index_b: usize,
    pub order: u8,
    pub flags: LinkFlags,
}

impl InterUnitEdge {
    /// The endpoint opposite `(unit, index)`, if that is one of the endpoints.
    pub fn other(&self, unit: UnitId, index: usize) -> Option<(UnitId, usize)> {
        if (self.unit_a, self.index_a) == (unit, index) {
            Some((self.unit_b, self.index_b))
        } else if (self.unit_b, self.index_b) == (unit, index) {
            Some((self.unit_a, self.index_a))
        } else {
            None
        }
    }
}

type EndpointKey = (UnitId, usize, UnitId, usize);

fn canonical(unit_a: UnitId, index_a: usize, unit_b: UnitId, index_b: usize) -> EndpointKey {
    if (unit_a, index_a) <= (unit_b, index_b) {
        (unit_a, index_a, unit_b, index_b)
    } else {
        (unit_b, index_b, unit_a, index_a)
    }
}

/// Bonds crossing unit boundaries, queryable from either endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterUnitBonds {
    edges: Vec<InterUnitEdge>,
    edge_index: HashMap<EndpointKey, usize>,
    element_edges: HashMap<(UnitId, usize), Vec<usize>>,
    unit_pairs: BTreeMap<(UnitId, UnitId), Vec<usize>>,
}

impl InterUnitBonds {
    /// Edges are canonicalized and sorted; duplicates keep the first definition.
    pub fn new(edges: impl IntoIterator<Item = InterUnitEdge>) -> Self {
        let mut edges: Vec<InterUnitEdge> = edges
            .into_iter()
            .map(|e| {
                let (unit_a, index_a, unit_b, index_b) = canonical(e.unit_a, e.index_a, e.unit_b, e.index_b);
                InterUnitEdge {
                    unit_a,
                    index_a,
                    unit_b,
                    index_b,
                    ..e
                }
            })
            .collect();
        edges.sort_by_key(|e| (e.unit_a, e.index_a, e.unit_b, e.index_b));
        edges.dedup_by_key(|e| (e.unit_a, e.index_a, e.unit_b, e.index_b));

        let mut bonds = Self {
            edges: Vec::new(),
            ..Default::default()
        };
        for (i, e) in edges.iter().enumerate() {
            bonds
                .edge_index
                .insert((e.unit_a, e.index_a, e.unit_b, e.index_b), i);
            bonds
                .element_edges
                .entry((e.unit_a, e.index_a))
                .or_default()
                .push(i);
            bonds
                .element_edges
                .entry((e.unit_b, e.index_b))
                .or_default()
                .push(i);
            bonds
                .unit_pairs
                .entry((e.unit_a, e.unit_b))
                .or_default()
                .push(i);
        }
        bonds.edges = edges;
        bonds
    }

    pub fn edges(&self) -> &[InterUnitEdge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Index of the edge between two endpoints, in either order.
    pub fn get_bond_index(&self, unit_a: UnitId, index_a: usize, unit_b: UnitId, index_b: usize) -> Option<usize> {
        self.edge_index
            .get(&canonical(unit_a, index_a, unit_b, index_b))
            .copied()
    }

    pub fn get_bond(&self, unit_a: UnitId, index_a: usize, unit_b: UnitId, index_b: usize) -> Option<&InterUnitEdge> {
        self.get_bond_index(unit_a, index_a, unit_b, index_b)
            .map(|i| &self.edges[i])
    }

    /// Edges touching one atom, in edge order.
    pub fn edges_of(&self, unit: UnitId, index: usize) -> impl Iterator<Item = &InterUnitEdge> {
        self.element_edges
            .get(&(unit, index))
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Units sharing at least one bond with `unit`, ascending.
    pub fn bonded_units(&self, unit: UnitId) -> Vec<UnitId> {
        let mut units: Vec<UnitId> = self
            .unit_pairs
            .keys()
            .filter_map(|&(a, b)| {
                if a == unit {
                    Some(b)
                } else if b == unit {
                    Some(a)
                } else {
                    None
                }
            })
            .collect();
        units.sort_unstable();
        units.dedup();
        units
    }

    /// Edges between two units, in either order.
    pub fn unit_pair_edges(&self, unit_a: UnitId, unit_b: UnitId) -> impl Iterator<Item = &InterUnitEdge> {
        let key = if unit_a <= unit_b {
            (unit_a, unit_b)
        } else {
            (unit_b, unit_a)
        };
        self.unit_pairs
            .get(&key)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }
}

fn spheres_within(a: &Unit, b: &Unit, reach: f64) -> bool {
    let (sa, sb) = (&a.boundary().sphere, &b.boundary().sphere);
    (sa.center - sb.center).norm() <= sa.radius + sb.radius + reach
}

fn pair_edges(a: &Unit, b: &Unit, edges: &mut Vec<InterUnitEdge>) {
    if !Arc::ptr_eq(a.model(), b.model()) {
        return;
    }
    let h = &a.model().atomic_hierarchy;
    let config = &a.config().bond;
    let sphere_b = &b.boundary().sphere;
    let lookup_b = b.lookup3d();
    for (i, ei) in a.elements().iter().enumerate() {
        let p = a.position(ei);
        if (p - sphere_b.center).norm() > sphere_b.radius + config.max_bond_length {
            continue;
        }
        for (j, d2) in lookup_b.find(&p, config.max_bond_length).iter() {
            let Some(ej) = b.elements().get(j) else { continue };
            if !alt_ids_compatible(h, ei, ej) {
                continue;
            }
            if let Some(flags) = geometric_bond(
                config,
                h.atoms.type_symbol.value(ei),
                h.atoms.type_symbol.value(ej),
                d2,
            ) {
                edges.push(InterUnitEdge {
                    unit_a: a.id(),
                    index_a: i,
                    unit_b: b.id(),
                    index_b: j,
                    order: 1,
                    flags,
                });
            }
        }
    }
}

/// Bonds between spatially adjacent atomic units of the same model.
#[instrument(skip_all, name = "inter_unit_bonds")]
pub(crate) fn compute(structure: &Structure) -> InterUnitBonds {
    let units = structure.units();
    let reach = structure.config().bond.max_bond_length;
    let lookup = structure.lookup3d();
    let mut edges = Vec::new();

    for (ia, a) in units.iter().enumerate() {
        if !a.is_atomic() || a.elements().is_empty() {
            continue;
        }
        let sphere = &a.boundary().sphere;
        let candidates = lookup.find_unit_indices(&sphere.center, sphere.radius + reach);
        for &ib in &candidates.indices {
            if ib <= ia {
                continue;
            }
            let b = &units[ib];
            if !b.is_atomic() || !spheres_within(a, b, reach) {
                continue;
            }
            pair_edges(a, b, &mut edges);
        }
    }

    let bonds = InterUnitBonds::new(edges);
    debug!(edges = bonds.edge_count(), "Inter-unit bonds computed.");
    bonds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::ModelBuilder;
    use crate::core::models::entity::EntityType;
    use crate::core::models::model::Model;
    use nalgebra::Point3;

    fn edge(unit_a: UnitId, index_a: usize, unit_b: UnitId, index_b: usize) -> InterUnitEdge {
        InterUnitEdge {
            unit_a,
            index_a,
            unit_b,
            index_b,
            order: 1,
            flags: LinkFlags::COVALENT,
        }
    }

    mod lookup {
        use super::*;

        #[test]
        fn lookup_is_symmetric_in_endpoint_order() {
            let bonds = InterUnitBonds::new([edge(3, 1, 0, 4), edge(0, 2, 1, 0)]);
            assert_eq!(bonds.edge_count(), 2);
            assert_eq!(bonds.get_bond_index(3, 1, 0, 4), bonds.get_bond_index(0, 4, 3, 1));
            let e = bonds.get_bond(3, 1, 0, 4).unwrap();
            assert_eq!((e.unit_a, e.index_a, e.unit_b, e.index_b), (0, 4, 3, 1));
            assert!(bonds.get_bond(0, 4, 3, 2).is_none());
        }

        #[test]
        fn edges_are_sorted_and_deduplicated() {
            let bonds = InterUnitBonds::new([edge(1, 0, 2, 0), edge(0, 0, 1, 0), edge(2, 0, 1, 0)]);
            let keys: Vec<_> = bonds.edges().iter().map(|e| (e.unit_a, e.unit_b)).collect();
            assert_eq!(keys, vec![(0, 1), (1, 2)]);
        }

        #[test]
        fn per_atom_and_per_unit_queries() {
            let bonds = InterUnitBonds::new([edge(0, 0, 1, 0), edge(1, 0, 2, 5), edge(0, 3, 2, 1)]);
            assert_eq!(bonds.edges_of(1, 0).count(), 2);
            assert_eq!(bonds.edges_of(1, 0).next().unwrap().other(1, 0), Some((0, 0)));
            assert_eq!(bonds.bonded_units(2), vec![0, 1]);
            assert_eq!(bonds.unit_pair_edges(2, 0).count(), 1);
            assert_eq!(bonds.edges_of(7, 0).count(), 0);
        }
    }

    mod structures {
        use super::*;

        fn two_residue_chains() -> Arc<Model> {
            let mut b = ModelBuilder::new("links");
            b.add_entity("1", EntityType::Polymer)
                .add_entity("2", EntityType::NonPolymer);
            b.start_chain("A", "A", "1")
                .start_residue("CYS", 1)
                .add_atom("CA", "C", Point3::new(0.0, 0.0, 0.0))
                .add_atom("SG", "S", Point3::new(1.8, 0.0, 0.0));
            b.start_chain("B", "B", "1")
                .start_residue("CYS", 1)
                .add_atom("SG", "S", Point3::new(3.85, 0.0, 0.0))
                .add_atom("CA", "C", Point3::new(5.65, 0.0, 0.0));
            b.start_chain("C", "C", "2")
                .start_residue("ZN", 1)
                .add_atom("ZN", "Zn", Point3::new(40.0, 0.0, 0.0));
            Arc::new(b.build().unwrap())
        }

        #[test]
        fn disulfide_between_chains_is_found() {
            let s = Structure::of_model(&two_residue_chains()).unwrap();
            let links = s.links();
            assert_eq!(links.edge_count(), 1);
            let e = links.edges()[0];
            assert_eq!((e.unit_a, e.index_a, e.unit_b, e.index_b), (0, 1, 1, 0));
            assert!(e.flags.contains(LinkFlags::DISULFIDE));
            assert_eq!(links.get_bond_index(1, 0, 0, 1), Some(0));
        }

        #[test]
        fn distant_units_are_not_linked() {
            let s = Structure::of_model(&two_residue_chains()).unwrap();
            assert!(s.links().bonded_units(2).is_empty());
        }
    }
}
