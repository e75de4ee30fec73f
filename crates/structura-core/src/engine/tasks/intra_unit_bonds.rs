use crate::core::models::component_bond::LinkFlags;
use crate::core::models::hierarchy::AtomicHierarchy;
use crate::core::models::ids::ElementIndex;
use crate::core::utils::identifiers::{covalent_radius, is_hydrogen, is_metal, is_sulfur};
use crate::engine::config::BondConfig;
use crate::engine::structure::unit::Unit;
use tracing::trace;

/// Flags of a bond inferred from the distance between two atoms, or `None` when
/// the pair is not bonded.
pub(crate) fn geometric_bond(
    config: &BondConfig,
    symbol_a: &str,
    symbol_b: &str,
    squared_distance: f64,
) -> Option<LinkFlags> {
    if is_hydrogen(symbol_a) && is_hydrogen(symbol_b) {
        return None;
    }
    let threshold = ((covalent_radius(symbol_a) + covalent_radius(symbol_b)) * config.covalent_tolerance)
        .min(config.max_bond_length);
    let d = squared_distance.sqrt();
    if d < config.min_bond_length || d > threshold {
        return None;
    }
    Some(if is_sulfur(symbol_a) && is_sulfur(symbol_b) {
        LinkFlags::COVALENT | LinkFlags::DISULFIDE
    } else if is_metal(symbol_a) || is_metal(symbol_b) {
        LinkFlags::METALLIC_COORDINATION
    } else {
        LinkFlags::COVALENT
    })
}

/// Atoms in different alternate conformations never bond.
pub(crate) fn alt_ids_compatible(h: &AtomicHierarchy, a: ElementIndex, b: ElementIndex) -> bool {
    match (h.atoms.label_alt_id.present(a), h.atoms.label_alt_id.present(b)) {
        (Some(x), Some(y)) if !x.is_empty() && !y.is_empty() => x == y,
        _ => true,
    }
}

/// Bond graph of one unit in compressed adjacency form. Vertices are positions
/// within the unit's element set; every edge is stored in both directions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntraUnitBonds {
    offset: Vec<usize>,
    b: Vec<usize>,
    order: Vec<u8>,
    flags: Vec<LinkFlags>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntraUnitEdge {
    pub a: usize,
    pub b: usize,
    pub order: u8,
    pub flags: LinkFlags,
}

impl IntraUnitBonds {
    /// Builds the adjacency over `vertex_count` vertices from undirected edges with `a < b`.
    pub fn from_edges(vertex_count: usize, edges: &[IntraUnitEdge]) -> Self {
        let mut degree = vec![0usize; vertex_count + 1];
        for e in edges {
            degree[e.a] += 1;
            degree[e.b] += 1;
        }
        let mut offset = Vec::with_capacity(vertex_count + 1);
        let mut running = 0;
        for d in degree.iter().take(vertex_count) {
            offset.push(running);
            running += d;
        }
        offset.push(running);

        let mut fill = offset.clone();
        let mut b = vec![0usize; running];
        let mut order = vec![0u8; running];
        let mut flags = vec![LinkFlags::NONE; running];
        for e in edges {
            for (from, to) in [(e.a, e.b), (e.b, e.a)] {
                let slot = fill[from];
                b[slot] = to;
                order[slot] = e.order;
                flags[slot] = e.flags;
                fill[from] += 1;
            }
        }

        let mut bonds = Self {
            offset,
            b,
            order,
            flags,
        };
        bonds.sort_neighbors();
        bonds
    }

    fn sort_neighbors(&mut self) {
        for v in 0..self.offset.len().saturating_sub(1) {
            let range = self.offset[v]..self.offset[v + 1];
            let mut slots: Vec<(usize, u8, LinkFlags)> = range
                .clone()
                .map(|i| (self.b[i], self.order[i], self.flags[i]))
                .collect();
            slots.sort_unstable_by_key(|s| s.0);
            for (i, (b, order, flags)) in range.zip(slots) {
                self.b[i] = b;
                self.order[i] = order;
                self.flags[i] = flags;
            }
        }
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.b.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }

    /// Neighbors of vertex `a` as `(b, order, flags)`, ascending by `b`.
    pub fn neighbors(&self, a: usize) -> impl Iterator<Item = (usize, u8, LinkFlags)> + '_ {
        let range = match (self.offset.get(a), self.offset.get(a + 1)) {
            (Some(&s), Some(&e)) => s..e,
            _ => 0..0,
        };
        range.map(|i| (self.b[i], self.order[i], self.flags[i]))
    }

    /// Directed slot of the edge `a -> b`.
    pub fn get_edge_index(&self, a: usize, b: usize) -> Option<usize> {
        let start = *self.offset.get(a)?;
        let end = *self.offset.get(a + 1)?;
        self.b[start..end].binary_search(&b).ok().map(|i| start + i)
    }

    pub fn order(&self, slot: usize) -> Option<u8> {
        self.order.get(slot).copied()
    }

    pub fn flags(&self, slot: usize) -> Option<LinkFlags> {
        self.flags.get(slot).copied()
    }
}

/// Bonds within an atomic unit. Residues whose component has a bond definition use
/// it exclusively; every other pair falls back to distance criteria.
pub(crate) fn compute(unit: &Unit) -> IntraUnitBonds {
    let n = unit.elements().len();
    if !unit.is_atomic() || n == 0 {
        return IntraUnitBonds::from_edges(n, &[]);
    }

    let model = unit.model();
    let h = &model.atomic_hierarchy;
    let component_bonds = model.component_bonds();
    let config = &unit.config().bond;
    let lookup = unit.lookup3d();
    let elements = unit.elements();

    let mut edges = Vec::new();
    for i in 0..n {
        let Some(ei) = elements.get(i) else { continue };
        let ri = h.residue_index(ei);
        let entry = ri
            .and_then(|r| component_bonds.and_then(|cb| cb.entry(h.comp_id_of_residue(r))));
        let hits = lookup.find(&unit.position(ei), config.max_bond_length);
        for (j, d2) in hits.iter() {
            if j <= i {
                continue;
            }
            let Some(ej) = elements.get(j) else { continue };
            if let Some(entry) = entry.filter(|_| h.residue_index(ej) == ri) {
                if let Some(info) = entry.get(h.atom_name(ei), h.atom_name(ej)) {
                    edges.push(IntraUnitEdge {
                        a: i,
                        b: j,
                        order: info.order,
                        flags: info.flags,
                    });
                }
                continue;
            }
            if !alt_ids_compatible(h, ei, ej) {
                continue;
            }
            if let Some(flags) = geometric_bond(
                config,
                h.atoms.type_symbol.value(ei),
                h.atoms.type_symbol.value(ej),
                d2,
            ) {
                edges.push(IntraUnitEdge {
                    a: i,
                    b: j,
                    order: 1,
                    flags,
                });
            }
        }
    }
    trace!(unit = unit.id(), edges = edges.len(), "Intra-unit bonds computed.");
    IntraUnitBonds::from_edges(n, &edges)
}
