use crate::core::models::ModelError;
use crate::core::models::ids::{ElementIndex, ResidueIndex, UnitId};
use crate::core::utils::geometry::{centroid, ring_normal};
use crate::core::utils::saccharides::{SaccharideComponent, saccharide_component};
use crate::engine::error::EngineError;
use crate::engine::structure::structure::Structure;
use crate::engine::structure::unit::Unit;
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument};

const ALDOSE_RINGS: [&[&str]; 2] = [
    &["C1", "C2", "C3", "C4", "C5", "O5"],
    &["C1", "C2", "C3", "C4", "O4"],
];
const KETOSE_RINGS: [&[&str]; 2] = [
    &["C2", "C3", "C4", "C5", "C6", "O6"],
    &["C2", "C3", "C4", "C5", "O5"],
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbohydrateGeometry {
    pub center: Point3<f64>,
    pub normal: Vector3<f64>,
    /// From the ring center toward the anomeric carbon.
    pub direction: Vector3<f64>,
}

/// A monosaccharide ring found in one residue of one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CarbohydrateElement {
    pub unit: UnitId,
    pub residue_index: ResidueIndex,
    pub anomeric_carbon: ElementIndex,
    /// Model element indices, starting at the anomeric carbon.
    pub ring_atoms: Vec<ElementIndex>,
    pub component: &'static SaccharideComponent,
    pub geometry: CarbohydrateGeometry,
}

/// Bond between two carbohydrate elements, `carbohydrate_a < carbohydrate_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CarbohydrateLink {
    pub carbohydrate_a: usize,
    pub carbohydrate_b: usize,
}

/// Bond from a carbohydrate element to an atom of a non-carbohydrate residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CarbohydrateTerminalLink {
    pub carbohydrate: usize,
    pub unit: UnitId,
    pub element: ElementIndex,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Carbohydrates {
    elements: Vec<CarbohydrateElement>,
    links: Vec<CarbohydrateLink>,
    terminal_links: Vec<CarbohydrateTerminalLink>,
    link_adjacency: Vec<Vec<usize>>,
    element_index: HashMap<(UnitId, ElementIndex), usize>,
    anomeric_carbons: HashMap<(UnitId, ResidueIndex), ElementIndex>,
}

impl Carbohydrates {
    pub fn elements(&self) -> &[CarbohydrateElement] {
        &self.elements
    }

    pub fn links(&self) -> &[CarbohydrateLink] {
        &self.links
    }

    pub fn terminal_links(&self) -> &[CarbohydrateTerminalLink] {
        &self.terminal_links
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Carbohydrate element whose anomeric carbon is `anomeric_carbon` in `unit`.
    pub fn get_element_index(&self, unit: UnitId, anomeric_carbon: ElementIndex) -> Option<usize> {
        self.element_index.get(&(unit, anomeric_carbon)).copied()
    }

    pub fn get_anomeric_carbon(&self, unit: UnitId, residue: ResidueIndex) -> Option<ElementIndex> {
        self.anomeric_carbons.get(&(unit, residue)).copied()
    }

    /// Links touching carbohydrate element `index`, ascending.
    pub fn links_of(&self, index: usize) -> impl Iterator<Item = &CarbohydrateLink> {
        self.link_adjacency
            .get(index)
            .into_iter()
            .flatten()
            .map(|&l| &self.links[l])
    }
}

/// First ring pattern whose atoms are all present, in pattern order.
fn find_ring(names: &HashMap<&str, ElementIndex>, component: &SaccharideComponent) -> Option<Vec<ElementIndex>> {
    let patterns = if component.is_ketose {
        &KETOSE_RINGS
    } else {
        &ALDOSE_RINGS
    };
    patterns
        .iter()
        .find_map(|pattern| pattern.iter().map(|n| names.get(n).copied()).collect())
}

fn ring_geometry(unit: &Unit, ring: &[ElementIndex]) -> CarbohydrateGeometry {
    let points: Vec<Point3<f64>> = ring.iter().map(|&e| unit.position(e)).collect();
    let center = centroid(&points).unwrap_or_else(Point3::origin);
    let normal = ring_normal(&points).unwrap_or_else(Vector3::z);
    let direction = points
        .first()
        .and_then(|p| (p - center).try_normalize(f64::EPSILON))
        .unwrap_or_else(Vector3::x);
    CarbohydrateGeometry {
        center,
        normal,
        direction,
    }
}

/// Residue span of a found carbohydrate, as positions in its unit's element set.
struct ResidueSpan {
    start: usize,
    end: usize,
}

/// Finds monosaccharide rings in atomic units and links them through intra- and
/// inter-unit bonds. Cycles in the link graph are kept as found.
#[instrument(skip_all, name = "carbohydrates")]
pub(crate) fn compute(structure: &Structure) -> Result<Carbohydrates, EngineError> {
    let mut carbs = Carbohydrates::default();
    let mut spans = Vec::new();
    let mut by_residue: HashMap<(UnitId, ResidueIndex), usize> = HashMap::new();

    for unit in structure.units().iter().filter(|u| u.is_atomic()) {
        let h = &unit.model().atomic_hierarchy;
        let elements = unit.elements().as_slice();
        for segment in h.residue_atom_segments.segments(elements) {
            let residue = segment.index;
            let comp_id = h
                .residues
                .label_comp_id
                .get(residue)
                .ok_or(ModelError::IndexOutOfRange {
                    index: residue,
                    len: h.residue_count(),
                })?;
            let Some(component) = saccharide_component(comp_id) else {
                continue;
            };
            let names: HashMap<&str, ElementIndex> = elements[segment.start..segment.end]
                .iter()
                .map(|&e| (h.atom_name(e), e))
                .collect();
            let Some(ring) = find_ring(&names, component) else {
                debug!(comp_id = %comp_id, residue, "Saccharide ring atoms incomplete; residue skipped.");
                continue;
            };

            let index = carbs.elements.len();
            let anomeric_carbon = ring[0];
            carbs.element_index.insert((unit.id(), anomeric_carbon), index);
            carbs.anomeric_carbons.insert((unit.id(), residue), anomeric_carbon);
            by_residue.insert((unit.id(), residue), index);
            spans.push(ResidueSpan {
                start: segment.start,
                end: segment.end,
            });
            carbs.elements.push(CarbohydrateElement {
                unit: unit.id(),
                residue_index: residue,
                anomeric_carbon,
                geometry: ring_geometry(unit, &ring),
                ring_atoms: ring,
                component,
            });
        }
    }

    let mut links: BTreeSet<CarbohydrateLink> = BTreeSet::new();
    let mut terminal: BTreeSet<CarbohydrateTerminalLink> = BTreeSet::new();
    let mut connect = |a: usize, other: Option<usize>, unit: UnitId, element: ElementIndex| match other {
        Some(b) if b != a => {
            links.insert(CarbohydrateLink {
                carbohydrate_a: a.min(b),
                carbohydrate_b: a.max(b),
            });
        }
        Some(_) => {}
        None => {
            terminal.insert(CarbohydrateTerminalLink {
                carbohydrate: a,
                unit,
                element,
            });
        }
    };

    for (index, carb) in carbs.elements.iter().enumerate() {
        let Some(unit) = structure.unit(carb.unit) else {
            continue;
        };
        let h = &unit.model().atomic_hierarchy;
        let bonds = unit.bonds();
        let span = &spans[index];
        for k in span.start..span.end {
            for (j, _, _) in bonds.neighbors(k) {
                if (span.start..span.end).contains(&j) {
                    continue;
                }
                let Some(e) = unit.elements().get(j) else { continue };
                let other = h
                    .residue_index(e)
                    .and_then(|r| by_residue.get(&(unit.id(), r)).copied());
                connect(index, other, unit.id(), e);
            }
        }
    }

    let locate = |unit_id: UnitId, k: usize| -> Option<(ElementIndex, Option<usize>)> {
        let unit = structure.unit(unit_id)?;
        let e = unit.elements().get(k)?;
        let carb = unit
            .residue_index(e)
            .and_then(|r| by_residue.get(&(unit_id, r)).copied());
        Some((e, carb))
    };
    for edge in structure.links().edges() {
        let (Some((ea, ca)), Some((eb, cb))) = (
            locate(edge.unit_a, edge.index_a),
            locate(edge.unit_b, edge.index_b),
        ) else {
            continue;
        };
        match (ca, cb) {
            (Some(a), other) => connect(a, other, edge.unit_b, eb),
            (None, Some(b)) => connect(b, None, edge.unit_a, ea),
            (None, None) => {}
        }
    }

    carbs.links = links.into_iter().collect();
    carbs.terminal_links = terminal.into_iter().collect();
    carbs.link_adjacency = vec![Vec::new(); carbs.elements.len()];
    for (l, link) in carbs.links.iter().enumerate() {
        carbs.link_adjacency[link.carbohydrate_a].push(l);
        carbs.link_adjacency[link.carbohydrate_b].push(l);
    }

    debug!(
        elements = carbs.elements.len(),
        links = carbs.links.len(),
        terminal_links = carbs.terminal_links.len(),
        "Carbohydrates computed."
    );
    Ok(carbs)
}
