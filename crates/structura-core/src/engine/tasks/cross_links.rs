use crate::core::models::cross_link::RestraintEnd;
use crate::core::models::ids::UnitId;
use crate::core::models::model::Model;
use crate::core::utils::identifiers::is_polymer_trace_atom;
use crate::engine::error::EngineError;
use crate::engine::structure::structure::Structure;
use crate::engine::structure::unit::Unit;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Endpoints of a restraint between two structure locations.
pub trait PairRestraint {
    fn unit_a(&self) -> UnitId;
    /// Position within unit A's element set.
    fn index_a(&self) -> usize;
    fn unit_b(&self) -> UnitId;
    fn index_b(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossLinkRestraint {
    pub unit_a: UnitId,
    pub index_a: usize,
    pub unit_b: UnitId,
    pub index_b: usize,
    pub restraint_type: String,
    pub distance_threshold: f64,
    pub psi: Option<f64>,
    pub sigma_1: Option<f64>,
    pub sigma_2: Option<f64>,
}

impl PairRestraint for CrossLinkRestraint {
    fn unit_a(&self) -> UnitId {
        self.unit_a
    }

    fn index_a(&self) -> usize {
        self.index_a
    }

    fn unit_b(&self) -> UnitId {
        self.unit_b
    }

    fn index_b(&self) -> usize {
        self.index_b
    }
}

impl CrossLinkRestraint {
    /// Current distance between the two restrained locations in `structure`.
    pub fn distance(&self, structure: &Structure) -> Option<f64> {
        let a = structure.unit(self.unit_a)?;
        let b = structure.unit(self.unit_b)?;
        let pa = a.position(a.elements().get(self.index_a)?);
        let pb = b.position(b.elements().get(self.index_b)?);
        Some((pa - pb).norm())
    }

    /// Whether the current distance exceeds the threshold.
    pub fn is_violated(&self, structure: &Structure) -> Option<bool> {
        self.distance(structure).map(|d| d > self.distance_threshold)
    }
}

type PairKey = (UnitId, usize, UnitId, usize);

fn pair_key(unit_a: UnitId, index_a: usize, unit_b: UnitId, index_b: usize) -> PairKey {
    if (unit_a, index_a) <= (unit_b, index_b) {
        (unit_a, index_a, unit_b, index_b)
    } else {
        (unit_b, index_b, unit_a, index_a)
    }
}

/// Restraints with a symmetric endpoint lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRestraints<T> {
    pairs: Vec<T>,
    pair_key_indices: HashMap<PairKey, Vec<usize>>,
}

impl<T> Default for PairRestraints<T> {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            pair_key_indices: HashMap::new(),
        }
    }
}

impl<T: PairRestraint> PairRestraints<T> {
    pub fn new(pairs: Vec<T>) -> Self {
        let mut pair_key_indices: HashMap<PairKey, Vec<usize>> = HashMap::new();
        for (i, p) in pairs.iter().enumerate() {
            pair_key_indices
                .entry(pair_key(p.unit_a(), p.index_a(), p.unit_b(), p.index_b()))
                .or_default()
                .push(i);
        }
        Self {
            pairs,
            pair_key_indices,
        }
    }

    pub fn count(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[T] {
        &self.pairs
    }

    /// Indices into `pairs()` of restraints between the two locations, in either order.
    pub fn get_pair_indices(&self, index_a: usize, unit_a: UnitId, index_b: usize, unit_b: UnitId) -> &[usize] {
        self.pair_key_indices
            .get(&pair_key(unit_a, index_a, unit_b, index_b))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn get_pairs(&self, index_a: usize, unit_a: UnitId, index_b: usize, unit_b: UnitId) -> impl Iterator<Item = &T> {
        self.get_pair_indices(index_a, unit_a, index_b, unit_b)
            .iter()
            .map(|&i| &self.pairs[i])
    }
}

/// A resolved restraint end: a unit and a position in its element set.
type Location = (UnitId, usize);

/// Residue and coarse-element locations of one model's units, keyed for restraint ends.
struct EndResolver<'a> {
    residues: HashMap<(&'a str, i64), Vec<(&'a Arc<Unit>, usize, usize)>>,
    coarse: HashMap<&'a str, Vec<(&'a Arc<Unit>, usize)>>,
}

impl<'a> EndResolver<'a> {
    fn new(model: &'a Model, units: impl Iterator<Item = &'a Arc<Unit>>) -> Self {
        let h = &model.atomic_hierarchy;
        let mut residues: HashMap<(&str, i64), Vec<_>> = HashMap::new();
        let mut coarse: HashMap<&str, Vec<_>> = HashMap::new();
        for unit in units {
            let elements = unit.elements().as_slice();
            match unit.coarse_elements() {
                None => {
                    for segment in h.residue_atom_segments.segments(elements) {
                        let Some(&seq_id) = h.residues.label_seq_id.present(segment.index) else {
                            continue;
                        };
                        let Some(chain) = h.chain_of_residue(segment.index) else {
                            continue;
                        };
                        residues
                            .entry((h.asym_id_of_chain(chain), seq_id))
                            .or_default()
                            .push((unit, segment.start, segment.end));
                    }
                }
                Some(c) => {
                    for (k, &e) in elements.iter().enumerate() {
                        if let Some(asym) = c.asym_id.get(e) {
                            coarse.entry(asym.as_str()).or_default().push((unit, k));
                        }
                    }
                }
            }
        }
        Self { residues, coarse }
    }

    /// Every location matching `end`: the named atom (or the trace atom, else the
    /// first atom) of the residue, falling back to coarse elements covering it.
    fn resolve(&self, model: &Model, end: &RestraintEnd) -> Vec<Location> {
        let h = &model.atomic_hierarchy;
        let mut found = Vec::new();
        if let Some(spans) = self.residues.get(&(end.asym_id.as_str(), end.seq_id)) {
            for &(unit, start, stop) in spans {
                let elements = unit.elements().as_slice();
                let span = start..stop;
                let pick = match &end.atom_id {
                    Some(name) => span.clone().find(|&k| h.atom_name(elements[k]) == name),
                    None => span
                        .clone()
                        .find(|&k| is_polymer_trace_atom(h.atom_name(elements[k])))
                        .or(Some(start)),
                };
                if let Some(k) = pick {
                    found.push((unit.id(), k));
                }
            }
        }
        if found.is_empty() {
            if let Some(beads) = self.coarse.get(end.asym_id.as_str()) {
                for &(unit, k) in beads {
                    let covers = unit
                        .coarse_elements()
                        .zip(unit.elements().get(k))
                        .is_some_and(|(c, e)| c.covers(e, end.seq_id));
                    if covers {
                        found.push((unit.id(), k));
                    }
                }
            }
        }
        found
    }
}

/// Resolves every model's cross-link restraint rows against the structure's units.
#[instrument(skip_all, name = "cross_link_restraints")]
pub(crate) fn extract(structure: &Structure) -> Result<PairRestraints<CrossLinkRestraint>, EngineError> {
    let mut pairs = Vec::new();
    for model in structure.models() {
        let table = &model.cross_link_restraints;
        if table.is_empty() {
            continue;
        }
        let resolver = EndResolver::new(
            model,
            structure
                .units()
                .iter()
                .filter(|u| Arc::ptr_eq(u.model(), model)),
        );
        for row in 0..table.len() {
            let (end_1, end_2) = table.ends(row);
            let locations_1 = resolver.resolve(model, &end_1);
            let locations_2 = resolver.resolve(model, &end_2);
            if locations_1.is_empty() || locations_2.is_empty() {
                warn!(row, "Cross-link restraint end could not be resolved.");
                continue;
            }
            let threshold = *table
                .distance_threshold
                .get(row)
                .ok_or(EngineError::Internal(format!("cross-link row {row} has no distance threshold")))?;
            for &(unit_a, index_a) in &locations_1 {
                for &(unit_b, index_b) in &locations_2 {
                    if (unit_a, index_a) == (unit_b, index_b) {
                        continue;
                    }
                    let (unit_a, index_a, unit_b, index_b) = pair_key(unit_a, index_a, unit_b, index_b);
                    pairs.push(CrossLinkRestraint {
                        unit_a,
                        index_a,
                        unit_b,
                        index_b,
                        restraint_type: table.restraint_type.value(row).clone(),
                        distance_threshold: threshold,
                        psi: table.psi.present(row).copied(),
                        sigma_1: table.sigma_1.present(row).copied(),
                        sigma_2: table.sigma_2.present(row).copied(),
                    });
                }
            }
        }
    }
    debug!(restraints = pairs.len(), "Cross-link restraints extracted.");
    Ok(PairRestraints::new(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::{CoarseRow, ModelBuilder};
    use crate::core::models::cross_link::CrossLinkRow;
    use crate::core::models::entity::EntityType;
    use nalgebra::Point3;

    fn end(asym: &str, seq: i64, atom: Option<&str>) -> RestraintEnd {
        RestraintEnd {
            asym_id: asym.to_string(),
            seq_id: seq,
            atom_id: atom.map(str::to_string),
        }
    }

    fn restrained_model() -> Arc<Model> {
        let mut b = ModelBuilder::new("xl");
        b.add_entity("1", EntityType::Polymer);
        b.start_chain("A", "A", "1")
            .start_residue("LYS", 1)
            .add_atom("N", "N", Point3::new(0.0, 0.0, 0.0))
            .add_atom("CA", "C", Point3::new(1.5, 0.0, 0.0))
            .add_atom("NZ", "N", Point3::new(3.0, 0.0, 0.0));
        b.start_chain("B", "B", "1")
            .start_residue("LYS", 7)
            .add_atom("N", "N", Point3::new(20.0, 0.0, 0.0))
            .add_atom("CA", "C", Point3::new(21.5, 0.0, 0.0));
        b.add_spheres(
            "1",
            "C",
            [CoarseRow {
                seq_id_begin: 1,
                seq_id_end: 10,
                position: Point3::new(0.0, 30.0, 0.0),
                radius: 3.0,
            }],
        );
        b.add_cross_link(CrossLinkRow {
            end_1: end("B", 7, None),
            end_2: end("A", 1, Some("NZ")),
            restraint_type: "upper bound".into(),
            distance_threshold: 25.0,
            psi: Some(0.05),
            ..Default::default()
        })
        .add_cross_link(CrossLinkRow {
            end_1: end("A", 1, None),
            end_2: end("C", 4, None),
            restraint_type: "harmonic".into(),
            distance_threshold: 20.0,
            ..Default::default()
        })
        .add_cross_link(CrossLinkRow {
            end_1: end("A", 99, None),
            end_2: end("B", 7, None),
            restraint_type: "upper bound".into(),
            distance_threshold: 20.0,
            ..Default::default()
        });
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn restraints_resolve_named_and_trace_atoms() {
        let s = Structure::of_model(&restrained_model()).unwrap();
        let restraints = s.cross_link_restraints().unwrap();
        assert_eq!(restraints.count(), 2);
        let first = &restraints.pairs()[0];
        assert_eq!((first.unit_a, first.index_a, first.unit_b, first.index_b), (0, 2, 1, 1));
        assert_eq!(first.psi, Some(0.05));
        assert!((first.distance(&s).unwrap() - 18.5).abs() < 1e-9);
        assert_eq!(first.is_violated(&s), Some(false));
    }

    #[test]
    fn coarse_ends_match_by_sequence_range() {
        let s = Structure::of_model(&restrained_model()).unwrap();
        let second = &s.cross_link_restraints().unwrap().pairs()[1];
        assert_eq!((second.unit_a, second.index_a), (0, 1));
        assert_eq!((second.unit_b, second.index_b), (2, 0));
        assert_eq!(second.restraint_type, "harmonic");
    }

    #[test]
    fn pair_lookup_is_symmetric() {
        let s = Structure::of_model(&restrained_model()).unwrap();
        let restraints = s.cross_link_restraints().unwrap();
        assert_eq!(restraints.get_pair_indices(2, 0, 1, 1), &[0]);
        assert_eq!(restraints.get_pair_indices(1, 1, 2, 0), &[0]);
        assert_eq!(restraints.get_pairs(0, 2, 1, 0).count(), 1);
        assert!(restraints.get_pair_indices(0, 0, 0, 1).is_empty());
    }

    #[test]
    fn models_without_restraints_give_empty_set() {
        let mut b = ModelBuilder::new("plain");
        b.add_entity("1", EntityType::Polymer);
        b.start_chain("A", "A", "1")
            .start_residue("ALA", 1)
            .add_atom("CA", "C", Point3::origin());
        let s = Structure::of_model(&Arc::new(b.build().unwrap())).unwrap();
        assert!(s.cross_link_restraints().unwrap().is_empty());
    }
}
