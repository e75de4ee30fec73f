use super::element::{ElementLocations, ElementSet, StructureElement};
use super::lookup::StructureLookup3D;
use super::partition::partition_model;
use super::unit::{Unit, UnitKind};
use crate::core::models::ids::{EntityIndex, ResidueIndex, UnitId};
use crate::core::models::model::Model;
use crate::core::models::operator::SymmetryOperator;
use crate::core::spatial::boundary::Boundary;
use crate::core::utils::hash::{hash_string, hash1};
use crate::engine::config::StructureConfig;
use crate::engine::error::EngineError;
use crate::engine::tasks::carbohydrates::{self, Carbohydrates};
use crate::engine::tasks::cross_links::{self, CrossLinkRestraint, PairRestraints};
use crate::engine::tasks::inter_unit_bonds::{self, InterUnitBonds};
use crate::engine::tasks::symmetry::{self, SymmetryGroup};
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Write-once slots for derived properties. Never invalidated; a changed
/// structure is a new instance.
#[derive(Default)]
struct StructureCache {
    lookup3d: OnceLock<StructureLookup3D>,
    links: OnceLock<InterUnitBonds>,
    cross_link_restraints: OnceLock<PairRestraints<CrossLinkRestraint>>,
    unit_symmetry_groups: OnceLock<Vec<SymmetryGroup>>,
    carbohydrates: OnceLock<Carbohydrates>,
    models: OnceLock<Vec<Arc<Model>>>,
    hash_code: OnceLock<i32>,
}

/// Fills `slot` from a fallible computation. Errors leave the slot empty so the
/// next access retries.
fn get_or_try_init<T>(
    slot: &OnceLock<T>,
    compute: impl FnOnce() -> Result<T, EngineError>,
) -> Result<&T, EngineError> {
    if let Some(value) = slot.get() {
        return Ok(value);
    }
    let value = compute()?;
    Ok(slot.get_or_init(|| value))
}

/// An immutable set of units, sorted by unit id.
pub struct Structure {
    units: Vec<Arc<Unit>>,
    unit_map: HashMap<UnitId, usize>,
    element_count: usize,
    polymer_residue_count: usize,
    config: Arc<StructureConfig>,
    cache: StructureCache,
}

impl fmt::Debug for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure")
            .field("units", &self.units)
            .field("element_count", &self.element_count)
            .finish()
    }
}

impl Default for Structure {
    fn default() -> Self {
        Self::assemble(Vec::new(), Arc::new(StructureConfig::default()))
    }
}

impl Structure {
    /// Builds a structure from units in any order. Unit ids must be unique.
    pub fn create(units: Vec<Arc<Unit>>) -> Result<Self, EngineError> {
        let config = units
            .first()
            .map(|u| u.config().clone())
            .unwrap_or_default();
        let mut units = units;
        units.sort_by_key(|u| u.id());
        if let Some(w) = units.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(EngineError::DuplicateUnit { id: w[0].id() });
        }
        Ok(Self::assemble(units, config))
    }

    /// `units` must already be sorted with unique ids.
    fn assemble(units: Vec<Arc<Unit>>, config: Arc<StructureConfig>) -> Self {
        let unit_map = units.iter().enumerate().map(|(i, u)| (u.id(), i)).collect();
        let element_count = units.iter().map(|u| u.elements().len()).sum();
        let polymer_residue_count = units.iter().map(|u| u.polymer_elements().len()).sum();
        Self {
            units,
            unit_map,
            element_count,
            polymer_residue_count,
            config,
            cache: StructureCache::default(),
        }
    }

    /// Partitions a model into units using the default configuration.
    pub fn of_model(model: &Arc<Model>) -> Result<Self, EngineError> {
        Self::of_model_with_config(model, StructureConfig::default())
    }

    pub fn of_model_with_config(
        model: &Arc<Model>,
        config: StructureConfig,
    ) -> Result<Self, EngineError> {
        let mut builder = StructureBuilder::with_config(config);
        partition_model(&mut builder, model)?;
        Ok(builder.into_structure())
    }

    pub fn units(&self) -> &[Arc<Unit>] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Arc<Unit>> {
        self.unit_map.get(&id).map(|&i| &self.units[i])
    }

    /// Position of the unit with `id` in `units()`.
    pub fn unit_index(&self, id: UnitId) -> Option<usize> {
        self.unit_map.get(&id).copied()
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    #[inline]
    pub fn polymer_residue_count(&self) -> usize {
        self.polymer_residue_count
    }

    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    pub fn config(&self) -> &Arc<StructureConfig> {
        &self.config
    }

    /// Fewer than two elements per polymer residue.
    pub fn is_coarse(&self) -> bool {
        let ec = self.element_count;
        let prc = self.polymer_residue_count;
        prc != 0 && ec != 0 && (ec as f64) / (prc as f64) < 2.0
    }

    pub fn has_element(&self, location: &StructureElement<'_>) -> bool {
        self.unit(location.unit.id())
            .is_some_and(|u| u.elements().has(location.element))
    }

    /// A fresh iterator over every location, ascending by unit id then element.
    pub fn element_locations(&self) -> ElementLocations<'_> {
        ElementLocations::new(&self.units)
    }

    pub fn hash_code(&self) -> i32 {
        *self.cache.hash_code.get_or_init(|| {
            let mut hash: i32 = 23;
            for u in &self.units {
                hash = hash.wrapping_mul(31).wrapping_add(u.id() as i32);
                hash = hash.wrapping_mul(31).wrapping_add(u.elements().hash_code());
            }
            hash = hash.wrapping_mul(31).wrapping_add(self.element_count as i32);
            match hash1(hash) {
                -1 => 0,
                h => h,
            }
        })
    }

    /// Same unit ids in the same order with equal element sets.
    pub fn are_equal(a: &Structure, b: &Structure) -> bool {
        a.element_count == b.element_count
            && a.units.len() == b.units.len()
            && a.units.iter().zip(&b.units).all(|(x, y)| x.id() == y.id())
            && a.units
                .iter()
                .zip(&b.units)
                .all(|(x, y)| x.elements() == y.elements())
    }

    /// String hash of the units' conformation ids joined by `|`.
    pub fn conformation_hash(&self) -> i32 {
        let ids: Vec<String> = self
            .units
            .iter()
            .map(|u| u.conformation_id().to_string())
            .collect();
        hash_string(&ids.join("|"))
    }

    pub fn lookup3d(&self) -> &StructureLookup3D {
        self.cache
            .lookup3d
            .get_or_init(|| StructureLookup3D::new(self))
    }

    pub fn boundary(&self) -> &Boundary {
        self.lookup3d().boundary()
    }

    /// Bonds between atoms of different units.
    pub fn links(&self) -> &InterUnitBonds {
        self.cache
            .links
            .get_or_init(|| inter_unit_bonds::compute(self))
    }

    pub fn cross_link_restraints(&self) -> Result<&PairRestraints<CrossLinkRestraint>, EngineError> {
        get_or_try_init(&self.cache.cross_link_restraints, || {
            cross_links::extract(self)
        })
    }

    /// Units grouped by invariant id, in order of first appearance.
    pub fn unit_symmetry_groups(&self) -> &[SymmetryGroup] {
        self.cache
            .unit_symmetry_groups
            .get_or_init(|| symmetry::compute_transform_groups(self))
    }

    pub fn carbohydrates(&self) -> Result<&Carbohydrates, EngineError> {
        get_or_try_init(&self.cache.carbohydrates, || carbohydrates::compute(self))
    }

    /// Distinct models referenced by the units, in unit order.
    pub fn models(&self) -> &[Arc<Model>] {
        self.cache.models.get_or_init(|| {
            let mut seen = HashSet::new();
            self.units
                .iter()
                .filter(|u| seen.insert(u.model().id()))
                .map(|u| u.model().clone())
                .collect()
        })
    }

    /// Entity indices touched by the structure, one probe per chain segment.
    pub fn entity_keys(&self) -> Vec<EntityIndex> {
        let mut keys = Vec::new();
        for unit in &self.units {
            let elements = unit.elements().as_slice();
            let model = unit.model();
            match unit.coarse_elements() {
                None => {
                    let h = &model.atomic_hierarchy;
                    for segment in h.chain_atom_segments.segments(elements) {
                        keys.extend(h.entity_of_chain(segment.index));
                    }
                }
                Some(coarse) => {
                    for segment in coarse.chain_element_segments.segments(elements) {
                        keys.extend(coarse.entity_index.get(elements[segment.start]).copied().flatten());
                    }
                }
            }
        }
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Residues of `model` covered by the first unit of each symmetry group.
    pub fn unique_atomic_residue_indices(&self, model: &Model) -> Vec<ResidueIndex> {
        let mut residues = Vec::new();
        for group in self.unit_symmetry_groups() {
            let Some(unit) = group.units.first() else {
                continue;
            };
            if unit.kind() != UnitKind::Atomic || unit.model().id() != model.id() {
                continue;
            }
            let segments = &unit.model().atomic_hierarchy.residue_atom_segments;
            residues.extend(segments.segments(unit.elements().as_slice()).map(|s| s.index));
        }
        residues.sort_unstable();
        residues.dedup();
        residues
    }

    /// Smallest surface gap between a sphere at `point` and any element.
    /// `f64::MAX` for an empty structure.
    pub fn min_distance_to_point(&self, point: &Point3<f64>, radius: f64) -> f64 {
        let mut min = f64::MAX;
        for unit in &self.units {
            for e in unit.elements().iter() {
                let d = (unit.position(e) - point).norm() - radius - unit.radius(e);
                if d < min {
                    min = d;
                }
            }
        }
        min
    }

    /// Smallest surface gap between elements of `a` and `b`; 0 if either is empty.
    pub fn distance(a: &Structure, b: &Structure) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let mut min = f64::MAX;
        for unit in &a.units {
            for e in unit.elements().iter() {
                let d = b.min_distance_to_point(&unit.position(e), unit.radius(e));
                if d < min {
                    min = d;
                }
            }
        }
        min
    }
}

/// Accumulates units, assigning ids in insertion order.
pub struct StructureBuilder {
    config: Arc<StructureConfig>,
    units: Vec<Arc<Unit>>,
    next_invariant_id: u32,
}

impl Default for StructureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::with_config(StructureConfig::default())
    }

    pub fn with_config(config: StructureConfig) -> Self {
        Self {
            config: Arc::new(config),
            units: Vec::new(),
            next_invariant_id: 0,
        }
    }

    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn next_id(&self) -> UnitId {
        self.units.len() as UnitId
    }

    /// Adds a unit with a fresh id and a fresh invariant id.
    pub fn add_unit(
        &mut self,
        kind: UnitKind,
        model: &Arc<Model>,
        operator: SymmetryOperator,
        elements: ElementSet,
    ) -> Result<&Arc<Unit>, EngineError> {
        let unit = Unit::create(
            self.next_id(),
            self.next_invariant_id,
            kind,
            model.clone(),
            operator,
            elements,
            self.config.clone(),
        )?;
        self.next_invariant_id += 1;
        self.units.push(Arc::new(unit));
        Ok(&self.units[self.units.len() - 1])
    }

    /// Adds a copy of `unit` under `operator`, keeping its invariant id.
    pub fn add_with_operator(&mut self, unit: &Unit, operator: &SymmetryOperator) -> &Arc<Unit> {
        let copy = unit.apply_operator(self.next_id(), operator);
        self.units.push(Arc::new(copy));
        &self.units[self.units.len() - 1]
    }

    pub fn into_structure(self) -> Structure {
        Structure::assemble(self.units, self.config)
    }
}
