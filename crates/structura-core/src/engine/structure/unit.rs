use super::element::ElementSet;
use crate::core::models::ModelError;
use crate::core::models::conformation::Conformation;
use crate::core::models::entity::EntityType;
use crate::core::models::hierarchy::CoarseElements;
use crate::core::models::ids::{ConformationId, ElementIndex, ResidueIndex, UnitId};
use crate::core::models::model::Model;
use crate::core::models::operator::SymmetryOperator;
use crate::core::spatial::boundary::Boundary;
use crate::core::spatial::grid::{GridLookup3D, PositionData};
use crate::core::utils::identifiers::is_polymer_trace_atom;
use crate::engine::config::StructureConfig;
use crate::engine::error::EngineError;
use crate::engine::tasks::intra_unit_bonds::{self, IntraUnitBonds};
use nalgebra::{Point3, Vector3};
use std::fmt;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Atomic,
    Spheres,
    Gaussians,
}

/// A rigid group of elements of one model sharing one symmetry operator.
pub struct Unit {
    id: UnitId,
    invariant_id: u32,
    kind: UnitKind,
    model: Arc<Model>,
    operator: SymmetryOperator,
    elements: ElementSet,
    polymer_elements: ElementSet,
    config: Arc<StructureConfig>,
    lookup3d: OnceLock<GridLookup3D>,
    bonds: OnceLock<IntraUnitBonds>,
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("id", &self.id)
            .field("invariant_id", &self.invariant_id)
            .field("kind", &self.kind)
            .field("model", &self.model.id())
            .field("operator", &self.operator.name)
            .field("elements", &self.elements.len())
            .finish()
    }
}

/// Element count of the model table backing a unit kind.
fn element_count(model: &Model, kind: UnitKind) -> usize {
    match kind {
        UnitKind::Atomic => model.atomic_hierarchy.atom_count(),
        UnitKind::Spheres => model.coarse_hierarchy.spheres.count(),
        UnitKind::Gaussians => model.coarse_hierarchy.gaussians.count(),
    }
}

fn conformation_of(model: &Model, kind: UnitKind) -> &Conformation {
    match kind {
        UnitKind::Atomic => &model.atomic_conformation,
        UnitKind::Spheres => &model.coarse_conformations.spheres,
        UnitKind::Gaussians => &model.coarse_conformations.gaussians,
    }
}

fn coarse_elements_of(model: &Model, kind: UnitKind) -> Option<&CoarseElements> {
    match kind {
        UnitKind::Atomic => None,
        UnitKind::Spheres => Some(&model.coarse_hierarchy.spheres),
        UnitKind::Gaussians => Some(&model.coarse_hierarchy.gaussians),
    }
}

/// One trace atom per polymer residue, or every coarse element of a polymer entity.
fn polymer_elements(model: &Model, kind: UnitKind, elements: &ElementSet) -> ElementSet {
    let mut polymer = Vec::new();
    match coarse_elements_of(model, kind) {
        None => {
            let h = &model.atomic_hierarchy;
            let slice = elements.as_slice();
            for segment in h.residue_atom_segments.segments(slice) {
                let is_polymer = h
                    .chain_index(slice[segment.start])
                    .and_then(|c| h.entity_of_chain(c))
                    .is_some_and(|e| model.entities.type_of(e) == EntityType::Polymer);
                if !is_polymer {
                    continue;
                }
                if let Some(&trace) = slice[segment.start..segment.end]
                    .iter()
                    .find(|&&e| is_polymer_trace_atom(h.atom_name(e)))
                {
                    polymer.push(trace);
                }
            }
        }
        Some(coarse) => {
            polymer.extend(elements.iter().filter(|&e| {
                coarse
                    .entity_index
                    .get(e)
                    .copied()
                    .flatten()
                    .is_some_and(|i| model.entities.type_of(i) == EntityType::Polymer)
            }));
        }
    }
    ElementSet::of_unsorted(polymer)
}

impl Unit {
    pub fn create(
        id: UnitId,
        invariant_id: u32,
        kind: UnitKind,
        model: Arc<Model>,
        operator: SymmetryOperator,
        elements: ElementSet,
        config: Arc<StructureConfig>,
    ) -> Result<Self, EngineError> {
        let len = element_count(&model, kind);
        if let Some(last) = elements.last().filter(|&last| last >= len) {
            return Err(ModelError::IndexOutOfRange { index: last, len }.into());
        }
        let polymer_elements = polymer_elements(&model, kind, &elements);
        Ok(Self {
            id,
            invariant_id,
            kind,
            model,
            operator,
            elements,
            polymer_elements,
            config,
            lookup3d: OnceLock::new(),
            bonds: OnceLock::new(),
        })
    }

    /// A copy under `operator` applied after this unit's own operator, sharing element
    /// sets and invariant id.
    pub fn apply_operator(&self, id: UnitId, operator: &SymmetryOperator) -> Self {
        Self {
            id,
            invariant_id: self.invariant_id,
            kind: self.kind,
            model: self.model.clone(),
            operator: SymmetryOperator::compose(&self.operator, operator),
            elements: self.elements.clone(),
            polymer_elements: self.polymer_elements.clone(),
            config: self.config.clone(),
            lookup3d: OnceLock::new(),
            bonds: self.bonds.clone(),
        }
    }

    #[inline]
    pub fn id(&self) -> UnitId {
        self.id
    }

    #[inline]
    pub fn invariant_id(&self) -> u32 {
        self.invariant_id
    }

    #[inline]
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn is_atomic(&self) -> bool {
        self.kind == UnitKind::Atomic
    }

    pub fn is_coarse(&self) -> bool {
        self.kind != UnitKind::Atomic
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn operator(&self) -> &SymmetryOperator {
        &self.operator
    }

    pub fn elements(&self) -> &ElementSet {
        &self.elements
    }

    pub fn polymer_elements(&self) -> &ElementSet {
        &self.polymer_elements
    }

    pub fn config(&self) -> &Arc<StructureConfig> {
        &self.config
    }

    pub fn conformation(&self) -> &Conformation {
        conformation_of(&self.model, self.kind)
    }

    pub fn conformation_id(&self) -> ConformationId {
        self.conformation().id()
    }

    pub fn coarse_elements(&self) -> Option<&CoarseElements> {
        coarse_elements_of(&self.model, self.kind)
    }

    /// Position of a model element with this unit's operator applied.
    #[inline]
    pub fn position(&self, element: ElementIndex) -> Point3<f64> {
        self.operator.apply(&self.conformation().position(element))
    }

    #[inline]
    pub fn radius(&self, element: ElementIndex) -> f64 {
        self.conformation().radius(element)
    }

    /// Residue of an atomic element; `None` for coarse units.
    pub fn residue_index(&self, element: ElementIndex) -> Option<ResidueIndex> {
        match self.kind {
            UnitKind::Atomic => self.model.atomic_hierarchy.residue_index(element),
            _ => None,
        }
    }

    /// `label_asym_id` of the unit's first element.
    pub fn asym_id(&self) -> &str {
        let Some(first) = self.elements.first() else {
            return "";
        };
        match self.coarse_elements() {
            None => {
                let h = &self.model.atomic_hierarchy;
                h.chain_index(first)
                    .map_or("", |c| h.asym_id_of_chain(c))
            }
            Some(coarse) => coarse.asym_id.get(first).map_or("", String::as_str),
        }
    }

    /// Grid over the unit's transformed positions; hits are positions within `elements()`.
    pub fn lookup3d(&self) -> &GridLookup3D {
        self.lookup3d.get_or_init(|| {
            let n = self.elements.len();
            let mut x = Vec::with_capacity(n);
            let mut y = Vec::with_capacity(n);
            let mut z = Vec::with_capacity(n);
            for e in self.elements.iter() {
                let p = self.position(e);
                x.push(p.x);
                y.push(p.y);
                z.push(p.z);
            }
            let radius: Option<Vec<f64>> = self
                .is_coarse()
                .then(|| self.elements.iter().map(|e| self.radius(e)).collect());
            let indices: Vec<usize> = (0..n).collect();
            GridLookup3D::new(
                PositionData {
                    x: &x,
                    y: &y,
                    z: &z,
                    indices: &indices,
                    radius: radius.as_deref(),
                },
                Vector3::repeat(self.config.unit_lookup_cell_size),
            )
        })
    }

    pub fn boundary(&self) -> &Boundary {
        self.lookup3d().boundary()
    }

    /// Bonds between this unit's atoms, computed on first access.
    pub fn bonds(&self) -> &IntraUnitBonds {
        self.bonds
            .get_or_init(|| intra_unit_bonds::compute(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::{CoarseRow, ModelBuilder};
    use crate::core::models::entity::EntityType;
    use nalgebra::Rotation3;

    fn peptide_model() -> Arc<Model> {
        let mut b = ModelBuilder::new("pep");
        b.add_entity("1", EntityType::Polymer)
            .add_entity("2", EntityType::NonPolymer);
        b.start_chain("A", "A", "1")
            .start_residue("ALA", 1)
            .add_atom("N", "N", Point3::new(0.0, 0.0, 0.0))
            .add_atom("CA", "C", Point3::new(1.46, 0.0, 0.0))
            .add_atom("C", "C", Point3::new(2.0, 1.4, 0.0))
            .start_residue("GLY", 2)
            .add_atom("N", "N", Point3::new(3.3, 1.6, 0.0))
            .add_atom("CA", "C", Point3::new(3.9, 2.9, 0.0));
        b.start_chain("B", "B", "2")
            .start_residue("HEM", 1)
            .add_atom("FE", "Fe", Point3::new(20.0, 0.0, 0.0));
        b.add_spheres(
            "1",
            "C",
            [CoarseRow {
                seq_id_begin: 1,
                seq_id_end: 4,
                position: Point3::new(0.0, 5.0, 0.0),
                radius: 2.5,
            }],
        );
        Arc::new(b.build().unwrap())
    }

    fn atomic_unit(model: &Arc<Model>, elements: ElementSet) -> Unit {
        Unit::create(
            0,
            0,
            UnitKind::Atomic,
            model.clone(),
            SymmetryOperator::default(),
            elements,
            Arc::new(StructureConfig::default()),
        )
        .unwrap()
    }

    #[test]
    fn create_rejects_out_of_range_elements() {
        let model = peptide_model();
        let result = Unit::create(
            0,
            0,
            UnitKind::Atomic,
            model,
            SymmetryOperator::default(),
            ElementSet::of_bounds(0..7),
            Arc::new(StructureConfig::default()),
        );
        assert!(matches!(
            result,
            Err(EngineError::Model(ModelError::IndexOutOfRange { index: 6, len: 6 }))
        ));
    }

    #[test]
    fn polymer_elements_pick_one_trace_atom_per_residue() {
        let model = peptide_model();
        let unit = atomic_unit(&model, ElementSet::of_bounds(0..5));
        assert_eq!(unit.polymer_elements().as_slice(), &[1, 4]);

        let ligand = atomic_unit(&model, ElementSet::of_bounds(5..6));
        assert!(ligand.polymer_elements().is_empty());
    }

    #[test]
    fn coarse_units_dispatch_to_coarse_tables() {
        let model = peptide_model();
        let unit = Unit::create(
            1,
            1,
            UnitKind::Spheres,
            model,
            SymmetryOperator::default(),
            ElementSet::of_bounds(0..1),
            Arc::new(StructureConfig::default()),
        )
        .unwrap();
        assert!(unit.is_coarse());
        assert_eq!(unit.radius(0), 2.5);
        assert_eq!(unit.asym_id(), "C");
        assert_eq!(unit.polymer_elements().as_slice(), &[0]);
        assert!(unit.residue_index(0).is_none());
        assert!(unit.bonds().is_empty());
    }

    #[test]
    fn apply_operator_transforms_positions_and_keeps_invariant_id() {
        let model = peptide_model();
        let unit = atomic_unit(&model, ElementSet::of_bounds(0..5));
        let shift = SymmetryOperator::from_rotation_and_offset(
            "2",
            &Rotation3::identity(),
            &Vector3::new(10.0, 0.0, 0.0),
        );
        let copy = unit.apply_operator(7, &shift);
        assert_eq!(copy.id(), 7);
        assert_eq!(copy.invariant_id(), unit.invariant_id());
        assert!(copy.elements().ptr_eq(unit.elements()));
        assert_eq!(copy.position(0), Point3::new(10.0, 0.0, 0.0));
        assert_eq!(copy.operator().name, "2");
        assert_eq!(copy.conformation_id(), unit.conformation_id());
    }

    #[test]
    fn lookup3d_returns_unit_local_positions() {
        let model = peptide_model();
        let unit = atomic_unit(&model, ElementSet::of_bounds(3..5));
        let hits = unit.lookup3d().find(&Point3::new(3.3, 1.6, 0.0), 0.1);
        assert_eq!(hits.indices, vec![0]);
        assert_eq!(unit.boundary().bbox.min, Point3::new(3.3, 1.6, 0.0));
    }

    #[test]
    fn asym_id_comes_from_first_chain() {
        let model = peptide_model();
        assert_eq!(atomic_unit(&model, ElementSet::of_bounds(5..6)).asym_id(), "B");
        assert_eq!(atomic_unit(&model, ElementSet::default()).asym_id(), "");
    }
}
