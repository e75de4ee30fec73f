use super::column::Column;
use super::ids::{ChainIndex, ElementIndex, EntityIndex, ResidueIndex};
use super::segmentation::Segmentation;

/// Per-atom columns of the `atom_site` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomTable {
    pub id: Column<i64>,
    pub type_symbol: Column<String>,
    pub label_atom_id: Column<String>,
    pub auth_atom_id: Column<String>,
    pub label_alt_id: Column<String>,
    pub occupancy: Column<f64>,
    pub b_iso_or_equiv: Column<f64>,
    pub pdbx_formal_charge: Column<i64>,
}

/// Per-residue columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidueTable {
    pub group_pdb: Column<String>,
    pub label_comp_id: Column<String>,
    pub auth_comp_id: Column<String>,
    pub label_seq_id: Column<i64>,
    pub auth_seq_id: Column<i64>,
    pub pdbx_pdb_ins_code: Column<String>,
}

/// Per-chain columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainTable {
    pub label_asym_id: Column<String>,
    pub auth_asym_id: Column<String>,
    pub label_entity_id: Column<String>,
}

/// Atom, residue and chain tables plus the segmentations linking them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomicHierarchy {
    pub atoms: AtomTable,
    pub residues: ResidueTable,
    pub chains: ChainTable,
    pub residue_atom_segments: Segmentation,
    pub chain_atom_segments: Segmentation,
    /// Entity of each chain, `None` if the chain's entity id is not in the entity table.
    pub chain_entity: Vec<Option<EntityIndex>>,
}

impl AtomicHierarchy {
    pub fn atom_count(&self) -> usize {
        self.atoms.id.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.label_comp_id.len()
    }

    pub fn chain_count(&self) -> usize {
        self.chains.label_asym_id.len()
    }

    #[inline]
    pub fn residue_index(&self, element: ElementIndex) -> Option<ResidueIndex> {
        self.residue_atom_segments.segment_of(element)
    }

    #[inline]
    pub fn chain_index(&self, element: ElementIndex) -> Option<ChainIndex> {
        self.chain_atom_segments.segment_of(element)
    }

    pub fn entity_of_chain(&self, chain: ChainIndex) -> Option<EntityIndex> {
        self.chain_entity.get(chain).copied().flatten()
    }

    /// Chain of a residue, resolved through the residue's first atom.
    pub fn chain_of_residue(&self, residue: ResidueIndex) -> Option<ChainIndex> {
        let first = self.residue_atom_segments.bounds(residue)?.start;
        self.chain_index(first)
    }

    pub fn atom_name(&self, element: ElementIndex) -> &str {
        self.atoms
            .label_atom_id
            .get(element)
            .map_or("", String::as_str)
    }

    pub fn comp_id_of_residue(&self, residue: ResidueIndex) -> &str {
        self.residues
            .label_comp_id
            .get(residue)
            .map_or("", String::as_str)
    }

    pub fn asym_id_of_chain(&self, chain: ChainIndex) -> &str {
        self.chains
            .label_asym_id
            .get(chain)
            .map_or("", String::as_str)
    }
}

/// Coarse sphere or gaussian elements, segmented by chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoarseElements {
    pub entity_id: Column<String>,
    pub asym_id: Column<String>,
    pub seq_id_begin: Column<i64>,
    pub seq_id_end: Column<i64>,
    pub chain_element_segments: Segmentation,
    /// Entity of each element, `None` if the entity id is unknown.
    pub entity_index: Vec<Option<EntityIndex>>,
}

impl CoarseElements {
    pub fn count(&self) -> usize {
        self.asym_id.len()
    }

    /// Whether `seq_id` falls in the element's inclusive sequence range.
    pub fn covers(&self, element: ElementIndex, seq_id: i64) -> bool {
        match (self.seq_id_begin.get(element), self.seq_id_end.get(element)) {
            (Some(&begin), Some(&end)) => begin <= seq_id && seq_id <= end,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoarseHierarchy {
    pub spheres: CoarseElements,
    pub gaussians: CoarseElements,
}

impl CoarseHierarchy {
    pub fn is_defined(&self) -> bool {
        self.spheres.count() > 0 || self.gaussians.count() > 0
    }
}
