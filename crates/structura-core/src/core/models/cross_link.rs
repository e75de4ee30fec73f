use super::column::Column;

/// One end of a restraint: a residue, optionally narrowed to a single atom.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestraintEnd {
    pub asym_id: String,
    pub seq_id: i64,
    pub atom_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrossLinkRow {
    pub end_1: RestraintEnd,
    pub end_2: RestraintEnd,
    pub restraint_type: String,
    pub distance_threshold: f64,
    pub psi: Option<f64>,
    pub sigma_1: Option<f64>,
    pub sigma_2: Option<f64>,
}

/// The `ihm_cross_link_restraint` table of a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossLinkRestraintTable {
    pub asym_id_1: Column<String>,
    pub seq_id_1: Column<i64>,
    pub atom_id_1: Column<String>,
    pub asym_id_2: Column<String>,
    pub seq_id_2: Column<i64>,
    pub atom_id_2: Column<String>,
    pub restraint_type: Column<String>,
    pub distance_threshold: Column<f64>,
    pub psi: Column<f64>,
    pub sigma_1: Column<f64>,
    pub sigma_2: Column<f64>,
}

impl CrossLinkRestraintTable {
    pub fn len(&self) -> usize {
        self.asym_id_1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asym_id_1.is_empty()
    }

    pub fn push(&mut self, row: CrossLinkRow) {
        self.asym_id_1.push(row.end_1.asym_id);
        self.seq_id_1.push(row.end_1.seq_id);
        self.atom_id_1.push_option(row.end_1.atom_id);
        self.asym_id_2.push(row.end_2.asym_id);
        self.seq_id_2.push(row.end_2.seq_id);
        self.atom_id_2.push_option(row.end_2.atom_id);
        self.restraint_type.push(row.restraint_type);
        self.distance_threshold.push(row.distance_threshold);
        self.psi.push_option(row.psi);
        self.sigma_1.push_option(row.sigma_1);
        self.sigma_2.push_option(row.sigma_2);
    }

    /// Both ends of `row`; atom ids marked absent resolve at residue level.
    pub fn ends(&self, row: usize) -> (RestraintEnd, RestraintEnd) {
        let end = |asym: &Column<String>, seq: &Column<i64>, atom: &Column<String>| RestraintEnd {
            asym_id: asym.value(row).clone(),
            seq_id: *seq.value(row),
            atom_id: atom.present(row).filter(|a| !a.is_empty()).cloned(),
        };
        (
            end(&self.asym_id_1, &self.seq_id_1, &self.atom_id_1),
            end(&self.asym_id_2, &self.seq_id_2, &self.atom_id_2),
        )
    }
}
