use super::operator::SymmetryOperator;

/// Operators applied to the chains named by `asym_ids`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperatorGroup {
    pub asym_ids: Vec<String>,
    pub operators: Vec<SymmetryOperator>,
}

impl OperatorGroup {
    pub fn contains_asym_id(&self, asym_id: &str) -> bool {
        self.asym_ids.iter().any(|a| a == asym_id)
    }
}

/// A biological or crystallographic assembly description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assembly {
    pub id: String,
    pub details: String,
    pub operator_groups: Vec<OperatorGroup>,
}
