use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Index of an atom or coarse element inside its model's tables.
pub type ElementIndex = usize;
pub type ResidueIndex = usize;
pub type ChainIndex = usize;
pub type EntityIndex = usize;

/// Identifier of a unit, unique within its owning structure.
pub type UnitId = u32;

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_CONFORMATION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique model identity. Two models compare equal only if they are the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

impl ModelId {
    pub(crate) fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model-{}", self.0)
    }
}

/// Identity of one set of coordinates; changes whenever positions change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConformationId(u64);

impl ConformationId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CONFORMATION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConformationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_are_unique() {
        let a = ModelId::next();
        let b = ModelId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn conformation_id_displays_as_plain_number() {
        let id = ConformationId(7);
        assert_eq!(id.to_string(), "7");
    }
}
