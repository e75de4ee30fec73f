use super::unit::Unit;
use crate::core::models::ids::{ElementIndex, UnitId};
use crate::core::utils::hash::sorted_slice_hash;
use crate::engine::error::EngineError;
use std::ops::Range;
use std::sync::Arc;

/// Strictly increasing, duplicate-free element indices into a model.
///
/// Cloning shares the underlying storage, so symmetry copies of a unit reuse
/// the same set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementSet(Arc<[ElementIndex]>);

impl Default for ElementSet {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl ElementSet {
    pub fn of_bounds(range: Range<ElementIndex>) -> Self {
        Self(range.collect::<Vec<_>>().into())
    }

    pub fn of_sorted(elements: Vec<ElementIndex>) -> Result<Self, EngineError> {
        if let Some(w) = elements.windows(2).find(|w| w[0] >= w[1]) {
            return Err(EngineError::InvalidElementSet(format!(
                "elements must be strictly increasing, found {} before {}",
                w[0], w[1]
            )));
        }
        Ok(Self(elements.into()))
    }

    pub fn of_unsorted(mut elements: Vec<ElementIndex>) -> Self {
        elements.sort_unstable();
        elements.dedup();
        Self(elements.into())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[ElementIndex] {
        &self.0
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<ElementIndex> {
        self.0.get(i).copied()
    }

    pub fn first(&self) -> Option<ElementIndex> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<ElementIndex> {
        self.0.last().copied()
    }

    /// O(log n) membership test.
    #[inline]
    pub fn has(&self, element: ElementIndex) -> bool {
        self.0.binary_search(&element).is_ok()
    }

    /// Position of `element` within the set.
    #[inline]
    pub fn index_of(&self, element: ElementIndex) -> Option<usize> {
        self.0.binary_search(&element).ok()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = ElementIndex> + '_ {
        self.0.iter().copied()
    }

    pub fn hash_code(&self) -> i32 {
        sorted_slice_hash(&self.0)
    }

    /// Whether both sets share storage.
    pub fn ptr_eq(&self, other: &ElementSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A location in a structure: a unit and one of its model element indices.
#[derive(Debug, Clone, Copy)]
pub struct StructureElement<'a> {
    pub unit: &'a Unit,
    pub element: ElementIndex,
}

impl<'a> StructureElement<'a> {
    pub fn new(unit: &'a Unit, element: ElementIndex) -> Self {
        Self { unit, element }
    }

    pub fn unit_id(&self) -> UnitId {
        self.unit.id()
    }
}

impl PartialEq for StructureElement<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.unit.id() == other.unit.id() && self.element == other.element
    }
}

/// Lazy walk over every (unit, element) pair, ascending by unit then element.
pub struct ElementLocations<'a> {
    units: &'a [Arc<Unit>],
    unit_index: usize,
    element_index: usize,
}

impl<'a> ElementLocations<'a> {
    pub(crate) fn new(units: &'a [Arc<Unit>]) -> Self {
        Self {
            units,
            unit_index: 0,
            element_index: 0,
        }
    }
}

impl<'a> Iterator for ElementLocations<'a> {
    type Item = StructureElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let unit = self.units.get(self.unit_index)?;
            if let Some(element) = unit.elements().get(self.element_index) {
                self.element_index += 1;
                return Some(StructureElement::new(unit, element));
            }
            self.unit_index += 1;
            self.element_index = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::hash::hash4;

    #[test]
    fn of_bounds_covers_half_open_range() {
        let s = ElementSet::of_bounds(3..6);
        assert_eq!(s.as_slice(), &[3, 4, 5]);
        assert_eq!(ElementSet::of_bounds(2..2).len(), 0);
    }

    #[test]
    fn of_sorted_rejects_duplicates_and_disorder() {
        assert!(ElementSet::of_sorted(vec![1, 2, 5]).is_ok());
        assert!(matches!(
            ElementSet::of_sorted(vec![1, 1]),
            Err(EngineError::InvalidElementSet(_))
        ));
        assert!(ElementSet::of_sorted(vec![3, 2]).is_err());
    }

    #[test]
    fn of_unsorted_sorts_and_dedups() {
        let s = ElementSet::of_unsorted(vec![5, 1, 3, 1]);
        assert_eq!(s.as_slice(), &[1, 3, 5]);
    }

    #[test]
    fn membership_and_position_use_binary_search() {
        let s = ElementSet::of_sorted(vec![2, 4, 8, 16]).unwrap();
        assert!(s.has(8));
        assert!(!s.has(5));
        assert_eq!(s.index_of(16), Some(3));
        assert_eq!(s.index_of(3), None);
    }

    #[test]
    fn hash_code_samples_ends_and_middle() {
        let s = ElementSet::of_sorted(vec![2, 4, 8, 16]).unwrap();
        assert_eq!(s.hash_code(), hash4(4, 2, 16, 8));
        assert_eq!(ElementSet::default().hash_code(), 0);
    }

    #[test]
    fn clones_share_storage_and_compare_by_value() {
        let a = ElementSet::of_bounds(0..4);
        let b = a.clone();
        let c = ElementSet::of_bounds(0..4);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(a, c);
    }
}
