use super::ModelError;
use std::ops::Range;

/// Partition of a contiguous element range `0..n` into consecutive, non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    offsets: Vec<usize>,
    index: Vec<usize>,
}

impl Default for Segmentation {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            index: Vec::new(),
        }
    }
}

/// One segment of a sorted element subset. `start..end` are positions into the subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Segmentation {
    /// `offsets` holds `count + 1` strictly increasing boundaries starting at `0`.
    pub fn from_offsets(offsets: Vec<usize>) -> Result<Self, ModelError> {
        match offsets.first() {
            None => {
                return Err(ModelError::MalformedSegmentation(
                    "offset table is empty".to_string(),
                ));
            }
            Some(&first) if first != 0 => {
                return Err(ModelError::MalformedSegmentation(format!(
                    "offset table starts at {first} instead of 0"
                )));
            }
            _ => {}
        }
        if let Some(i) = offsets.windows(2).position(|w| w[0] >= w[1]) {
            return Err(ModelError::MalformedSegmentation(format!(
                "segment {} is empty or reversed ({}..{})",
                i,
                offsets[i],
                offsets[i + 1]
            )));
        }

        let total = offsets[offsets.len() - 1];
        let mut index = Vec::with_capacity(total);
        for (segment, w) in offsets.windows(2).enumerate() {
            index.extend(std::iter::repeat_n(segment, w[1] - w[0]));
        }
        Ok(Self { offsets, index })
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.index.len()
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Segment containing `element`.
    #[inline]
    pub fn segment_of(&self, element: usize) -> Option<usize> {
        self.index.get(element).copied()
    }

    pub fn bounds(&self, segment: usize) -> Option<Range<usize>> {
        let start = *self.offsets.get(segment)?;
        let end = *self.offsets.get(segment + 1)?;
        Some(start..end)
    }

    pub fn size(&self, segment: usize) -> usize {
        self.bounds(segment).map_or(0, |r| r.len())
    }

    /// Walks the segments touched by a sorted element subset, in ascending order.
    pub fn segments<'a>(&'a self, elements: &'a [usize]) -> SegmentIter<'a> {
        SegmentIter {
            segmentation: self,
            elements,
            position: 0,
        }
    }
}

pub struct SegmentIter<'a> {
    segmentation: &'a Segmentation,
    elements: &'a [usize],
    position: usize,
}

impl Iterator for SegmentIter<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let first = *self.elements.get(self.position)?;
        let index = self.segmentation.segment_of(first)?;
        let bound = self.segmentation.offsets[index + 1];
        let start = self.position;
        let end = start + self.elements[start..].partition_point(|&e| e < bound);
        self.position = end;
        Some(Segment { index, start, end })
    }
}
