use super::ModelError;
use super::ids::{ConformationId, ElementIndex};
use nalgebra::Point3;

/// Per-element coordinates and radii of one set of positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformation {
    id: ConformationId,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    radius: Vec<f64>,
}

impl Default for Conformation {
    fn default() -> Self {
        Self {
            id: ConformationId::next(),
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            radius: Vec::new(),
        }
    }
}

impl Conformation {
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
        radius: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let n = x.len();
        if y.len() != n || z.len() != n || radius.len() != n {
            return Err(ModelError::InvalidValue(format!(
                "conformation arrays differ in length (x={}, y={}, z={}, radius={})",
                n,
                y.len(),
                z.len(),
                radius.len()
            )));
        }
        Ok(Self {
            id: ConformationId::next(),
            x,
            y,
            z,
            radius,
        })
    }

    pub fn from_positions(positions: &[Point3<f64>], radius: Vec<f64>) -> Result<Self, ModelError> {
        Self::new(
            positions.iter().map(|p| p.x).collect(),
            positions.iter().map(|p| p.y).collect(),
            positions.iter().map(|p| p.z).collect(),
            radius,
        )
    }

    pub fn id(&self) -> ConformationId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    #[inline]
    pub fn position(&self, element: ElementIndex) -> Point3<f64> {
        Point3::new(self.x[element], self.y[element], self.z[element])
    }

    #[inline]
    pub fn radius(&self, element: ElementIndex) -> f64 {
        self.radius[element]
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn radii(&self) -> &[f64] {
        &self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_mismatched_lengths() {
        let result = Conformation::new(vec![0.0], vec![0.0, 1.0], vec![0.0], vec![1.0]);
        assert!(matches!(result, Err(ModelError::InvalidValue(_))));
    }

    #[test]
    fn position_and_radius_are_indexed_by_element() {
        let c = Conformation::from_positions(
            &[Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0)],
            vec![1.5, 1.7],
        )
        .unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.position(1), Point3::new(4.0, 5.0, 6.0));
        assert_eq!(c.radius(0), 1.5);
    }

    #[test]
    fn each_conformation_gets_a_fresh_id() {
        let a = Conformation::default();
        let b = Conformation::default();
        assert_ne!(a.id(), b.id());
    }
}
