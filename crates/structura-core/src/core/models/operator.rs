use crate::core::utils::geometry::rigid_transform;
use nalgebra::{Matrix4, Point3, Rotation3, Vector3};

/// Assembly provenance of an operator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssemblyInfo {
    pub id: String,
    pub oper_id: usize,
    pub oper_list: Vec<String>,
}

/// A rigid 4×4 transform applied when replicating a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryOperator {
    pub name: String,
    pub assembly: Option<AssemblyInfo>,
    /// Lattice translation for crystal symmetry operators.
    pub hkl: [i32; 3],
    pub matrix: Matrix4<f64>,
    pub inverse: Matrix4<f64>,
    pub is_identity: bool,
}

pub const DEFAULT_OPERATOR_NAME: &str = "1_555";

const IDENTITY_EPSILON: f64 = 1e-9;

impl Default for SymmetryOperator {
    fn default() -> Self {
        Self {
            name: DEFAULT_OPERATOR_NAME.to_string(),
            assembly: None,
            hkl: [0, 0, 0],
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
            is_identity: true,
        }
    }
}

impl SymmetryOperator {
    /// Rigid transforms are always invertible; a singular matrix keeps an identity inverse.
    pub fn create(name: impl Into<String>, matrix: Matrix4<f64>, assembly: Option<AssemblyInfo>) -> Self {
        let is_identity = matrix.relative_eq(&Matrix4::identity(), IDENTITY_EPSILON, IDENTITY_EPSILON);
        let inverse = matrix.try_inverse().unwrap_or_else(Matrix4::identity);
        Self {
            name: name.into(),
            assembly,
            hkl: [0, 0, 0],
            matrix,
            inverse,
            is_identity,
        }
    }

    pub fn from_rotation_and_offset(
        name: impl Into<String>,
        rotation: &Rotation3<f64>,
        offset: &Vector3<f64>,
    ) -> Self {
        Self::create(name, rigid_transform(rotation, offset), None)
    }

    pub fn with_hkl(mut self, hkl: [i32; 3]) -> Self {
        self.hkl = hkl;
        self
    }

    /// Applies `first`, then `second`. Name and provenance come from `second`.
    pub fn compose(first: &SymmetryOperator, second: &SymmetryOperator) -> Self {
        let matrix = second.matrix * first.matrix;
        let mut composed = Self::create(second.name.clone(), matrix, second.assembly.clone());
        composed.hkl = second.hkl;
        composed
    }

    #[inline]
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        if self.is_identity {
            *point
        } else {
            Point3::from_homogeneous(self.matrix * point.to_homogeneous()).unwrap_or(*point)
        }
    }

    #[inline]
    pub fn apply_inverse(&self, point: &Point3<f64>) -> Point3<f64> {
        if self.is_identity {
            *point
        } else {
            Point3::from_homogeneous(self.inverse * point.to_homogeneous()).unwrap_or(*point)
        }
    }
}
