use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3D {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Default for Box3D {
    fn default() -> Self {
        Self {
            min: Point3::origin(),
            max: Point3::origin(),
        }
    }
}

impl Box3D {
    /// Tight box around `points`; the zero box at the origin when empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        let (min, max) = iter.fold((*first, *first), |(min, max), p| (min.inf(p), max.sup(p)));
        Self { min, max }
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f64> {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    pub fn expand(&self, delta: f64) -> Self {
        let d = Vector3::repeat(delta);
        Self {
            min: self.min - d,
            max: self.max + d,
        }
    }

    pub fn union(&self, other: &Box3D) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere3D {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl Default for Sphere3D {
    fn default() -> Self {
        Self {
            center: Point3::origin(),
            radius: 0.0,
        }
    }
}

/// Bounding box plus enclosing sphere of a point set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Boundary {
    pub bbox: Box3D,
    pub sphere: Sphere3D,
}

impl Boundary {
    /// The sphere is centered on the box and reaches the farthest point, widened by its radius.
    pub fn from_points(points: &[Point3<f64>], radii: Option<&[f64]>) -> Self {
        let bbox = Box3D::from_points(points);
        let center = bbox.center();
        let radius = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let r = radii.and_then(|r| r.get(i)).copied().unwrap_or(0.0);
                (p - center).norm() + r
            })
            .fold(0.0, f64::max);
        Self {
            bbox,
            sphere: Sphere3D { center, radius },
        }
    }

    /// Boundary enclosing every boundary in `parts`.
    pub fn union<'a>(parts: impl IntoIterator<Item = &'a Boundary>) -> Self {
        let parts: Vec<&Boundary> = parts.into_iter().collect();
        let Some(first) = parts.first() else {
            return Self::default();
        };
        let bbox = parts
            .iter()
            .skip(1)
            .fold(first.bbox, |acc, b| acc.union(&b.bbox));
        let center = bbox.center();
        let radius = parts
            .iter()
            .map(|b| (b.sphere.center - center).norm() + b.sphere.radius)
            .fold(0.0, f64::max);
        Self {
            bbox,
            sphere: Sphere3D { center, radius },
        }
    }
}
