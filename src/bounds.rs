use crate::vector::{Axis, Vector3};

/// An inclusive, integer-coordinate bounding box.
///
/// # Examples
///
/// ```
/// use idx::{Bounds, Vector3};
/// let b = Bounds { min: Vector3::new(0, 0, 0), max: Vector3::new(3, 3, 0) };
/// assert!(b.is_valid());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Bounds {
    /// The inclusive minimum corner.
    pub min: Vector3<i64>,
    /// The inclusive maximum corner.
    pub max: Vector3<i64>,
}

impl Bounds {
    /// `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        Axis::ALL.iter().all(|&a| self.min[a] <= self.max[a])
    }

    /// True if `other` fits entirely inside `self`.
    pub fn contains(&self, other: &Bounds) -> bool {
        Axis::ALL
            .iter()
            .all(|&a| self.min[a] <= other.min[a] && other.max[a] <= self.max[a])
    }

    /// The overlap of two boxes, or `None` if they don't intersect.
    pub fn intersect(&self, other: &Bounds) -> Option<Bounds> {
        let min = Vector3::from_fn(|a| self.min[a].max(other.min[a]));
        let max = Vector3::from_fn(|a| self.max[a].min(other.max[a]));
        let b = Bounds { min, max };
        if b.is_valid() {
            Some(b)
        } else {
            None
        }
    }

    /// Number of integer points covered by this box, counting every axis.
    pub fn volume(&self) -> u64 {
        Axis::ALL
            .iter()
            .map(|&a| (self.max[a] - self.min[a] + 1) as u64)
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_disjoint() {
        let a = Bounds {
            min: Vector3::new(0, 0, 0),
            max: Vector3::new(1, 1, 1),
        };
        let b = Bounds {
            min: Vector3::new(5, 5, 5),
            max: Vector3::new(6, 6, 6),
        };
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn intersect_overlap() {
        let a = Bounds {
            min: Vector3::new(0, 0, 0),
            max: Vector3::new(3, 3, 3),
        };
        let b = Bounds {
            min: Vector3::new(2, 2, 2),
            max: Vector3::new(5, 5, 5),
        };
        let c = a.intersect(&b).unwrap();
        assert_eq!(c.min, Vector3::new(2, 2, 2));
        assert_eq!(c.max, Vector3::new(3, 3, 3));
    }

    #[test]
    fn volume() {
        let b = Bounds {
            min: Vector3::new(0, 0, 0),
            max: Vector3::new(3, 3, 0),
        };
        assert_eq!(b.volume(), 16);
    }
}
