//! Point set data structures and functionality

use crate::point::*;
use std::ops::Index;

/// An ordered set of points decoded from a single message.
///
/// Insertion order is transmission order. Points have no identity beyond
/// their index, and the length decides whether an update can be applied to
/// the current instances in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    pub points: Vec<Point3d>,
}

impl PointSet {
    /// Create a new empty point set
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
        }
    }

    /// Create a new point set with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Get the number of points in the set
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point set is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the set
    pub fn push(&mut self, point: Point3d) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, Point3d> {
        self.points.iter()
    }

    /// Borrow the points as a slice
    pub fn as_slice(&self) -> &[Point3d] {
        &self.points
    }

    /// Find the first point with a NaN or infinite coordinate
    pub fn first_non_finite(&self) -> Option<(usize, &Point3d)> {
        self.points
            .iter()
            .enumerate()
            .find(|(_, point)| !is_finite_point(point))
    }
}

impl Index<usize> for PointSet {
    type Output = Point3d;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IntoIterator for PointSet {
    type Item = Point3d;
    type IntoIter = std::vec::IntoIter<Point3d>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point3d;
    type IntoIter = std::slice::Iter<'a, Point3d>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<Point3d> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point3d>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

impl From<Vec<[f64; 3]>> for PointSet {
    fn from(triples: Vec<[f64; 3]>) -> Self {
        triples
            .into_iter()
            .map(|[x, y, z]| Point3d::new(x, y, z))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_set_basics() {
        let mut set = PointSet::with_capacity(2);
        assert!(set.is_empty());

        set.push(Point3d::new(1.0, 2.0, 3.0));
        set.push(Point3d::new(4.0, 5.0, 6.0));

        assert_eq!(set.len(), 2);
        assert_eq!(set[1], Point3d::new(4.0, 5.0, 6.0));
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn test_from_triples_preserves_order() {
        let set = PointSet::from(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let xs: Vec<f64> = set.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 4.0, 7.0]);
    }

    #[test]
    fn test_first_non_finite() {
        let set = PointSet::from(vec![
            [0.0, 0.0, 0.0],
            [1.0, f64::NAN, 0.0],
            [f64::INFINITY, 0.0, 0.0],
        ]);
        let (index, _) = set.first_non_finite().unwrap();
        assert_eq!(index, 1);

        let clean = PointSet::from(vec![[0.0, 0.0, 0.0]]);
        assert!(clean.first_non_finite().is_none());
    }
}
