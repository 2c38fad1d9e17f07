//! Planar convex hull via Andrew's monotone chain.
//!
//! The hull over the (volatility, return) cloud is used as a tractable
//! superset of the true Pareto frontier: every non-dominated extreme point
//! lies on the hull, but for non-convex clouds the hull may also keep points
//! a strict Pareto filter would drop.

use crate::error::Error;
use crate::error::Result;

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
  (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Indices of the hull vertices of `points`, in counter-clockwise order.
///
/// Fails with [`Error::InsufficientData`] when fewer than 3 distinct points
/// exist; hull construction is degenerate below that.
pub fn convex_hull(points: &[(f64, f64)]) -> Result<Vec<usize>> {
  let mut order: Vec<usize> = (0..points.len()).collect();
  order.sort_by(|&a, &b| {
    points[a]
      .0
      .total_cmp(&points[b].0)
      .then(points[a].1.total_cmp(&points[b].1))
  });
  order.dedup_by(|&mut a, &mut b| points[a] == points[b]);

  if order.len() < 3 {
    return Err(Error::InsufficientData {
      points: order.len(),
    });
  }

  let mut lower: Vec<usize> = Vec::new();
  for &i in &order {
    while lower.len() >= 2
      && cross(
        points[lower[lower.len() - 2]],
        points[lower[lower.len() - 1]],
        points[i],
      ) <= 0.0
    {
      lower.pop();
    }
    lower.push(i);
  }

  let mut upper: Vec<usize> = Vec::new();
  for &i in order.iter().rev() {
    while upper.len() >= 2
      && cross(
        points[upper[upper.len() - 2]],
        points[upper[upper.len() - 1]],
        points[i],
      ) <= 0.0
    {
      upper.pop();
    }
    upper.push(i);
  }

  // endpoints appear in both chains
  lower.pop();
  upper.pop();
  lower.extend(upper);
  Ok(lower)
}

#[cfg(test)]
mod tests {
  use super::convex_hull;
  use crate::error::Error;

  #[test]
  fn square_hull_drops_the_interior_point() {
    let points = vec![
      (0.0, 0.0),
      (1.0, 0.0),
      (1.0, 1.0),
      (0.0, 1.0),
      (0.5, 0.5),
    ];
    let mut hull = convex_hull(&points).unwrap();
    hull.sort_unstable();
    assert_eq!(hull, vec![0, 1, 2, 3]);
  }

  #[test]
  fn too_few_distinct_points_is_an_error() {
    assert!(matches!(
      convex_hull(&[(0.0, 0.0), (1.0, 1.0)]),
      Err(Error::InsufficientData { points: 2 })
    ));

    // duplicates do not count as distinct
    assert!(matches!(
      convex_hull(&[(0.0, 0.0), (1.0, 1.0), (1.0, 1.0)]),
      Err(Error::InsufficientData { points: 2 })
    ));
  }

  #[test]
  fn collinear_cloud_reduces_to_its_endpoints() {
    let points = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)];
    let mut hull = convex_hull(&points).unwrap();
    hull.sort_unstable();
    assert_eq!(hull, vec![0, 3]);
  }

  #[test]
  fn strictly_interior_point_is_not_a_vertex() {
    let points = vec![
      (0.1, 0.1),
      (0.9, 0.05),
      (0.5, 0.2),
      (0.9, 1.0),
      (0.1, 0.9),
    ];
    let hull = convex_hull(&points).unwrap();
    assert!(!hull.contains(&2));
    assert_eq!(hull.len(), 4);
  }
}
