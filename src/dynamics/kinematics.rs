use nalgebra::{Point2, Vector2};
use rayon::prelude::*;

use crate::{
    config::setup::parameters::physical::PhysicalParams,
    state::{Joints, StateVector},
};

// Offset of a rod's free end from its fixed end, for an angle from the
// downward vertical.
fn rod(length: f64, theta: f64) -> Vector2<f64> {
    let (s, c) = theta.sin_cos();
    Vector2::new(length * s, -length * c)
}

/// Cartesian positions of the pivot and both masses, with the pivot at the
/// origin and y pointing up.
pub fn project(y: &StateVector, p: &PhysicalParams) -> Joints {
    let pivot = Point2::origin();
    let joint1 = pivot + rod(p.length1, y.theta1);
    let joint2 = joint1 + rod(p.length2, y.theta2);
    Joints {
        pivot,
        joint1,
        joint2,
    }
}

/// Projects every state independently, in parallel, preserving order.
pub fn project_all(states: &[StateVector], p: &PhysicalParams) -> Vec<Joints> {
    states.par_iter().map(|y| project(y, p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::distance;

    #[test]
    fn test_hanging_straight_down() {
        let j = project(&StateVector::default(), &PhysicalParams::default());
        assert_eq!(j.pivot, Point2::origin());
        assert_relative_eq!(j.joint1, Point2::new(0.0, -1.0));
        assert_relative_eq!(j.joint2, Point2::new(0.0, -2.0));
    }

    #[test]
    fn test_horizontal_arms() {
        let half_pi = std::f64::consts::FRAC_PI_2;
        let p = PhysicalParams {
            length1: 0.5,
            length2: 2.0,
            ..Default::default()
        };
        let j = project(&StateVector::at_rest(half_pi, -half_pi), &p);
        assert_relative_eq!(j.joint1, Point2::new(0.5, 0.0), epsilon = 1e-12);
        assert_relative_eq!(j.joint2, Point2::new(-1.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rod_lengths_are_preserved() {
        let p = PhysicalParams {
            length1: 1.3,
            length2: 0.7,
            ..Default::default()
        };
        let states: Vec<StateVector> = (0..200)
            .map(|i| {
                let a = i as f64 * 0.37;
                StateVector::new(a, 0.0, -2.1 * a + 40.0, 0.0)
            })
            .collect();
        let joints = project_all(&states, &p);
        assert_eq!(joints.len(), states.len());
        for (y, j) in states.iter().zip(joints.iter()) {
            assert_relative_eq!(distance(&j.pivot, &j.joint1), p.length1, epsilon = 1e-12);
            assert_relative_eq!(distance(&j.joint1, &j.joint2), p.length2, epsilon = 1e-12);
            assert_eq!(*j, project(y, &p));
        }
    }
}
