pub mod energy;
pub mod kinematics;

use nalgebra::Vector4;

use crate::{
    config::setup::parameters::physical::PhysicalParams, numerics::OdeSystem, state::StateVector,
};

/// Time derivative of the state, from the Lagrangian of two point masses on
/// rigid massless rods. `t` is unused: the system is autonomous.
pub fn derivatives(_t: f64, y: &StateVector, p: &PhysicalParams) -> StateVector {
    let StateVector {
        theta1,
        omega1,
        theta2,
        omega2,
    } = *y;
    let PhysicalParams {
        gravity: g,
        length1: l1,
        length2: l2,
        mass1: m1,
        mass2: m2,
    } = *p;

    let (s, c) = (theta1 - theta2).sin_cos();
    // Never zero while both masses are positive.
    let denom = m1 + m2 * s * s;
    let omega1_sq = omega1 * omega1;
    let omega2_sq = omega2 * omega2;

    let omega1_dot = (m2 * g * theta2.sin() * c
        - m2 * s * (l1 * omega1_sq * c + l2 * omega2_sq)
        - (m1 + m2) * g * theta1.sin())
        / (l1 * denom);

    let omega2_dot = ((m1 + m2) * (l1 * omega1_sq * s - g * theta2.sin() + g * theta1.sin() * c)
        + m2 * l2 * omega2_sq * s * c)
        / (l2 * denom);

    StateVector {
        theta1: omega1,
        omega1: omega1_dot,
        theta2: omega2,
        omega2: omega2_dot,
    }
}

// Adapter that lets the solver drive the equations of motion.
pub struct DoublePendulum {
    pub params: PhysicalParams,
}

impl DoublePendulum {
    pub fn new(params: PhysicalParams) -> Self {
        DoublePendulum { params }
    }
}

impl OdeSystem<4> for DoublePendulum {
    fn rhs(&self, t: f64, y: &Vector4<f64>) -> Vector4<f64> {
        derivatives(t, &StateVector::from(*y), &self.params).as_vector()
    }
}
