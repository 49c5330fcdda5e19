use crate::{config::setup::parameters::physical::PhysicalParams, state::StateVector};

pub fn kinetic(y: &StateVector, p: &PhysicalParams) -> f64 {
    let v1_sq = (p.length1 * y.omega1).powi(2);
    let v2_sq = v1_sq
        + (p.length2 * y.omega2).powi(2)
        + 2.0 * p.length1 * p.length2 * y.omega1 * y.omega2 * (y.theta1 - y.theta2).cos();
    0.5 * p.mass1 * v1_sq + 0.5 * p.mass2 * v2_sq
}

// Zero at the pivot height, negative below it.
pub fn potential(y: &StateVector, p: &PhysicalParams) -> f64 {
    -p.total_mass() * p.gravity * p.length1 * y.theta1.cos()
        - p.mass2 * p.gravity * p.length2 * y.theta2.cos()
}

pub fn total(y: &StateVector, p: &PhysicalParams) -> f64 {
    kinetic(y, p) + potential(y, p)
}

/// Largest deviation from the first state's energy, relative to its
/// magnitude. Zero for fewer than two states.
pub fn max_relative_drift<'a, I>(states: I, p: &PhysicalParams) -> f64
where
    I: IntoIterator<Item = &'a StateVector>,
{
    let mut states = states.into_iter();
    let e0 = match states.next() {
        Some(y0) => total(y0, p),
        None => return 0.0,
    };
    let scale = if e0 == 0.0 { 1.0 } else { e0.abs() };
    states
        .map(|y| (total(y, p) - e0).abs() / scale)
        .fold(0.0, f64::max)
}
