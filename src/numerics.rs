pub mod grid;
pub mod solver;

use nalgebra::SVector;

/// A first-order system dy/dt = f(t, y) with an N-dimensional state.
pub trait OdeSystem<const N: usize> {
    fn rhs(&self, t: f64, y: &SVector<f64, N>) -> SVector<f64, N>;
}

impl<const N: usize, F> OdeSystem<N> for F
where
    F: Fn(f64, &SVector<f64, N>) -> SVector<f64, N>,
{
    fn rhs(&self, t: f64, y: &SVector<f64, N>) -> SVector<f64, N> {
        self(t, y)
    }
}
