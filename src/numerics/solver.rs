//! Adaptive Runge-Kutta-Fehlberg 7(8) integration reported on a time grid.
//!
//! Each grid interval is integrated by `rkf78` as its own initial value
//! problem, so every output lands exactly on a requested time. Between
//! intervals the run can be cancelled, and a failing interval ends the run
//! with the outputs completed so far.

use std::cell::Cell;

use log::{debug, warn};
use nalgebra::SVector;
use rkf78::Rkf78;

use super::OdeSystem;
use crate::config::run::CancelFlag;

// Right-hand-side evaluations allowed for a single grid interval before the
// step size is considered to have collapsed.
pub const DEFAULT_EVAL_BUDGET: usize = 1_000_000;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            rtol: 1e-8,
            atol: 1e-10,
        }
    }
}

impl Tolerances {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Tolerances { rtol, atol }
    }

    /// The loose pair most general-purpose solvers default to. Fine for short
    /// horizons, but lets energy drift badly on chaotic runs of a minute.
    pub fn general_purpose() -> Self {
        Self::new(1e-3, 1e-6)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.rtol.is_finite() && self.rtol > 0.0) {
            return Err(format!("rtol must be finite and positive, got {}", self.rtol));
        }
        if !(self.atol.is_finite() && self.atol > 0.0) {
            return Err(format!("atol must be finite and positive, got {}", self.atol));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolverStats {
    pub n_rhs_evals: usize,
    pub n_accepted: usize,
    pub n_rejected: usize,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum IntegrationError<const N: usize> {
    #[display("integration diverged at t={t}: {reason} ({} outputs completed)", completed.len())]
    Diverged {
        t: f64,
        reason: String,
        completed: Vec<SVector<f64, N>>,
        stats: SolverStats,
    },
    #[display("integration cancelled at t={t} ({} outputs completed)", completed.len())]
    Cancelled {
        t: f64,
        completed: Vec<SVector<f64, N>>,
        stats: SolverStats,
    },
}

impl<const N: usize> IntegrationError<N> {
    pub fn completed(&self) -> &[SVector<f64, N>] {
        match self {
            IntegrationError::Diverged { completed, .. } => completed,
            IntegrationError::Cancelled { completed, .. } => completed,
        }
    }

    pub fn stats(&self) -> &SolverStats {
        match self {
            IntegrationError::Diverged { stats, .. } => stats,
            IntegrationError::Cancelled { stats, .. } => stats,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Solution<const N: usize> {
    // One state per requested time, aligned by index.
    pub states: Vec<SVector<f64, N>>,
    pub stats: SolverStats,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fault {
    NonFinite { t: f64 },
    BudgetExhausted { t: f64 },
}

// Presents an `OdeSystem` to rkf78 for one interval. Once the derivative
// turns non-finite or the budget runs out it records the fault and returns
// zeros, which lets the stepper run out the interval quickly.
struct Guarded<'a, S, const N: usize> {
    system: &'a S,
    budget: usize,
    evals: Cell<usize>,
    fault: Cell<Option<Fault>>,
}

impl<'a, S: OdeSystem<N>, const N: usize> Guarded<'a, S, N> {
    fn new(system: &'a S, budget: usize) -> Self {
        Guarded {
            system,
            budget,
            evals: Cell::new(0),
            fault: Cell::new(None),
        }
    }
}

impl<S: OdeSystem<N>, const N: usize> rkf78::OdeSystem<N> for Guarded<'_, S, N> {
    fn rhs(&self, t: f64, y: &[f64; N], dydt: &mut [f64; N]) {
        if self.fault.get().is_some() {
            *dydt = [0.0; N];
            return;
        }
        let n = self.evals.get() + 1;
        self.evals.set(n);
        if n > self.budget {
            self.fault.set(Some(Fault::BudgetExhausted { t }));
            *dydt = [0.0; N];
            return;
        }
        let f = self.system.rhs(t, &SVector::from(*y));
        if f.iter().all(|x| x.is_finite()) {
            dydt.copy_from_slice(f.as_slice());
        } else {
            self.fault.set(Some(Fault::NonFinite { t }));
            *dydt = [0.0; N];
        }
    }
}

pub struct Integrator<'a, S, const N: usize> {
    system: &'a S,
    tolerances: Tolerances,
    cancel: Option<&'a CancelFlag>,
    eval_budget: usize,
    stats: SolverStats,
}

impl<'a, S: OdeSystem<N>, const N: usize> Integrator<'a, S, N> {
    pub fn new(system: &'a S, tolerances: Tolerances) -> Self {
        Integrator {
            system,
            tolerances,
            cancel: None,
            eval_budget: DEFAULT_EVAL_BUDGET,
            stats: SolverStats::default(),
        }
    }

    pub fn with_cancel(mut self, cancel: &'a CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_eval_budget(mut self, budget: usize) -> Self {
        self.eval_budget = budget;
        self
    }

    // Integrate one interval [t, t_end]. The error carries the time of
    // failure and a description.
    fn advance(
        &mut self,
        t: f64,
        y: &SVector<f64, N>,
        t_end: f64,
    ) -> Result<SVector<f64, N>, (f64, String)> {
        let guarded = Guarded::new(self.system, self.eval_budget);
        let Tolerances { rtol, atol } = self.tolerances;
        let mut stepper = Rkf78::new(rkf78::Tolerances::with_components([atol; N], [rtol; N]));
        let y0: [f64; N] = (*y).into();
        let outcome = stepper.integrate(&guarded, t, &y0, t_end, t_end - t);

        self.stats.n_rhs_evals += guarded.evals.get().min(self.eval_budget);
        self.stats.n_accepted += stepper.stats.accepted_steps as usize;
        self.stats.n_rejected += stepper.stats.rejected_steps as usize;

        match (guarded.fault.get(), outcome) {
            (Some(Fault::NonFinite { t }), _) => {
                Err((t, "derivative is not finite".to_string()))
            }
            (Some(Fault::BudgetExhausted { t }), _) => Err((
                t,
                format!(
                    "step size collapsed, {} evaluations without reaching t={}",
                    self.eval_budget, t_end
                ),
            )),
            (None, Err(e)) => Err((t, format!("{:?}", e))),
            (None, Ok((t_reached, y_end))) => {
                let y_end = SVector::from(y_end);
                if (t_reached - t_end).abs() > 1e-9 * t_end.abs().max(1.0) {
                    Err((t_reached, format!("stopped short of t={}", t_end)))
                } else if !y_end.iter().all(|x| x.is_finite()) {
                    Err((t_reached, "state is not finite".to_string()))
                } else {
                    Ok(y_end)
                }
            }
        }
    }

    /// Integrate from (t0, y0) and report the state at each of `times`,
    /// which must be sorted ascending. Times at or before `t0` report `y0`.
    pub fn solve_at(
        mut self,
        t0: f64,
        y0: SVector<f64, N>,
        times: &[f64],
    ) -> Result<Solution<N>, IntegrationError<N>> {
        debug_assert!(times.windows(2).all(|w| w[0] <= w[1]));

        let mut states = Vec::with_capacity(times.len());
        let mut next = times.iter().take_while(|&&ti| ti <= t0).count();
        states.resize(next, y0);

        let mut t = t0;
        let mut y = y0;
        while next < times.len() {
            if self.cancel.is_some_and(|c| c.is_cancelled()) {
                warn!("Integration cancelled at t={}", t);
                return Err(IntegrationError::Cancelled {
                    t,
                    completed: states,
                    stats: self.stats,
                });
            }

            let t_next = times[next];
            if t_next > t {
                y = match self.advance(t, &y, t_next) {
                    Ok(y_next) => y_next,
                    Err((t_fail, reason)) => {
                        warn!("Integration failed at t={}: {}", t_fail, reason);
                        return Err(IntegrationError::Diverged {
                            t: t_fail,
                            reason,
                            completed: states,
                            stats: self.stats,
                        });
                    }
                };
                t = t_next;
            }
            states.push(y);
            next += 1;
        }

        debug!(
            "Finished: {} accepted, {} rejected, {} rhs evaluations",
            self.stats.n_accepted, self.stats.n_rejected, self.stats.n_rhs_evals
        );
        Ok(Solution {
            states,
            stats: self.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Vector1, Vector2};

    fn oscillator(_t: f64, y: &Vector2<f64>) -> Vector2<f64> {
        Vector2::new(y[1], -y[0])
    }

    #[test]
    fn test_harmonic_oscillator_on_grid() {
        let times: Vec<f64> = (0..=40).map(|i| i as f64 * 0.25).collect();
        let sol = Integrator::new(&oscillator, Tolerances::new(1e-10, 1e-12))
            .solve_at(0.0, Vector2::new(1.0, 0.0), &times)
            .unwrap();

        assert_eq!(sol.states.len(), times.len());
        for (t, y) in times.iter().zip(sol.states.iter()) {
            assert_abs_diff_eq!(y[0], t.cos(), epsilon = 1e-7);
            assert_abs_diff_eq!(y[1], -t.sin(), epsilon = 1e-7);
        }
        assert!(sol.stats.n_accepted >= 40);
        assert!(sol.stats.n_rhs_evals > sol.stats.n_accepted);
    }

    #[test]
    fn test_loose_tolerance_still_tracks() {
        let times: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let decay = |_t: f64, y: &Vector1<f64>| -y;
        let sol = Integrator::new(&decay, Tolerances::general_purpose())
            .solve_at(0.0, Vector1::new(1.0), &times)
            .unwrap();
        for (t, y) in times.iter().zip(sol.states.iter()) {
            assert_abs_diff_eq!(y[0], (-t).exp(), epsilon = 1e-3);
        }
    }

    #[test]
    fn test_first_output_is_exact_initial_state() {
        let times = [0.0, 0.5];
        let y0 = Vector2::new(0.3, -0.7);
        let sol = Integrator::new(&oscillator, Tolerances::default())
            .solve_at(0.0, y0, &times)
            .unwrap();
        assert_eq!(sol.states[0], y0);
    }

    #[test]
    fn test_no_times_no_work() {
        let sol = Integrator::new(&oscillator, Tolerances::default())
            .solve_at(0.0, Vector2::new(1.0, 0.0), &[])
            .unwrap();
        assert!(sol.states.is_empty());
        assert_eq!(sol.stats.n_rhs_evals, 0);
    }

    #[test]
    fn test_zero_field_stays_put() {
        let still = |_t: f64, _y: &Vector2<f64>| Vector2::zeros();
        let times: Vec<f64> = (0..100).map(|i| i as f64 * 0.5).collect();
        let y0 = Vector2::new(2.0, -1.0);
        let sol = Integrator::new(&still, Tolerances::default())
            .solve_at(0.0, y0, &times)
            .unwrap();
        assert!(sol.states.iter().all(|y| *y == y0));
    }

    #[test]
    fn test_blow_up_diverges_with_prefix() {
        // y' = y^2, y(0) = 1 has the solution 1 / (1 - t), singular at t = 1.
        let blow_up = |_t: f64, y: &Vector1<f64>| Vector1::new(y[0] * y[0]);
        let times: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let err = Integrator::new(&blow_up, Tolerances::general_purpose())
            .solve_at(0.0, Vector1::new(1.0), &times)
            .unwrap_err();

        match &err {
            IntegrationError::Diverged {
                t,
                completed,
                stats,
                ..
            } => {
                assert!(*t >= 0.9 - 1e-12 && *t <= 1.0 + 1e-12, "t={}", t);
                // Outputs up to t = 0.9 were valid before the singularity.
                assert_eq!(completed.len(), 10);
                assert_abs_diff_eq!(completed[5][0], 2.0, epsilon = 1e-2);
                assert!(stats.n_rhs_evals > 0);
            }
            other => panic!("unexpected error {}", other),
        }
        assert!(err.to_string().contains("diverged"));
    }

    #[test]
    fn test_exhausted_budget_diverges() {
        let times = [0.0, 1.0, 2.0];
        let err = Integrator::new(&oscillator, Tolerances::default())
            .with_eval_budget(5)
            .solve_at(0.0, Vector2::new(1.0, 0.0), &times)
            .unwrap_err();
        match err {
            IntegrationError::Diverged {
                reason,
                completed,
                stats,
                ..
            } => {
                assert!(reason.contains("collapsed"), "{}", reason);
                assert_eq!(completed.len(), 1);
                assert_eq!(stats.n_rhs_evals, 5);
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_cancelled_before_first_step() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let times = [0.0, 1.0, 2.0];
        let err = Integrator::new(&oscillator, Tolerances::default())
            .with_cancel(&cancel)
            .solve_at(0.0, Vector2::new(1.0, 0.0), &times)
            .unwrap_err();
        match err {
            IntegrationError::Cancelled { t, completed, .. } => {
                assert_eq!(t, 0.0);
                assert_eq!(completed.len(), 1);
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_cancelled_between_intervals() {
        let cancel = CancelFlag::new();
        let evals = Cell::new(0usize);
        // Cancels partway through the interval ending at t = 1.
        let counting = |t: f64, y: &Vector2<f64>| {
            evals.set(evals.get() + 1);
            if t > 0.5 {
                cancel.cancel();
            }
            oscillator(t, y)
        };
        let times: Vec<f64> = (0..=4).map(|i| i as f64 * 0.5).collect();
        let err = Integrator::new(&counting, Tolerances::default())
            .with_cancel(&cancel)
            .solve_at(0.0, Vector2::new(1.0, 0.0), &times)
            .unwrap_err();
        match err {
            IntegrationError::Cancelled {
                t,
                completed,
                stats,
            } => {
                // The interval in flight finishes, then the run stops.
                assert_eq!(t, 1.0);
                assert_eq!(completed.len(), 3);
                assert_abs_diff_eq!(completed[2][0], 1.0_f64.cos(), epsilon = 1e-7);
                assert_eq!(stats.n_rhs_evals, evals.get());
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_tolerance_validation() {
        assert!(Tolerances::default().validate().is_ok());
        assert!(Tolerances::new(0.0, 1e-6).validate().is_err());
        assert!(Tolerances::new(1e-3, f64::NAN).validate().is_err());
        assert!(Tolerances::new(-1e-3, 1e-6).validate().is_err());
    }
}
