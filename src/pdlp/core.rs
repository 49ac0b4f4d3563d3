use std::time::Instant;

use problemo::Problem;

use crate::callback::PdlpConvergenceOutput;
use crate::terminators::Terminator;

use super::instance::LpInstance;
use super::options::PdlpTunables;
use super::result::PdlpResult;
use super::state::PdlpTerminationStatus;
use super::state_manager::PdlpStateManager;

/// Drives a [`PdlpStateManager`] through the loop in §4.11: on each
/// iteration it checks the four termination conditions (time,
/// iteration, optimality, infeasibility heuristic), updates the
/// solution, refreshes the average/convergence/restart machinery on
/// their configured intervals, optionally logs a row, and either
/// continues the inner loop or restarts with a new primal weight.
///
/// Cooperative cancellation: in the source, the surrounding MIP
/// controller owns interruption and the core never raises it itself.
/// That controller is out of scope here (§1), so this core polls the
/// supplied [`Terminator`] once per iteration and sets `Interruption`
/// directly — the one place this crate's core is more active than a
/// strict reading of the distilled spec's core/controller split
/// implies (see DESIGN.md).
pub struct PdlpCore<'a> {
    instance: &'a LpInstance,
    manager: PdlpStateManager<'a>,
    tunables: PdlpTunables,
    terminator: Option<Box<dyn Terminator>>,
    /// The surrounding global time budget the source compares
    /// `elapsed_time + time_offset` against (§4.11(b), second
    /// branch). Defaults to `+inf` when no outer budget applies.
    global_time_max: f64,
    start_time: Instant,
    result: Option<PdlpResult>,
    log: PdlpConvergenceOutput,
}

impl<'a> PdlpCore<'a> {
    pub fn setup(instance: &'a LpInstance, tunables: PdlpTunables) -> Result<Self, Problem> {
        Self::setup_with(instance, tunables, None, f64::INFINITY)
    }

    pub fn setup_with(
        instance: &'a LpInstance,
        tunables: PdlpTunables,
        terminator: Option<Box<dyn Terminator>>,
        global_time_max: f64,
    ) -> Result<Self, Problem> {
        let manager = PdlpStateManager::setup(instance)?;
        let log = PdlpConvergenceOutput::new(tunables.verbose());
        Ok(Self {
            instance,
            manager,
            tunables,
            terminator,
            global_time_max,
            start_time: Instant::now(),
            result: None,
            log,
        })
    }

    pub fn state_manager(&self) -> &PdlpStateManager<'a> {
        &self.manager
    }

    fn satisfy_time_over(&mut self) -> bool {
        let elapsed = self.manager.state().elapsed_time;
        if elapsed > self.tunables.time_max() {
            self.manager.state_mut().termination_status = PdlpTerminationStatus::TimeOver;
            return true;
        }
        if elapsed + self.tunables.time_offset() > self.global_time_max {
            self.manager.state_mut().termination_status = PdlpTerminationStatus::TimeOver;
            return true;
        }
        false
    }

    fn satisfy_iteration_over(&mut self) -> bool {
        if self.manager.state().total_iteration >= self.tunables.iteration_max() {
            self.manager.state_mut().termination_status = PdlpTerminationStatus::IterationOver;
            return true;
        }
        false
    }

    fn satisfy_optimal(&mut self) -> bool {
        let tolerance = self.tunables.tolerance();
        let state = self.manager.state();
        if state.primal.relative_violation_norm > tolerance
            || state.dual.relative_violation_norm > tolerance
            || state.relative_gap > tolerance
        {
            return false;
        }
        self.manager.state_mut().termination_status = PdlpTerminationStatus::Optimal;
        true
    }

    fn satisfy_infeasible(&mut self) -> bool {
        let tolerance = self.tunables.tolerance();
        let state = self.manager.state();
        if state.dual.relative_violation_norm > tolerance {
            return false;
        }
        let upper = state.primal.objective_upper_bound;
        if state.dual.objective < upper + (1.0_f64).max(upper.abs() * f64::EPSILON) {
            return false;
        }
        self.manager.state_mut().termination_status = PdlpTerminationStatus::Infeasible;
        true
    }

    fn satisfy_interruption(&mut self) -> bool {
        let Some(terminator) = self.terminator.as_mut() else {
            return false;
        };
        if terminator.terminate().is_some() {
            self.manager.state_mut().termination_status = PdlpTerminationStatus::Interruption;
            return true;
        }
        false
    }

    /// Runs the core loop to completion (§4.11) and materializes the
    /// result. Mirrors `PDLPCore::run`: an initial convergence refresh,
    /// a throwaway `setup_new_inner_loop` call used only for its
    /// baseline/average side effects, then an explicit reset of all
    /// three iteration counters before the loop proper starts.
    pub fn run(&mut self) -> Result<(), Problem> {
        self.start_time = Instant::now();

        self.manager.update_convergence_information()?;

        self.log.header();
        self.print_row(" INITIAL", None);

        self.manager.setup_new_inner_loop();
        self.manager.reset_iteration();

        let mut logged_this_iteration = false;

        loop {
            self.manager.state_mut().elapsed_time = self.start_time.elapsed().as_secs_f64();

            if self.satisfy_interruption() {
                if !logged_this_iteration {
                    self.print_row("", None);
                }
                break;
            }
            if self.satisfy_time_over() {
                if !logged_this_iteration {
                    self.print_row("", None);
                }
                break;
            }
            if self.satisfy_iteration_over() {
                if !logged_this_iteration {
                    self.print_row("", None);
                }
                break;
            }
            if self.satisfy_optimal() {
                if !logged_this_iteration {
                    self.print_row("", None);
                }
                break;
            }
            if self.satisfy_infeasible() {
                if !logged_this_iteration {
                    self.print_row("", None);
                }
                break;
            }

            self.manager.update_solution(&self.tunables)?;
            self.manager.update_averaged_solution()?;

            let total_iteration = self.manager.state().total_iteration;
            if total_iteration % self.tunables.restart_check_interval() == 0 {
                self.manager.update_restart_information(&self.tunables)?;
            } else {
                self.manager.state_mut().is_enabled_restart = false;
            }

            if total_iteration % self.tunables.convergence_check_interval() == 0
                || total_iteration % self.tunables.log_interval() == 0
            {
                self.manager.update_convergence_information()?;
            }

            if total_iteration % self.tunables.log_interval() == 0 {
                self.print_row("", None);
                logged_this_iteration = true;
            } else {
                logged_this_iteration = false;
            }

            if self.manager.state().is_enabled_restart {
                self.manager.update_restart_solution();
                self.manager.update_primal_weight()?;
                self.manager.setup_new_inner_loop();
            } else {
                self.manager.state_mut().inner_iteration += 1;
            }
            self.manager.state_mut().total_iteration += 1;
        }

        self.log.footer();

        self.result = Some(PdlpResult::from_state(self.manager.state(), &self.tunables));
        Ok(())
    }

    /// The immutable result materialized at the end of [`Self::run`].
    /// Panics if called before `run`, like the source's accessor which
    /// assumes `run` has already completed.
    pub fn result(&self) -> &PdlpResult {
        self.result
            .as_ref()
            .expect("PdlpCore::result called before run")
    }

    /// `label`: `" INITIAL"` for the pre-loop row, empty for body rows
    /// (where the iteration number and restart marker are printed
    /// instead).
    fn print_row(&self, label: &str, _unused: Option<()>) {
        let tolerance = self.tunables.tolerance();
        let state = self.manager.state();
        let sign = if self.instance.is_minimization() {
            1.0
        } else {
            -1.0
        };

        let (iteration, restart_marker) = if label.is_empty() {
            let marker = if state.is_enabled_restart {
                state.restart_mode.marker()
            } else {
                ' '
            };
            (Some(state.total_iteration), marker)
        } else {
            (None, ' ')
        };

        let dual_violation_displayed = if state.dual.relative_violation_norm < tolerance {
            0.0
        } else {
            state.dual.relative_violation_norm
        };

        self.log.row(
            label,
            iteration,
            restart_marker,
            state.step_size_current,
            state.primal.objective * sign,
            state.primal.relative_violation_norm,
            state.dual.objective * sign,
            dual_violation_displayed,
            state.relative_gap,
            tolerance,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdlp::instance::ConstraintSense;
    use crate::SolverOptions;

    fn tunables() -> PdlpTunables {
        PdlpTunables::new(&SolverOptions::new())
    }

    fn trivial_1x1() -> LpInstance {
        // min x s.t. x >= 1, 0 <= x <= 10 -- S1 from the spec.
        LpInstance::new(
            &[1.0],
            &[0.0],
            &[10.0],
            &[1.0],
            &[0],
            &[0],
            &[ConstraintSense::GreaterEqual],
            &[1.0],
            true,
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn s1_trivial_1x1_reaches_optimal() {
        let mut instance = trivial_1x1();
        instance.scaling(10, true);
        let mut core = PdlpCore::setup(&instance, tunables()).unwrap();
        core.run().unwrap();
        let result = core.result();
        assert_eq!(result.termination_status(), PdlpTerminationStatus::Optimal);
        assert!((result.primal().average[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn s4_infeasible_heuristic_fires() {
        // min x s.t. x >= 5, x <= 1, 0 <= x <= 10 -- encoded as two rows.
        let instance = LpInstance::new(
            &[1.0],
            &[0.0],
            &[10.0],
            &[1.0, 1.0],
            &[0, 1],
            &[0, 0],
            &[ConstraintSense::LessEqual, ConstraintSense::GreaterEqual],
            &[1.0, 5.0],
            true,
            0.0,
        )
        .unwrap();
        let mut core = PdlpCore::setup(&instance, tunables()).unwrap();
        core.run().unwrap();
        assert_eq!(
            core.result().termination_status(),
            PdlpTerminationStatus::Infeasible
        );
    }

    #[test]
    fn s5_iteration_cap_is_respected() {
        let instance = trivial_1x1();
        let mut options = SolverOptions::new();
        options.set_option("iteration_max", 10usize).unwrap();
        let mut core = PdlpCore::setup(&instance, PdlpTunables::new(&options)).unwrap();
        core.run().unwrap();
        assert_eq!(
            core.result().termination_status(),
            PdlpTerminationStatus::IterationOver
        );
        assert_eq!(core.result().number_of_iterations(), 10);
    }

    #[test]
    fn zero_iteration_max_terminates_immediately() {
        let instance = trivial_1x1();
        let mut options = SolverOptions::new();
        options.set_option("iteration_max", 0usize).unwrap();
        let mut core = PdlpCore::setup(&instance, PdlpTunables::new(&options)).unwrap();
        core.run().unwrap();
        assert_eq!(
            core.result().termination_status(),
            PdlpTerminationStatus::IterationOver
        );
        assert_eq!(core.result().number_of_iterations(), 0);
    }

    #[test]
    fn s2_two_variable_equality_reaches_optimal() {
        // min x1 + x2 s.t. x1 + x2 = 3, 0 <= xi <= 5.
        let instance = LpInstance::new(
            &[1.0, 1.0],
            &[0.0, 0.0],
            &[5.0, 5.0],
            &[1.0, 1.0],
            &[0, 0],
            &[0, 1],
            &[ConstraintSense::Equal],
            &[3.0],
            true,
            0.0,
        )
        .unwrap();
        let mut core = PdlpCore::setup(&instance, tunables()).unwrap();
        core.run().unwrap();
        let result = core.result();
        assert_eq!(result.termination_status(), PdlpTerminationStatus::Optimal);
        let sum = result.primal().average[0] + result.primal().average[1];
        assert!((sum - 3.0).abs() < 1e-2);
        assert!((result.primal().objective - 3.0).abs() < 1e-2);
    }

    #[test]
    fn s3_degenerate_packing_reaches_optimal() {
        // min -(x1 + x2) s.t. x1 + x2 <= 1, x1 - x2 <= 0.5, 0 <= xi <= 1.
        let instance = LpInstance::new(
            &[-1.0, -1.0],
            &[0.0, 0.0],
            &[1.0, 1.0],
            &[1.0, 1.0, 1.0, -1.0],
            &[0, 0, 1, 1],
            &[0, 1, 0, 1],
            &[ConstraintSense::LessEqual, ConstraintSense::LessEqual],
            &[1.0, 0.5],
            true,
            0.0,
        )
        .unwrap();
        let mut core = PdlpCore::setup(&instance, tunables()).unwrap();
        core.run().unwrap();
        let result = core.result();
        assert_eq!(result.termination_status(), PdlpTerminationStatus::Optimal);
        let sum = result.primal().average[0] + result.primal().average[1];
        assert!((sum - 1.0).abs() < 1e-2);
        assert!((result.primal().objective - (-1.0)).abs() < 1e-2);
    }

    #[test]
    fn s6_rescaling_round_trip_preserves_primal_objective() -> Result<(), problemo::Problem> {
        // min x1 + 2*x2 s.t. x1 + x2 >= 3, 0 <= xi <= 10, solved both
        // unscaled and through Ruiz + Pock-Chambolle preprocessing --
        // the unscaled objective should match after reverse-scaling.
        let build = || {
            LpInstance::new(
                &[1.0, 2.0],
                &[0.0, 0.0],
                &[10.0, 10.0],
                &[1.0, 1.0],
                &[0, 0],
                &[0, 1],
                &[ConstraintSense::GreaterEqual],
                &[3.0],
                true,
                0.0,
            )
            .unwrap()
        };

        let unscaled = build();
        let mut core_unscaled = PdlpCore::setup(&unscaled, tunables()).unwrap();
        core_unscaled.run().unwrap();
        let objective_unscaled = core_unscaled.result().primal().objective;

        let mut scaled = build();
        scaled.scaling(3, true);
        let mut core_scaled = PdlpCore::setup(&scaled, tunables()).unwrap();
        core_scaled.run().unwrap();
        let result = core_scaled.result();
        let (x, _y) = result
            .unscale(scaled.row_scaler(), scaled.column_scaler())
            .unwrap();
        let objective_reconstructed = unscaled.primal_objective_coefficients().dot(&x)?;

        assert!((objective_reconstructed - objective_unscaled).abs() < 5e-2);
        Ok(())
    }
}
