use problemo::Problem;

use crate::E;

use super::instance::LpInstance;
use super::options::PdlpTunables;
use super::sparse::ops::{linear_combination_2, linear_combination_spmv_3, subtract};
use super::sparse::Vector;
use super::state::{PdlpState, RestartMode, RestartSource};

const EPSILON_10: E = 1e-10;
const EPSILON_20: E = 1e-20;

/// The ω-weighted norm `sqrt(ω‖dx‖² + ω⁻¹‖dy‖²)` used throughout the
/// restart controller and the adaptive step-size update.
pub fn compute_weighted_norm(primal_weight: E, dx: &Vector, dy: &Vector) -> E {
    (primal_weight * dx.square_sum() + dy.square_sum() / primal_weight).sqrt()
}

/// Owns the [`PdlpState`] for the lifetime of one core run and
/// implements every state transition named in §4.3-§4.10.
pub struct PdlpStateManager<'a> {
    instance: &'a LpInstance,
    state: PdlpState,
}

impl<'a> PdlpStateManager<'a> {
    pub fn setup(instance: &'a LpInstance) -> Result<Self, Problem> {
        let n = instance.number_of_primal_variables();
        let m = instance.number_of_constraints();
        let mut state = PdlpState::new(n, m);

        state.primal.solution = instance.primal_initial_solution().clone();
        state.primal.average = state.primal.solution.clone();
        state.dual.solution = instance.dual_initial_solution().clone();
        state.dual.average = state.dual.solution.clone();

        state.primal.objective_coefficients_norm = instance.primal_objective_coefficients_norm();
        state.dual.objective_coefficients_norm = instance.dual_objective_coefficients_norm();
        state.primal.objective_lower_bound = instance.primal_objective_lower_bound();
        state.primal.objective_upper_bound = instance.primal_objective_upper_bound();

        state.normalized_gap_inner_current = E::INFINITY;
        state.normalized_gap_inner_previous = E::INFINITY;
        state.normalized_gap_outer_current = E::INFINITY;
        state.normalized_gap_outer_previous = E::INFINITY;
        state.step_size_cumulative_sum = 0.0;

        let mut manager = Self { instance, state };
        manager.setup_initial_step_size();
        manager.setup_initial_primal_weight();
        Ok(manager)
    }

    pub fn state(&self) -> &PdlpState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PdlpState {
        &mut self.state
    }

    pub fn instance(&self) -> &LpInstance {
        self.instance
    }

    fn setup_initial_step_size(&mut self) {
        let tau0 = 1.0 / self.instance.constraint_matrix().norm_infty();
        self.state.step_size_current = tau0;
        self.state.step_size_previous = tau0;
    }

    fn setup_initial_primal_weight(&mut self) {
        let c_norm = self.instance.primal_objective_coefficients_norm();
        let b_norm = self.instance.dual_objective_coefficients_norm();
        self.state.primal_weight = if c_norm > EPSILON_20 && b_norm > EPSILON_20 {
            c_norm / b_norm
        } else {
            1.0
        };
    }

    /// One attempt of the adaptive primal-dual update; retries with a
    /// shrunk step size until the contraction condition accepts. The
    /// retry count has no cap in the source and this matches that.
    pub fn update_solution(&mut self, tunables: &PdlpTunables) -> Result<(), Problem> {
        let omega = self.state.primal_weight;
        let x = self.state.primal.solution.clone();
        let y = self.state.dual.solution.clone();

        loop {
            let tau = self.state.step_size_current;
            let tau_primal = tau / omega;

            let x_tilde_raw = linear_combination_spmv_3(
                tau_primal,
                self.instance.constraint_matrix_transpose(),
                &y,
                1.0,
                &x,
                -tau_primal,
                self.instance.primal_objective_coefficients(),
            )?;
            let x_tilde = x_tilde_raw.clamp(
                self.instance.primal_lower_bounds(),
                self.instance.primal_upper_bounds(),
            )?;

            let tau_dual = tau * omega;
            let z = linear_combination_2(2.0, &x_tilde, -1.0, &x)?;
            let y_tilde_raw = linear_combination_spmv_3(
                -tau_dual,
                self.instance.constraint_matrix(),
                &z,
                1.0,
                &y,
                tau_dual,
                self.instance.dual_objective_coefficients(),
            )?;
            let y_tilde = y_tilde_raw.clamp(
                self.instance.dual_lower_bounds(),
                self.instance.dual_upper_bounds(),
            )?;

            let dx = subtract(&x_tilde, &x)?;
            let dy = subtract(&y_tilde, &y)?;
            let weighted_norm = compute_weighted_norm(omega, &dx, &dy);

            let a_dx = self.instance.constraint_matrix().dot(&dx)?;
            let interaction = dy.dot(&a_dx)?.abs();

            let tau_limit = if interaction > EPSILON_10 {
                0.5 * weighted_norm * weighted_norm / interaction
            } else {
                E::INFINITY
            };

            self.state.number_of_solution_update_attempts += 1;
            let k = (self.state.number_of_solution_update_attempts + 1) as E;
            let reduce_factor = 1.0 - k.powf(tunables.step_size_reduce_exponent());
            let extend_factor = 1.0 + k.powf(tunables.step_size_extend_exponent());
            let tau_cand = (reduce_factor * tau_limit).min(extend_factor * tau);

            if tau < tau_limit {
                self.state.primal.solution = x_tilde;
                self.state.dual.solution = y_tilde;
                self.state.primal.move_ = dx;
                self.state.dual.move_ = dy;
                self.state.step_size_previous = tau;
                self.state.step_size_current = tau_cand;
                break;
            }
            self.state.step_size_current = tau_cand;
        }
        Ok(())
    }

    /// The step-size-weighted running average of the inner loop's
    /// iterates.
    pub fn update_averaged_solution(&mut self) -> Result<(), Problem> {
        let sigma = self.state.step_size_previous;
        self.state.step_size_cumulative_sum += sigma;
        let eta = sigma / self.state.step_size_cumulative_sum;
        let x = self.state.primal.solution.clone();
        let y = self.state.dual.solution.clone();
        self.state.primal.average.learn(&x, eta)?;
        self.state.dual.average.learn(&y, eta)?;
        Ok(())
    }

    /// The normalized duality gap Φ(x_c, y_c, r) (§4.6). Preserves the
    /// source's dual active-set asymmetry exactly (both branches test
    /// against `dual_upper_bounds`): see DESIGN.md.
    pub fn compute_normalized_gap(
        &self,
        center_primal: &Vector,
        center_dual: &Vector,
        radius: E,
    ) -> Result<E, Problem> {
        if radius.abs() < EPSILON_10 {
            return Ok(0.0);
        }
        let omega = self.state.primal_weight;

        let g_primal = subtract(
            self.instance.primal_objective_coefficients(),
            &self
                .instance
                .constraint_matrix_transpose()
                .dot(center_dual)?,
        )?;
        let g_dual = subtract(
            self.instance.dual_objective_coefficients(),
            &self.instance.constraint_matrix().dot(center_primal)?,
        )?;

        let lower = self.instance.primal_lower_bounds();
        let upper = self.instance.primal_upper_bounds();
        let mut d_primal = Vector::zeros(center_primal.len());
        for i in 0..d_primal.len() {
            let g = g_primal[i];
            let at_upper = center_primal[i] == upper[i];
            let at_lower = center_primal[i] == lower[i];
            d_primal[i] = if (at_upper && g <= 0.0) || (at_lower && g >= 0.0) {
                0.0
            } else {
                -g * omega
            };
        }

        let dual_upper = self.instance.dual_upper_bounds();
        let mut d_dual = Vector::zeros(center_dual.len());
        for j in 0..d_dual.len() {
            let g = g_dual[j];
            // Both active-set checks compare against `dual_upper`; this
            // mirrors a source quirk flagged in DESIGN.md, not corrected.
            let at_upper = center_dual[j] == dual_upper[j];
            let at_lower = center_dual[j] == dual_upper[j];
            d_dual[j] = if (at_upper && g <= 0.0) || (at_lower && g >= 0.0) {
                0.0
            } else {
                g / omega
            };
        }

        let norm = compute_weighted_norm(omega, &d_primal, &d_dual);
        if norm < EPSILON_10 {
            return Ok(0.0);
        }
        let scale = 1.0 / (norm * radius);
        for i in 0..d_primal.len() {
            d_primal[i] *= scale;
        }
        for j in 0..d_dual.len() {
            d_dual[j] *= scale;
        }

        let x_trial = {
            let mut v = center_primal.clone();
            for i in 0..v.len() {
                v[i] += d_primal[i];
            }
            v
        };
        let y_trial = {
            let mut v = center_dual.clone();
            for j in 0..v.len() {
                v[j] += d_dual[j];
            }
            v
        };

        let term1 = -self.instance.primal_objective_coefficients().dot(&d_primal)?;
        let term2 = self.instance.dual_objective_coefficients().dot(&d_dual)?;
        let term3 = -center_primal.dot(
            &self
                .instance
                .constraint_matrix_transpose()
                .dot(&y_trial)?,
        )?;
        let term4 = center_dual.dot(&self.instance.constraint_matrix().dot(&x_trial)?)?;

        Ok((term1 + term2 + term3 + term4) / radius)
    }

    fn skip_restart(&mut self) {
        self.state.is_enabled_restart = false;
    }

    /// Evaluated every `restart_check_interval` iterations by the core
    /// loop (the interval gating itself lives there); only evaluates the
    /// candidate if `inner_iteration >= 2`, per §4.7.
    pub fn update_restart_information(&mut self, tunables: &PdlpTunables) -> Result<(), Problem> {
        if self.state.inner_iteration < 2 {
            self.skip_restart();
            return Ok(());
        }

        let omega = self.state.primal_weight;
        let dx_current = subtract(&self.state.primal.solution, &self.state.primal.baseline)?;
        let dy_current = subtract(&self.state.dual.solution, &self.state.dual.baseline)?;
        let r_current = compute_weighted_norm(omega, &dx_current, &dy_current);

        let dx_average = subtract(&self.state.primal.average, &self.state.primal.baseline)?;
        let dy_average = subtract(&self.state.dual.average, &self.state.dual.baseline)?;
        let r_average = compute_weighted_norm(omega, &dx_average, &dy_average);

        let phi_current =
            self.compute_normalized_gap(&self.state.primal.solution, &self.state.dual.solution, r_current)?;
        let phi_average =
            self.compute_normalized_gap(&self.state.primal.average, &self.state.dual.average, r_average)?;

        let (gap, mode, source) = if phi_current < phi_average {
            (phi_current, RestartMode::Current, RestartSource::Current)
        } else {
            (phi_average, RestartMode::Average, RestartSource::Average)
        };

        self.state.primal.restart_source = source;
        self.state.dual.restart_source = source;
        self.state.restart_mode = mode;
        self.state.normalized_gap_inner_previous = self.state.normalized_gap_inner_current;
        self.state.normalized_gap_inner_current = gap;

        let sufficient = self.state.outer_iteration > 0
            && self.state.normalized_gap_inner_current
                < tunables.restart_threshold_sufficient() * self.state.normalized_gap_outer_previous;
        let necessary = self.state.outer_iteration > 0
            && self.state.normalized_gap_inner_current
                < tunables.restart_threshold_necessary() * self.state.normalized_gap_outer_previous
            && self.state.normalized_gap_inner_current > self.state.normalized_gap_inner_previous;
        let artificial = (self.state.inner_iteration as E)
            > tunables.restart_threshold_artificial() * (self.state.total_iteration as E);

        self.state.is_enabled_restart = sufficient || necessary || artificial;
        Ok(())
    }

    /// Adopts the candidate named by the just-computed restart source.
    pub fn update_restart_solution(&mut self) {
        let primal_candidate = self.state.primal.restart_candidate().clone();
        let dual_candidate = self.state.dual.restart_candidate().clone();
        self.state.primal.solution = primal_candidate;
        self.state.dual.solution = dual_candidate;
    }

    pub fn update_primal_weight(&mut self) -> Result<(), Problem> {
        let dx_dist = self.state.primal.average.distance(&self.state.primal.baseline)?;
        let dy_dist = self.state.dual.average.distance(&self.state.dual.baseline)?;
        let upper = 1.0 / EPSILON_10;
        if dx_dist > EPSILON_10 && dx_dist < upper && dy_dist > EPSILON_10 && dy_dist < upper {
            let omega = self.state.primal_weight;
            self.state.primal_weight =
                (0.5 * (dy_dist / dx_dist).ln() + 0.5 * omega.ln()).exp();
        }
        Ok(())
    }

    /// Zeroes all three iteration counters. Called once, after the
    /// throwaway pre-loop `setup_new_inner_loop` call, to start the
    /// core loop proper from a clean slate (mirrors the source's
    /// `reset_iteration`).
    pub fn reset_iteration(&mut self) {
        self.state.inner_iteration = 0;
        self.state.outer_iteration = 0;
        self.state.total_iteration = 0;
    }

    pub fn setup_new_inner_loop(&mut self) {
        if self.state.outer_iteration == 0 {
            self.state.primal.average.reset();
            self.state.dual.average.reset();
            self.state.step_size_cumulative_sum = 0.0;
        } else {
            self.state.primal.average = self.state.primal.solution.clone();
            self.state.dual.average = self.state.dual.solution.clone();
            self.state.step_size_cumulative_sum = 1.0;
        }

        self.state.outer_iteration += 1;
        self.state.inner_iteration = 0;
        self.state.primal.baseline = self.state.primal.solution.clone();
        self.state.dual.baseline = self.state.dual.solution.clone();

        self.state.normalized_gap_outer_previous = self.state.normalized_gap_outer_current;
        self.state.normalized_gap_outer_current = self.state.normalized_gap_inner_current;
        self.state.normalized_gap_inner_current = E::INFINITY;
        self.state.normalized_gap_inner_previous = E::INFINITY;
    }

    /// Refreshes reduced costs, objectives, violations, and the gap from
    /// the current running averages (§4.10).
    pub fn update_convergence_information(&mut self) -> Result<(), Problem> {
        let c = self.instance.primal_objective_coefficients();
        let b = self.instance.dual_objective_coefficients();
        let x_bar = self.state.primal.average.clone();
        let y_bar = self.state.dual.average.clone();

        let aty = self.instance.constraint_matrix_transpose().dot(&y_bar)?;
        let raw_reduced_cost = subtract(c, &aty)?;
        let mut reduced_cost = raw_reduced_cost.clone();
        for i in 0..reduced_cost.len() {
            if self.instance.is_primal_upper_unbounded()[i] {
                reduced_cost[i] = reduced_cost[i].max(0.0);
            }
            if self.instance.is_primal_lower_unbounded()[i] {
                reduced_cost[i] = reduced_cost[i].min(0.0);
            }
        }

        let primal_objective = c.dot(&x_bar)? + self.instance.objective_offset();

        let lower = self.instance.primal_lower_bounds();
        let upper = self.instance.primal_upper_bounds();
        let mut dual_correction = 0.0;
        for i in 0..reduced_cost.len() {
            let bound = if reduced_cost[i] > 0.0 {
                lower[i]
            } else {
                upper[i]
            };
            dual_correction += reduced_cost[i] * bound;
        }
        let dual_objective = b.dot(&y_bar)? + dual_correction + self.instance.objective_offset();

        let ax = self.instance.constraint_matrix().dot(&x_bar)?;
        let mut violation = subtract(b, &ax)?;
        // `less` rows are stored un-reflected (Ax <= b), so they are
        // violated when v = b - Ax is *negative*; flip the sign before
        // clamping so the violated direction is positive like the
        // `greater` block's.
        for i in self.instance.less_range() {
            violation[i] = (-violation[i]).max(0.0);
        }
        for i in self.instance.greater_range() {
            violation[i] = violation[i].max(0.0);
        }
        let primal_absolute_violation = violation.norm();
        let primal_relative_violation =
            primal_absolute_violation / (1.0 + self.state.dual.objective_coefficients_norm);

        let dual_gap_vector = subtract(&raw_reduced_cost, &reduced_cost)?;
        let dual_absolute_violation = dual_gap_vector.norm();
        let dual_relative_violation =
            dual_absolute_violation / (1.0 + self.state.primal.objective_coefficients_norm);

        let absolute_gap = (primal_objective - dual_objective).abs();
        let relative_gap =
            absolute_gap / (1.0 + primal_objective.abs() + dual_objective.abs());

        self.state.primal.reduced_cost_coefficients = reduced_cost;
        self.state.primal.objective = primal_objective;
        self.state.dual.objective = dual_objective;
        self.state.primal.absolute_violation_norm = primal_absolute_violation;
        self.state.primal.relative_violation_norm = primal_relative_violation;
        self.state.dual.absolute_violation_norm = dual_absolute_violation;
        self.state.dual.relative_violation_norm = dual_relative_violation;
        self.state.absolute_gap = absolute_gap;
        self.state.relative_gap = relative_gap;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdlp::instance::ConstraintSense;

    fn trivial_1x1() -> LpInstance {
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
    fn setup_seeds_step_size_from_inverse_norm_infty() {
        let instance = trivial_1x1();
        let manager = PdlpStateManager::setup(&instance).unwrap();
        let expected = 1.0 / instance.constraint_matrix().norm_infty();
        assert_eq!(manager.state().step_size_current, expected);
    }

    #[test]
    fn update_solution_accepts_a_step_inside_the_admissible_region() {
        let instance = trivial_1x1();
        let mut manager = PdlpStateManager::setup(&instance).unwrap();
        let tunables_options = crate::SolverOptions::new();
        let tunables = PdlpTunables::new(&tunables_options);
        manager.update_solution(&tunables).unwrap();
        assert!(manager.state().primal.solution[0] >= 0.0);
        assert!(manager.state().primal.solution[0] <= 10.0);
    }

    #[test]
    fn restart_below_interval_threshold_is_skipped() {
        let instance = trivial_1x1();
        let mut manager = PdlpStateManager::setup(&instance).unwrap();
        let tunables_options = crate::SolverOptions::new();
        let tunables = PdlpTunables::new(&tunables_options);
        manager.update_restart_information(&tunables).unwrap();
        assert!(!manager.state().is_enabled_restart);
    }
}
