use macros::build_option_enum;

use crate::{SolverOptions, SolverState};

/// Hook invoked once per solver iteration for logging, monitoring, or early stopping.
pub trait Callback {
    /// Creates a new callback from solver options.
    fn new(options: &SolverOptions) -> Self
    where
        Self: Sized;

    /// Called at the end of each iteration with the current solver state.
    fn call(&mut self, state: &SolverState);
}

/// A callback that does nothing. Use when no per-iteration output is needed.
pub struct NoOpCallback {}

impl Callback for NoOpCallback {
    fn new(_options: &SolverOptions) -> Self {
        Self {}
    }

    fn call(&mut self, _state: &SolverState) {
        // Do nothing
    }
}

/// Prints primal and dual infeasibility to stdout each iteration.
pub struct ConvergenceOutput {}

impl Callback for ConvergenceOutput {
    fn new(_options: &SolverOptions) -> Self {
        Self {}
    }

    fn call(&mut self, state: &SolverState) {
        let txt = format!(
            "| {:4}: | {:<8.2e} | {:<8.2e} | {:<8.2e} | {:<8.2e} | {:<8.2e} | {:<8.2e} |",
            state.nit,
            state.alpha_primal,
            state.alpha_dual,
            state.get_primal_infeasibility(),
            state.get_dual_infeasibility(),
            state.get_complimentary_slackness_lower(),
            state.get_complimentary_slackness_upper(),
        );
        println!("{}", txt);
    }
}

build_option_enum!(
    trait_ = Callback,
    name = "Callbacks",
    variants = (NoOpCallback, ConvergenceOutput),
    new_arguments = (&SolverOptions,),
    doc_header = "An enum representing different callbacks for the optimization solver. Each variant corresponds to a specific callback strategy."
);

/// Prints the PDLP log table described in its core's option table
/// (`Iteration | Step Size | Primal Objective (Violation) | Dual
/// Objective (Violation) | Gap`), gated by the `verbose` option.
///
/// PDLP's iteration state (`pdlp::state::PdlpState`) has no counterpart
/// in [`SolverState`] — it carries averaged/trial/baseline primal-dual
/// blocks and a restart controller, none of which fit the IPM-shaped
/// fields [`SolverState`] exposes — so this does not implement
/// [`Callback`]. It lives here rather than in `pdlp::core` because the
/// println!-table idiom belongs with [`ConvergenceOutput`], the
/// pattern it is grounded on.
pub struct PdlpConvergenceOutput {
    verbose: bool,
}

impl PdlpConvergenceOutput {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn is_enabled(&self) -> bool {
        self.verbose
    }

    pub fn header(&self) {
        if !self.verbose {
            return;
        }
        println!(
            "---------+-----------+-----------------------+------------------------+----------"
        );
        println!(
            "Iteration| Step Size |        Primal         |         Dual           |   Gap   "
        );
        println!(
            "         |           | Objective (Violation) | Objective (Violation)  |         "
        );
        println!(
            "---------+-----------+-----------------------+------------------------+----------"
        );
    }

    pub fn footer(&self) {
        if !self.verbose {
            return;
        }
        println!(
            "---------+-----------+-----------------------+------------------------+----------"
        );
        println!(" -- c: Restarts from the current solution.");
        println!(" -- a: Restarts from the averaged solution.");
        println!(" -- *: Meets the specified convergence criteria.");
    }

    /// One table row. `label` is `" INITIAL"` for the pre-loop row;
    /// pass `None` for `iteration`/`restart_marker` in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn row(
        &self,
        label: &str,
        iteration: Option<usize>,
        restart_marker: char,
        step_size: f64,
        primal_objective: f64,
        primal_relative_violation: f64,
        dual_objective: f64,
        dual_relative_violation_displayed: f64,
        relative_gap: f64,
        tolerance: f64,
    ) {
        if !self.verbose {
            return;
        }
        let mark_primal = if primal_relative_violation < tolerance {
            '*'
        } else {
            ' '
        };
        let mark_dual = if dual_relative_violation_displayed < tolerance {
            '*'
        } else {
            ' '
        };
        let mark_converge = if relative_gap < tolerance { '*' } else { ' ' };

        let prefix = match iteration {
            Some(iteration) => format!("{:8}{}", iteration, restart_marker),
            None => format!("{:8}", label),
        };

        println!(
            "{prefix}|  {:8.2e} |{}{:11.4e} ({:8.2e})|{}{:11.4e} ({:8.2e})|{}{:8.3e}",
            step_size,
            mark_primal,
            primal_objective,
            primal_relative_violation,
            mark_dual,
            dual_objective,
            dual_relative_violation_displayed,
            mark_converge,
            relative_gap,
        );
    }
}
