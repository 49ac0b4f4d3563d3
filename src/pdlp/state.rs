use std::fmt;
use std::str::FromStr;

use derive_more::{Display, Error};

use crate::E;

use super::sparse::Vector;

/// Which buffer a restart, if it fires, would adopt from: the latest
/// iterate or the running average. Stored per [`PrimalDualBlock`]
/// instead of a non-owning pointer into the state (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartSource {
    #[default]
    Current,
    Average,
}

/// The mode a restart actually adopted: which of the two candidate
/// buffers had the smaller normalized gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartMode {
    #[default]
    Current,
    Average,
}

impl RestartMode {
    /// The one-character log marker: `'c'` or `'a'`.
    pub fn marker(self) -> char {
        match self {
            RestartMode::Current => 'c',
            RestartMode::Average => 'a',
        }
    }
}

/// All vectors and scalars belonging to one side (primal or dual) of
/// the saddle-point iteration.
#[derive(Debug, Clone)]
pub struct PrimalDualBlock {
    pub solution: Vector,
    pub trial: Vector,
    pub average: Vector,
    pub baseline: Vector,
    pub move_: Vector,
    pub direction: Vector,
    pub lagrangian_coefficients: Vector,
    pub reduced_cost_coefficients: Vector,
    pub buffer: Vector,

    pub objective: E,
    pub absolute_violation_norm: E,
    pub relative_violation_norm: E,
    pub objective_coefficients_norm: E,
    pub objective_lower_bound: E,
    pub objective_upper_bound: E,

    pub restart_source: RestartSource,
}

impl PrimalDualBlock {
    pub fn new(size: usize) -> Self {
        Self {
            solution: Vector::zeros(size),
            trial: Vector::zeros(size),
            average: Vector::zeros(size),
            baseline: Vector::zeros(size),
            move_: Vector::zeros(size),
            direction: Vector::zeros(size),
            lagrangian_coefficients: Vector::zeros(size),
            reduced_cost_coefficients: Vector::zeros(size),
            buffer: Vector::zeros(size),
            objective: 0.0,
            absolute_violation_norm: 0.0,
            relative_violation_norm: 0.0,
            objective_coefficients_norm: 0.0,
            objective_lower_bound: E::NEG_INFINITY,
            objective_upper_bound: E::INFINITY,
            restart_source: RestartSource::Current,
        }
    }

    /// The buffer named by `restart_source`.
    pub fn restart_candidate(&self) -> &Vector {
        match self.restart_source {
            RestartSource::Current => &self.solution,
            RestartSource::Average => &self.average,
        }
    }
}

/// The closed set of termination outcomes, initially `IterationOver` so
/// that an unconditionally-exited loop reports the right default (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdlpTerminationStatus {
    Interruption,
    TimeOver,
    #[default]
    IterationOver,
    Optimal,
    Infeasible,
}

impl PdlpTerminationStatus {
    fn canonical_str(self) -> &'static str {
        match self {
            PdlpTerminationStatus::Interruption => "INTERRUPTION",
            PdlpTerminationStatus::TimeOver => "TIME_OVER",
            PdlpTerminationStatus::IterationOver => "ITERATION_OVER",
            PdlpTerminationStatus::Optimal => "OPTIMAL",
            PdlpTerminationStatus::Infeasible => "INFEASIBLE",
        }
    }
}

impl fmt::Display for PdlpTerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("unrecognized PDLP termination status: `{_0}`")]
pub struct UnknownTerminationStatus(String);

impl FromStr for PdlpTerminationStatus {
    type Err = UnknownTerminationStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INTERRUPTION" => Ok(PdlpTerminationStatus::Interruption),
            "TIME_OVER" => Ok(PdlpTerminationStatus::TimeOver),
            "ITERATION_OVER" => Ok(PdlpTerminationStatus::IterationOver),
            "OPTIMAL" => Ok(PdlpTerminationStatus::Optimal),
            "INFEASIBLE" => Ok(PdlpTerminationStatus::Infeasible),
            other => Err(UnknownTerminationStatus(other.to_string())),
        }
    }
}

/// Iteration-local vectors, scalars, and counters for one core run.
pub struct PdlpState {
    pub primal: PrimalDualBlock,
    pub dual: PrimalDualBlock,

    pub inner_iteration: usize,
    pub outer_iteration: usize,
    pub total_iteration: usize,
    pub number_of_solution_update_attempts: usize,

    pub elapsed_time: f64,

    pub absolute_gap: E,
    pub relative_gap: E,

    pub step_size_current: E,
    pub step_size_previous: E,
    pub step_size_cumulative_sum: E,

    pub primal_weight: E,

    pub normalized_gap_inner_current: E,
    pub normalized_gap_inner_previous: E,
    pub normalized_gap_outer_current: E,
    pub normalized_gap_outer_previous: E,

    pub is_enabled_restart: bool,
    pub restart_mode: RestartMode,

    pub termination_status: PdlpTerminationStatus,
}

impl PdlpState {
    pub fn new(number_of_primal_variables: usize, number_of_constraints: usize) -> Self {
        Self {
            primal: PrimalDualBlock::new(number_of_primal_variables),
            dual: PrimalDualBlock::new(number_of_constraints),
            inner_iteration: 0,
            outer_iteration: 0,
            total_iteration: 0,
            number_of_solution_update_attempts: 0,
            elapsed_time: 0.0,
            absolute_gap: E::INFINITY,
            relative_gap: E::INFINITY,
            step_size_current: 1.0,
            step_size_previous: 1.0,
            step_size_cumulative_sum: 0.0,
            primal_weight: 1.0,
            normalized_gap_inner_current: E::INFINITY,
            normalized_gap_inner_previous: E::INFINITY,
            normalized_gap_outer_current: E::INFINITY,
            normalized_gap_outer_previous: E::INFINITY,
            is_enabled_restart: false,
            restart_mode: RestartMode::Current,
            termination_status: PdlpTerminationStatus::IterationOver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termination_status_round_trips_through_its_string_form() {
        for status in [
            PdlpTerminationStatus::Interruption,
            PdlpTerminationStatus::TimeOver,
            PdlpTerminationStatus::IterationOver,
            PdlpTerminationStatus::Optimal,
            PdlpTerminationStatus::Infeasible,
        ] {
            let parsed: PdlpTerminationStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn default_termination_status_is_iteration_over() {
        assert_eq!(
            PdlpTerminationStatus::default(),
            PdlpTerminationStatus::IterationOver
        );
    }

    #[test]
    fn restart_candidate_follows_restart_source() {
        let mut block = PrimalDualBlock::new(2);
        block.solution[0] = 1.0;
        block.average[0] = 2.0;
        assert_eq!(block.restart_candidate()[0], 1.0);
        block.restart_source = RestartSource::Average;
        assert_eq!(block.restart_candidate()[0], 2.0);
    }
}
