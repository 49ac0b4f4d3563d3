use crate::E;

use super::options::PdlpTunables;
use super::sparse::Diagonal;
use super::state::{PdlpState, PdlpTerminationStatus, PrimalDualBlock};

/// Immutable snapshot of a completed core run: the terminal primal/dual
/// convergence metrics, iteration count, elapsed time, and termination
/// status (§4.12). Independent of the [`super::state_manager::PdlpStateManager`]
/// once built.
#[derive(Debug, Clone)]
pub struct PdlpResult {
    number_of_iterations: usize,
    elapsed_time: f64,
    primal: PrimalDualBlock,
    dual: PrimalDualBlock,
    termination_status: PdlpTerminationStatus,
    tolerance: E,
}

impl PdlpResult {
    pub(super) fn from_state(state: &PdlpState, tunables: &PdlpTunables) -> Self {
        Self {
            number_of_iterations: state.total_iteration,
            elapsed_time: state.elapsed_time,
            primal: state.primal.clone(),
            dual: state.dual.clone(),
            termination_status: state.termination_status,
            tolerance: tunables.tolerance(),
        }
    }

    pub fn number_of_iterations(&self) -> usize {
        self.number_of_iterations
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn primal(&self) -> &PrimalDualBlock {
        &self.primal
    }

    pub fn dual(&self) -> &PrimalDualBlock {
        &self.dual
    }

    pub fn termination_status(&self) -> PdlpTerminationStatus {
        self.termination_status
    }

    pub fn tolerance(&self) -> E {
        self.tolerance
    }

    /// Reverses the composite Ruiz/Pock-Chambolle preprocessing scaling
    /// accumulated on the constraint matrix: the user-space averaged
    /// primal solution is `C ⊙ x̄` and the user-space averaged dual
    /// solution is `R ⊙ ȳ`, where `C`/`R` are the column/row scalers
    /// that [`super::instance::LpInstance::scaling`] composed into the
    /// matrix (§4.12). Returns a fresh pair rather than mutating the
    /// stored averages, since the result is meant to be read afterwards
    /// in either scaled or unscaled form.
    pub fn unscale(
        &self,
        row_scaler: &Diagonal,
        column_scaler: &Diagonal,
    ) -> Result<(super::sparse::Vector, super::sparse::Vector), problemo::Problem> {
        let x = column_scaler.apply(&self.primal.average)?;
        let y = row_scaler.apply(&self.dual.average)?;
        Ok((x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdlp::instance::{ConstraintSense, LpInstance};
    use crate::pdlp::core::PdlpCore;
    use crate::SolverOptions;

    #[test]
    fn unscale_reproduces_the_identity_when_no_scaling_was_applied() {
        let instance = LpInstance::new(
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
        .unwrap();
        let tunables = PdlpTunables::new(&SolverOptions::new());
        let mut core = PdlpCore::setup(&instance, tunables).unwrap();
        core.run().unwrap();
        let result = core.result();
        let (x, y) = result
            .unscale(instance.row_scaler(), instance.column_scaler())
            .unwrap();
        assert!((x[0] - result.primal().average[0]).abs() < 1e-12);
        assert!((y[0] - result.dual().average[0]).abs() < 1e-12);
    }
}
