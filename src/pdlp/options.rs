use macros::{explicit_options, use_option};

use crate::{E, I, SolverOptions};

/// The PDLP core's tunables, pulled from the shared option registry the
/// same way `AdaptiveMuUpdate`/`line_search` pull theirs: every field is
/// registered via `#[use_option(...)]` and populated from a
/// [`SolverOptions`] snapshot at construction time.
#[explicit_options(name = PdlpOptions)]
#[use_option(name = "tolerance", type_ = E, default = "1e-8", description = "Relative tolerance for primal/dual violation and duality gap at which OPTIMAL is declared")]
#[use_option(name = "time_max", type_ = E, default = "3600.0", description = "Wall-clock cap in seconds used internally by the core")]
#[use_option(name = "time_offset", type_ = E, default = "0.0", description = "Offset added to elapsed_time before comparison to a surrounding global time budget")]
#[use_option(name = "iteration_max", type_ = I, default = "100000", description = "Cap on total_iteration")]
#[use_option(name = "restart_check_interval", type_ = I, default = "40", description = "Iterations between restart evaluations")]
#[use_option(name = "convergence_check_interval", type_ = I, default = "40", description = "Iterations between convergence refreshes")]
#[use_option(name = "log_interval", type_ = I, default = "100", description = "Iterations between log row emissions; also forces a convergence refresh")]
#[use_option(name = "counts_of_ruiz_scaling", type_ = I, default = "10", description = "Number of Ruiz passes during preprocessing")]
#[use_option(name = "is_enabled_pock_chambolle_scaling", type_ = bool, default = "true", description = "Whether to apply a Pock-Chambolle pass after Ruiz")]
#[use_option(name = "step_size_reduce_exponent", type_ = E, default = "-0.3", description = "Negative exponent p_red in the step-size candidate")]
#[use_option(name = "step_size_extend_exponent", type_ = E, default = "-0.6", description = "Negative exponent p_ext in the step-size candidate")]
#[use_option(name = "restart_threshold_sufficient", type_ = E, default = "0.1", description = "Sufficient-decrease ratio beta_suff")]
#[use_option(name = "restart_threshold_necessary", type_ = E, default = "0.9", description = "Necessary-decrease ratio beta_nec")]
#[use_option(name = "restart_threshold_artificial", type_ = E, default = "0.5", description = "Artificial-cap fraction beta_art")]
#[use_option(name = "verbose", type_ = bool, default = "false", description = "Whether the core emits a log header, per-iteration rows, and a footer")]
pub struct PdlpTunables {}

impl PdlpTunables {
    pub fn new(options: &SolverOptions) -> Self {
        Self {
            options: options.into(),
        }
    }

    pub fn tolerance(&self) -> E {
        self.options.tolerance
    }

    pub fn time_max(&self) -> E {
        self.options.time_max
    }

    pub fn time_offset(&self) -> E {
        self.options.time_offset
    }

    pub fn iteration_max(&self) -> I {
        self.options.iteration_max
    }

    pub fn restart_check_interval(&self) -> I {
        self.options.restart_check_interval
    }

    pub fn convergence_check_interval(&self) -> I {
        self.options.convergence_check_interval
    }

    pub fn log_interval(&self) -> I {
        self.options.log_interval
    }

    pub fn counts_of_ruiz_scaling(&self) -> I {
        self.options.counts_of_ruiz_scaling
    }

    pub fn is_enabled_pock_chambolle_scaling(&self) -> bool {
        self.options.is_enabled_pock_chambolle_scaling
    }

    pub fn step_size_reduce_exponent(&self) -> E {
        self.options.step_size_reduce_exponent
    }

    pub fn step_size_extend_exponent(&self) -> E {
        self.options.step_size_extend_exponent
    }

    pub fn restart_threshold_sufficient(&self) -> E {
        self.options.restart_threshold_sufficient
    }

    pub fn restart_threshold_necessary(&self) -> E {
        self.options.restart_threshold_necessary
    }

    pub fn restart_threshold_artificial(&self) -> E {
        self.options.restart_threshold_artificial
    }

    pub fn verbose(&self) -> bool {
        self.options.verbose
    }
}
