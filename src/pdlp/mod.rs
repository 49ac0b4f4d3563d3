//! # Primal-Dual Hybrid Gradient (PDLP) core for linear programming
//!
//! Solves `min cᵀx s.t. A x {≤,=,≥} b, ℓ ≤ x ≤ u` by alternating
//! primal/dual gradient steps on the saddle-point Lagrangian, with
//! adaptive step-size selection, running-average iterates, and
//! adaptive restart driven by a normalized duality gap.
//!
//! ## Acknowledgment
//!
//! The algorithm follows the PDLP method described in:
//!
//! > D. Applegate, M. Díaz, O. Hinder, H. Lu, M. Lubin, B. O'Donoghue,
//! > W. Schudy, "Practical Large-Scale Linear Programming using Primal-
//! > Dual Hybrid Gradient", *NeurIPS* 2021.
//!
//! This module is an independent implementation written from scratch in
//! Rust; the algorithmic ideas and mathematical formulations used here
//! are not subject to copyright.
//!
//! ## Pipeline
//!
//! 1. Build an [`instance::LpInstance`] in standard-sense form.
//! 2. Call [`instance::LpInstance::scaling`] (Ruiz, optionally followed
//!    by Pock-Chambolle).
//! 3. [`core::PdlpCore::setup`] the core against the scaled instance and
//!    a [`options::PdlpTunables`] snapshot, then [`core::PdlpCore::run`].
//! 4. Read [`core::PdlpCore::result`] and, if the caller needs the
//!    solution in the original (unscaled) problem's units, call
//!    [`result::PdlpResult::unscale`] with the instance's row/column
//!    scalers.

pub mod core;
pub mod error;
pub mod instance;
pub mod options;
pub mod result;
pub mod sparse;
pub mod state;
pub mod state_manager;

pub use core::PdlpCore;
pub use instance::{ConstraintSense, LpInstance};
pub use options::PdlpTunables;
pub use result::PdlpResult;
pub use state::{PdlpTerminationStatus, RestartMode};
