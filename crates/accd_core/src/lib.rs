//! The `accd_core` crate is the mechanistic engine behind the ACC / ethylene / ACCD model:
//! plant ACC synthesis and export, root-zone ACC deaminase activity, greenhouse ethylene,
//! and the resulting plant growth, simulated for an uninoculated control and a
//! bacteria-treated run side by side.
//!
//! Key components:
//! - **Traits**: `Scalar`, `DynamicalSystem` (vector fields), `EmbeddedStepper` (adaptive solvers).
//! - **Params**: compiled-in defaults, mode presets and override resolution.
//! - **Model**: the five-state vector field with its three switchable mechanisms.
//! - **Solvers / Integrator**: Dormand–Prince 5(4) with adaptive step control on a fixed output grid.
//! - **Scenario / KPI / Response**: paired runs, comparative indicators, transport payload.

pub mod error;
pub mod integrator;
pub mod kpi;
pub mod model;
pub mod params;
pub mod response;
pub mod scenario;
pub mod simulation;
pub mod solvers;
pub mod traits;

pub use error::SimulationError;
pub use simulation::{defaults, simulate, SimulationRequest};
