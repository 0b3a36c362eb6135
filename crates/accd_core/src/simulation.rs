//! The single entry point used by transport layers.

use crate::error::Result;
use crate::integrator::IntegratorOptions;
use crate::kpi::compute_kpis;
use crate::params::{InitialConditions, Mode, ParameterSet, SimulationSettings};
use crate::response::SimulationResult;
use crate::scenario::run_scenarios;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_MODE: &str = "baseline";

/// Already-filtered inputs: only keys the caller actually supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    pub mode: String,
    pub params: BTreeMap<String, f64>,
    pub ics: BTreeMap<String, f64>,
    pub sim: BTreeMap<String, f64>,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            mode: DEFAULT_MODE.to_string(),
            params: BTreeMap::new(),
            ics: BTreeMap::new(),
            sim: BTreeMap::new(),
        }
    }
}

/// Resolves inputs, runs control and treated scenarios, and packages the comparison.
pub fn simulate(request: &SimulationRequest) -> Result<SimulationResult> {
    simulate_with_options(request, &IntegratorOptions::default())
}

pub fn simulate_with_options(
    request: &SimulationRequest,
    options: &IntegratorOptions,
) -> Result<SimulationResult> {
    let params = ParameterSet::resolve(&request.mode, &request.params);
    let ics = InitialConditions::default().with_overrides(&request.ics);
    let settings = SimulationSettings::default().with_overrides(&request.sim);
    settings.validate()?;

    if Mode::parse(&request.mode).is_none() {
        log::debug!("unrecognized mode `{}`, no preset applied", request.mode);
    }

    let pair = run_scenarios(&params, &ics, &settings, options)?;
    let kpis = compute_kpis(&pair, &params);
    Ok(SimulationResult::assemble(&pair, kpis, params, request.mode.clone()))
}

/// Compiled-in tables, echoed verbatim for discovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Defaults {
    pub params: ParameterSet,
    pub ics: InitialConditions,
    pub sim: SimulationSettings,
    pub modes: Vec<&'static str>,
    pub mode_presets: BTreeMap<&'static str, BTreeMap<&'static str, f64>>,
}

pub fn defaults() -> Defaults {
    Defaults {
        params: ParameterSet::default(),
        ics: InitialConditions::default(),
        sim: SimulationSettings::default(),
        modes: Mode::ALL.iter().map(|mode| mode.name()).collect(),
        mode_presets: Mode::preset_table(),
    }
}
