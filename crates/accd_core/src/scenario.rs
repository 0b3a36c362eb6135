use crate::error::Result;
use crate::integrator::{integrate, IntegratorOptions, Trajectory};
use crate::model::AccdModel;
use crate::params::{InitialConditions, ParameterSet, SimulationSettings};

/// Which of the two parallel runs a trajectory belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// No bacteria: `X_b(0) = 0`.
    Control,
    /// Inoculated with ACCD bacteria at the resolved `X_b0`.
    Treated,
}

impl Scenario {
    pub fn label(self) -> &'static str {
        match self {
            Scenario::Control => "control",
            Scenario::Treated => "treated",
        }
    }

    pub fn initial_state(self, ics: &InitialConditions) -> [f64; 5] {
        match self {
            Scenario::Control => ics.control_state(),
            Scenario::Treated => ics.treated_state(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPair {
    pub control: Trajectory,
    pub treated: Trajectory,
}

/// Integrates one scenario over the settings' sampling grid.
pub fn run_scenario(
    scenario: Scenario,
    params: &ParameterSet,
    ics: &InitialConditions,
    settings: &SimulationSettings,
    options: &IntegratorOptions,
) -> Result<Trajectory> {
    settings.validate()?;
    let model = AccdModel::new(*params);
    let y0 = scenario.initial_state(ics);
    let times = settings.sample_times();

    log::debug!(
        "integrating {} scenario over [0, {}] h with {} samples",
        scenario.label(),
        settings.t_end,
        settings.n_points
    );
    let trajectory = integrate(&model, &y0, &times, options).map_err(|err| {
        log::warn!("{} scenario failed: {err}", scenario.label());
        err.in_scenario(scenario.label())
    })?;
    log::debug!(
        "{} scenario done: {} accepted, {} rejected steps",
        scenario.label(),
        trajectory.accepted_steps,
        trajectory.rejected_steps
    );
    Ok(trajectory)
}

/// Runs control then treated with identical parameters; either failure aborts both.
pub fn run_scenarios(
    params: &ParameterSet,
    ics: &InitialConditions,
    settings: &SimulationSettings,
    options: &IntegratorOptions,
) -> Result<ScenarioPair> {
    let control = run_scenario(Scenario::Control, params, ics, settings, options)?;
    let treated = run_scenario(Scenario::Treated, params, ics, settings, options)?;
    Ok(ScenarioPair { control, treated })
}
