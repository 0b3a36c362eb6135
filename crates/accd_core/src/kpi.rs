//! Comparative indicators between the control and treated runs.

use crate::integrator::Trajectory;
use crate::model::{E, G};
use crate::params::ParameterSet;
use crate::response::round_to;
use crate::scenario::ScenarioPair;
use serde::Serialize;

/// Export permeability above which the high-export mechanism counts as active.
pub const HIGH_EXPORT_THRESHOLD: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    HighExport,
    Endophytic,
    Feedback,
}

impl Mechanism {
    /// Classifies the parameter set alone; the mode name plays no part.
    pub fn active(params: &ParameterSet) -> Vec<Mechanism> {
        let mut active = Vec::new();
        if params.k_exp > HIGH_EXPORT_THRESHOLD {
            active.push(Mechanism::HighExport);
        }
        if params.f_direct > 0.0 {
            active.push(Mechanism::Endophytic);
        }
        if params.fb_enable.is_on() {
            active.push(Mechanism::Feedback);
        }
        active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    #[serde(rename = "peakCtrl")]
    pub peak_ctrl: f64,
    #[serde(rename = "peakACCD")]
    pub peak_accd: f64,
    #[serde(rename = "tPeakCtrl")]
    pub t_peak_ctrl: f64,
    #[serde(rename = "tPeakACCD")]
    pub t_peak_accd: f64,
    #[serde(rename = "reductionPeakPct")]
    pub reduction_peak_pct: f64,
    #[serde(rename = "ssCtrl")]
    pub ss_ctrl: f64,
    #[serde(rename = "ssACCD")]
    pub ss_accd: f64,
    #[serde(rename = "reductionSSPct")]
    pub reduction_ss_pct: f64,
    #[serde(rename = "growthCtrl")]
    pub growth_ctrl: f64,
    #[serde(rename = "growthACCD")]
    pub growth_accd: f64,
    #[serde(rename = "growthImprovePct")]
    pub growth_improve_pct: f64,
    #[serde(rename = "exportFractionPct")]
    pub export_fraction_pct: f64,
    #[serde(rename = "activeMechanisms")]
    pub active_mechanisms: Vec<Mechanism>,
}

/// `100 * (1 - treated / control)`, or 0 when the control value is not positive.
pub fn reduction_pct(control: f64, treated: f64) -> f64 {
    if control > 0.0 {
        (1.0 - treated / control) * 100.0
    } else {
        0.0
    }
}

/// `100 * (treated - control) / control`, or 0 when the control value is not positive.
pub fn improvement_pct(control: f64, treated: f64) -> f64 {
    if control > 0.0 {
        (treated - control) / control * 100.0
    } else {
        0.0
    }
}

/// Share of plant ACC leaving by export rather than oxidation, in percent.
pub fn export_fraction_pct(params: &ParameterSet) -> f64 {
    let total = params.k_exp + params.k_aco;
    if total == 0.0 {
        0.0
    } else {
        100.0 * params.k_exp / total
    }
}

pub fn compute_kpis(pair: &ScenarioPair, params: &ParameterSet) -> KpiSummary {
    let (t_peak_ctrl, peak_ctrl) = pair.control.peak(E);
    let (t_peak_accd, peak_accd) = pair.treated.peak(E);
    let ss_ctrl = pair.control.final_value(E);
    let ss_accd = pair.treated.final_value(E);
    let (growth_ctrl, growth_accd) = final_growth(&pair.control, &pair.treated);

    KpiSummary {
        peak_ctrl: round_to(peak_ctrl, 8),
        peak_accd: round_to(peak_accd, 8),
        t_peak_ctrl: round_to(t_peak_ctrl, 2),
        t_peak_accd: round_to(t_peak_accd, 2),
        reduction_peak_pct: round_to(reduction_pct(peak_ctrl, peak_accd), 2),
        ss_ctrl: round_to(ss_ctrl, 8),
        ss_accd: round_to(ss_accd, 8),
        reduction_ss_pct: round_to(reduction_pct(ss_ctrl, ss_accd), 2),
        growth_ctrl: round_to(growth_ctrl, 6),
        growth_accd: round_to(growth_accd, 6),
        growth_improve_pct: round_to(improvement_pct(growth_ctrl, growth_accd), 2),
        export_fraction_pct: round_to(export_fraction_pct(params), 2),
        active_mechanisms: Mechanism::active(params),
    }
}

fn final_growth(control: &Trajectory, treated: &Trajectory) -> (f64, f64) {
    (control.final_value(G), treated.final_value(G))
}
