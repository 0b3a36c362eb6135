//! Packaging of a finished simulation for transport.

use crate::integrator::Trajectory;
use crate::kpi::KpiSummary;
use crate::model::{A_P, A_R, E, G, X_B};
use crate::params::ParameterSet;
use crate::scenario::ScenarioPair;
use serde::Serialize;

/// Upper bound used to pick the downsampling stride.
pub const MAX_TRANSPORT_POINTS: usize = 500;
pub const SERIES_DECIMALS: i32 = 10;

/// Rounds to `decimals` places using the shortest correctly rounded decimal form.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let places = decimals.max(0) as usize;
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Every `stride`-th index from 0, plus the final index if the stride skips it.
pub fn downsample_indices(n: usize, max_points: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let stride = (n / max_points.max(1)).max(1);
    let mut indices: Vec<usize> = (0..n).step_by(stride).collect();
    if indices.last() != Some(&(n - 1)) {
        indices.push(n - 1);
    }
    indices
}

fn pick(values: &[f64], indices: &[usize]) -> Vec<f64> {
    indices
        .iter()
        .map(|&i| round_to(values[i], SERIES_DECIMALS))
        .collect()
}

/// The five state channels of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSeries {
    #[serde(rename = "Ap")]
    pub a_p: Vec<f64>,
    #[serde(rename = "Ar")]
    pub a_r: Vec<f64>,
    #[serde(rename = "E")]
    pub e: Vec<f64>,
    #[serde(rename = "Xb")]
    pub x_b: Vec<f64>,
    #[serde(rename = "G")]
    pub g: Vec<f64>,
}

impl ChannelSeries {
    fn from_trajectory(trajectory: &Trajectory, indices: &[usize]) -> Self {
        Self {
            a_p: pick(trajectory.channel(A_P), indices),
            a_r: pick(trajectory.channel(A_R), indices),
            e: pick(trajectory.channel(E), indices),
            x_b: pick(trajectory.channel(X_B), indices),
            g: pick(trajectory.channel(G), indices),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub time: Vec<f64>,
    pub ctrl: ChannelSeries,
    pub accd: ChannelSeries,
}

impl TimeSeries {
    /// Downsamples both runs on the control run's grid.
    pub fn from_pair(pair: &ScenarioPair) -> Self {
        let indices = downsample_indices(pair.control.len(), MAX_TRANSPORT_POINTS);
        Self {
            time: pick(&pair.control.times, &indices),
            ctrl: ChannelSeries::from_trajectory(&pair.control, &indices),
            accd: ChannelSeries::from_trajectory(&pair.treated, &indices),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub kpis: KpiSummary,
    #[serde(rename = "timeSeries")]
    pub time_series: TimeSeries,
    pub params: ParameterSet,
    pub mode: String,
}

impl SimulationResult {
    pub fn assemble(
        pair: &ScenarioPair,
        kpis: KpiSummary,
        params: ParameterSet,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            kpis,
            time_series: TimeSeries::from_pair(pair),
            params,
            mode: mode.into(),
        }
    }
}
