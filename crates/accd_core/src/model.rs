//! Right-hand side of the five-state ACC / ethylene / ACCD system.
//!
//! State layout: `[A_p, A_r, E, X_b, G]`
//! - `A_p`: plant intracellular ACC
//! - `A_r`: root-zone ACC
//! - `E`: greenhouse air ethylene
//! - `X_b`: ACCD bacterial biomass
//! - `G`: plant growth index
//!
//! Export is gradient driven and one-way: when root-zone ACCD lowers `A_r`,
//! the plant-to-root gradient steepens, plant ACC drops and less ethylene is made.

use crate::params::ParameterSet;
use crate::traits::DynamicalSystem;

pub const STATE_DIM: usize = 5;

pub const A_P: usize = 0;
pub const A_R: usize = 1;
pub const E: usize = 2;
pub const X_B: usize = 3;
pub const G: usize = 4;

const FEEDBACK_FLOOR: f64 = 1e-20;
const ETHYLENE_FLOOR: f64 = 1e-15;

/// Intermediate rates behind one evaluation of the vector field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fluxes {
    /// ACS repression factor in (0, 1]; exactly 1 with feedback off.
    pub acs_feedback: f64,
    pub k_aco_eff: f64,
    pub v_acs_eff: f64,
    pub export: f64,
    pub v_direct: f64,
    pub v_rhizo: f64,
    /// Hill inhibition of growth by ethylene, in (0, 1].
    pub growth_factor: f64,
}

/// The coupled plant / root zone / greenhouse model for one resolved parameter set.
#[derive(Debug, Clone, Copy)]
pub struct AccdModel {
    params: ParameterSet,
}

impl AccdModel {
    pub fn new(params: ParameterSet) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// `1 / (1 + (E / K)^n)`, with `K` floored away from zero.
    fn repression(e: f64, k: f64, n: f64) -> f64 {
        1.0 / (1.0 + (e / k.max(FEEDBACK_FLOOR)).powf(n))
    }

    pub fn fluxes(&self, state: &[f64]) -> Fluxes {
        let p = &self.params;
        let [a_p, a_r, e, x_b, _g] = clamp_state(state);

        let acs_feedback = if p.fb_enable.is_on() {
            Self::repression(e, p.k_fb, p.n_fb)
        } else {
            1.0
        };

        let k_aco_eff = if p.aco_fb_enable.is_on() {
            p.k_aco * Self::repression(e, p.k_fb_aco, p.n_fb_aco)
        } else {
            p.k_aco
        };

        let v_acs_eff = p.v_acs * p.f_stress * acs_feedback;

        let a_r_plant_equiv = if p.vp_vr > 0.0 { a_r / p.vp_vr } else { 0.0 };
        let export = p.k_exp * (a_p - a_r_plant_equiv).max(0.0);

        let f_dir = p.f_direct.clamp(0.0, 1.0);
        let x_b_direct = f_dir * x_b;
        let x_b_rhizo = (1.0 - f_dir) * x_b;

        let v_direct = if f_dir > 0.0 {
            x_b_direct * p.v_max_accd_direct * a_p / (p.k_m_accd_direct + a_p)
        } else {
            0.0
        };
        let v_rhizo = x_b_rhizo * p.v_max_accd * a_r / (p.k_m_accd + a_r);

        let k_n = p.k_e.powf(p.n_hill);
        let growth_factor = k_n / (k_n + e.max(ETHYLENE_FLOOR).powf(p.n_hill));

        Fluxes {
            acs_feedback,
            k_aco_eff,
            v_acs_eff,
            export,
            v_direct,
            v_rhizo,
            growth_factor,
        }
    }

    pub fn rates(&self, state: &[f64]) -> [f64; STATE_DIM] {
        let p = &self.params;
        let [a_p, a_r, e, x_b, _g] = clamp_state(state);
        let f = self.fluxes(state);

        let d_ap = f.v_acs_eff - f.k_aco_eff * a_p - f.export - f.v_direct;
        let d_ar = f.export * p.vp_vr - f.v_rhizo - p.k_loss * a_r;
        let d_e = p.y_eth * f.k_aco_eff * a_p * p.vp_vair - (p.k_vent + p.k_scrub) * e;
        // Monod growth on root-zone ACC acts on the whole population
        let d_xb = p.mu_max * a_r / (p.k_s + a_r) * x_b - p.k_d * x_b;
        let d_g = p.r_g * f.growth_factor;

        [d_ap, d_ar, d_e, d_xb, d_g]
    }
}

impl DynamicalSystem<f64> for AccdModel {
    fn dimension(&self) -> usize {
        STATE_DIM
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out.copy_from_slice(&self.rates(x));
    }
}

/// Negative excursions from solver overshoot are clipped before any rate is formed.
fn clamp_state(state: &[f64]) -> [f64; STATE_DIM] {
    let mut clamped = [0.0; STATE_DIM];
    for (dst, &src) in clamped.iter_mut().zip(state) {
        *dst = src.max(0.0);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::{AccdModel, A_P, A_R, E, G, X_B};
    use crate::params::{Flag, ParameterSet};
    use crate::traits::DynamicalSystem;

    const DEFAULT_STATE: [f64; 5] = [0.01, 0.0, 0.0, 0.5, 1.0];

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn default_rates_at_t0() {
        let model = AccdModel::new(ParameterSet::default());
        let mut out = [0.0; 5];
        model.apply(0.0, &DEFAULT_STATE, &mut out);

        assert_close(model.fluxes(&DEFAULT_STATE).export, 0.001);
        assert_close(out[A_P], 0.146);
        assert_close(out[A_R], 0.0001);
        assert_close(out[E], 3e-6);
        assert_close(out[X_B], -0.005);
        assert_close(out[G], 0.02);
    }

    #[test]
    fn acs_feedback_is_unity_when_disabled() {
        let model = AccdModel::new(ParameterSet::default());
        for e in [0.0, 1e-6, 2e-4, 1.0, 1e6] {
            let state = [0.1, 0.0, e, 0.0, 1.0];
            assert_eq!(model.fluxes(&state).acs_feedback, 1.0);
        }
    }

    #[test]
    fn acs_feedback_halves_synthesis_at_threshold() {
        let params = ParameterSet {
            fb_enable: Flag(true),
            ..ParameterSet::default()
        };
        let model = AccdModel::new(params);
        let state = [0.1, 0.0, params.k_fb, 0.0, 1.0];
        let fluxes = model.fluxes(&state);
        assert_close(fluxes.acs_feedback, 0.5);
        assert_close(fluxes.v_acs_eff, 0.5 * params.v_acs * params.f_stress);
    }

    #[test]
    fn aco_feedback_scales_oxidase_rate() {
        let params = ParameterSet {
            aco_fb_enable: Flag(true),
            ..ParameterSet::default()
        };
        let model = AccdModel::new(params);
        let state = [0.1, 0.0, params.k_fb_aco, 0.0, 1.0];
        assert_close(model.fluxes(&state).k_aco_eff, 0.5 * params.k_aco);
    }

    #[test]
    fn zero_feedback_constant_is_floored() {
        let params = ParameterSet {
            fb_enable: Flag(true),
            k_fb: 0.0,
            ..ParameterSet::default()
        };
        let model = AccdModel::new(params);
        let fluxes = model.fluxes(&[0.1, 0.0, 0.0, 0.0, 1.0]);
        assert!(fluxes.acs_feedback.is_finite());
    }

    #[test]
    fn export_never_reverses() {
        let model = AccdModel::new(ParameterSet::default());
        // root zone far above plant-equivalent concentration
        let fluxes = model.fluxes(&[0.01, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(fluxes.export, 0.0);
    }

    #[test]
    fn export_ignores_root_zone_when_volume_ratio_is_zero() {
        let params = ParameterSet {
            vp_vr: 0.0,
            ..ParameterSet::default()
        };
        let model = AccdModel::new(params);
        assert_close(model.fluxes(&[0.2, 5.0, 0.0, 0.0, 1.0]).export, 0.02);
    }

    #[test]
    fn direct_sink_splits_biomass() {
        let params = ParameterSet {
            f_direct: 0.5,
            ..ParameterSet::default()
        };
        let model = AccdModel::new(params);
        let state = [1.5, 1.5, 0.0, 2.0, 1.0];
        let fluxes = model.fluxes(&state);
        // 1.0 g acting on each side, both at Km
        assert_close(fluxes.v_direct, 0.5);
        assert_close(fluxes.v_rhizo, 0.5);
    }

    #[test]
    fn direct_fraction_is_clamped_to_unit_interval() {
        let params = ParameterSet {
            f_direct: 3.0,
            ..ParameterSet::default()
        };
        let model = AccdModel::new(params);
        let fluxes = model.fluxes(&[1.5, 1.5, 0.0, 2.0, 1.0]);
        assert_close(fluxes.v_direct, 1.0);
        assert_eq!(fluxes.v_rhizo, 0.0);
    }

    #[test]
    fn negative_state_is_clamped_before_use() {
        let model = AccdModel::new(ParameterSet::default());
        let clamped = model.rates(&[0.0, 0.0, 0.0, 0.0, 0.0]);
        let negative = model.rates(&[-1.0, -1.0, -1.0, -1.0, -1.0]);
        assert_eq!(clamped, negative);
    }

    #[test]
    fn biomass_is_stationary_without_bacteria() {
        let model = AccdModel::new(ParameterSet::default());
        let rates = model.rates(&[0.3, 0.5, 1e-4, 0.0, 2.0]);
        assert_eq!(rates[X_B], 0.0);
    }

    #[test]
    fn growth_rate_is_halved_at_ic50() {
        let params = ParameterSet::default();
        let model = AccdModel::new(params);
        let rates = model.rates(&[0.0, 0.0, params.k_e, 0.0, 1.0]);
        assert_close(rates[G], 0.5 * params.r_g);
    }
}
