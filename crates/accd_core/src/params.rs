//! Parameter resolution: compiled-in defaults, named mode presets, explicit overrides.
//!
//! Each stage returns a new value; the defaults table itself is never mutated.
//! Unknown mode names apply no preset and unknown override keys are skipped.
//! Values are passed through without plausibility checks.

use crate::error::{Result, SimulationError};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// An on/off switch that travels over the wire as the integer 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flag(pub bool);

impl Flag {
    pub fn is_on(self) -> bool {
        self.0
    }
}

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(self.0))
    }
}

/// Conversion between a parameter field and the plain `f64` used by overrides.
trait ParamValue: Copy {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl ParamValue for f64 {
    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

impl ParamValue for Flag {
    fn to_f64(self) -> f64 {
        if self.0 {
            1.0
        } else {
            0.0
        }
    }

    fn from_f64(value: f64) -> Self {
        Flag(value != 0.0)
    }
}

macro_rules! parameter_set {
    ($( $(#[$doc:meta])* $field:ident: $ty:ty => $key:literal = $default:expr, )*) => {
        /// The complete set of physical constants and mechanism switches.
        #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
        pub struct ParameterSet {
            $(
                $(#[$doc])*
                #[serde(rename = $key)]
                pub $field: $ty,
            )*
        }

        impl Default for ParameterSet {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        impl ParameterSet {
            /// Wire names of every parameter, in table order.
            pub const NAMES: &'static [&'static str] = &[$( $key, )*];

            /// Looks up a parameter by its wire name.
            pub fn get(&self, name: &str) -> Option<f64> {
                match name {
                    $( $key => Some(ParamValue::to_f64(self.$field)), )*
                    _ => None,
                }
            }

            /// Sets a parameter by its wire name. Returns false for unknown names.
            pub fn set(&mut self, name: &str, value: f64) -> bool {
                match name {
                    $( $key => { self.$field = <$ty as ParamValue>::from_f64(value); true } )*
                    _ => false,
                }
            }
        }
    };
}

parameter_set! {
    /// mM/h, max ACC synthesis rate
    v_acs: f64 => "v_ACS" = 0.05,
    /// stress multiplier (1 = none, 3-5 = severe)
    f_stress: f64 => "f_stress" = 3.0,
    /// 1/h, ACC oxidase rate constant
    k_aco: f64 => "k_ACO" = 0.30,
    /// 1/h, ACC export permeability
    k_exp: f64 => "k_exp" = 0.10,
    /// mol/mol, ethylene yield per ACC oxidized
    y_eth: f64 => "Y_eth" = 1.0,
    /// mM/(g*h), rhizosphere ACCD Vmax per g biomass
    v_max_accd: f64 => "V_max_ACCD" = 1.0,
    /// mM, rhizosphere ACCD Km
    k_m_accd: f64 => "K_m_ACCD" = 1.5,
    /// 1/h, max bacterial specific growth rate
    mu_max: f64 => "mu_max" = 0.15,
    /// mM, Monod half-saturation on ACC
    k_s: f64 => "K_s" = 0.1,
    /// 1/h, bacterial decay rate
    k_d: f64 => "k_d" = 0.01,
    /// plant tissue volume / root zone volume
    vp_vr: f64 => "Vp_Vr" = 0.10,
    /// plant tissue volume / air volume
    vp_vair: f64 => "Vp_Vair" = 0.001,
    /// 1/h, ventilation rate
    k_vent: f64 => "k_vent" = 0.50,
    /// 1/h, chemical scrubber rate
    k_scrub: f64 => "k_scrub" = 0.0,
    /// 1/h, non-enzymatic ACC loss in the root zone
    k_loss: f64 => "k_loss" = 0.01,
    /// 1/h, intrinsic plant growth rate
    r_g: f64 => "r_g" = 0.02,
    /// ethylene level for 50% growth inhibition
    k_e: f64 => "K_E" = 0.0001,
    /// Hill coefficient of growth inhibition
    n_hill: f64 => "n_hill" = 2.0,
    /// fraction of biomass acting inside plant tissue
    f_direct: f64 => "f_direct" = 0.0,
    v_max_accd_direct: f64 => "V_max_ACCD_direct" = 1.0,
    k_m_accd_direct: f64 => "K_m_ACCD_direct" = 1.5,
    /// ethylene repression of ACC synthase
    fb_enable: Flag => "fb_enable" = Flag(false),
    k_fb: f64 => "K_fb" = 2e-4,
    n_fb: f64 => "n_fb" = 2.0,
    /// ethylene repression of ACC oxidase
    aco_fb_enable: Flag => "aco_fb_enable" = Flag(false),
    k_fb_aco: f64 => "K_fb_aco" = 2e-4,
    n_fb_aco: f64 => "n_fb_aco" = 2.0,
}

impl ParameterSet {
    /// Applies the preset of `mode`, if it names one.
    pub fn with_mode(mut self, mode: &str) -> Self {
        if let Some(mode) = Mode::parse(mode) {
            for &(name, value) in mode.preset() {
                self.set(name, value);
            }
        }
        self
    }

    /// Applies explicit overrides key by key, skipping unknown names.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, f64>) -> Self {
        for (name, &value) in overrides {
            if !self.set(name, value) {
                log::debug!("ignoring unknown parameter override `{name}`");
            }
        }
        self
    }

    /// defaults, then the mode preset, then explicit overrides.
    pub fn resolve(mode: &str, overrides: &BTreeMap<String, f64>) -> Self {
        Self::default().with_mode(mode).with_overrides(overrides)
    }
}

/// Named scenario presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Baseline,
    HighExport,
    Endophytic,
    Feedback,
    Custom,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Baseline,
        Mode::HighExport,
        Mode::Endophytic,
        Mode::Feedback,
        Mode::Custom,
    ];

    pub fn parse(name: &str) -> Option<Mode> {
        Mode::ALL.into_iter().find(|mode| mode.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Baseline => "baseline",
            Mode::HighExport => "high_export",
            Mode::Endophytic => "endophytic",
            Mode::Feedback => "feedback",
            Mode::Custom => "custom",
        }
    }

    /// Partial override applied on top of the defaults.
    pub fn preset(self) -> &'static [(&'static str, f64)] {
        match self {
            Mode::Baseline | Mode::Custom => &[],
            Mode::HighExport => &[("k_exp", 0.45)],
            Mode::Endophytic => &[("f_direct", 0.5)],
            Mode::Feedback => &[("fb_enable", 1.0)],
        }
    }

    /// Every preset keyed by mode name.
    pub fn preset_table() -> BTreeMap<&'static str, BTreeMap<&'static str, f64>> {
        Mode::ALL
            .into_iter()
            .map(|mode| (mode.name(), mode.preset().iter().copied().collect()))
            .collect()
    }
}

/// Starting values of the five state variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InitialConditions {
    #[serde(rename = "A_p0")]
    pub a_p0: f64,
    #[serde(rename = "A_r0")]
    pub a_r0: f64,
    #[serde(rename = "E0")]
    pub e0: f64,
    /// Biomass of the treated run; the control run always starts from zero.
    #[serde(rename = "X_b0")]
    pub x_b0: f64,
    #[serde(rename = "G0")]
    pub g0: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            a_p0: 0.01,
            a_r0: 0.0,
            e0: 0.0,
            x_b0: 0.5,
            g0: 1.0,
        }
    }
}

impl InitialConditions {
    pub const NAMES: &'static [&'static str] = &["A_p0", "A_r0", "E0", "X_b0", "G0"];

    pub fn with_overrides(mut self, overrides: &BTreeMap<String, f64>) -> Self {
        for (name, &value) in overrides {
            match name.as_str() {
                "A_p0" => self.a_p0 = value,
                "A_r0" => self.a_r0 = value,
                "E0" => self.e0 = value,
                "X_b0" => self.x_b0 = value,
                "G0" => self.g0 = value,
                _ => log::debug!("ignoring unknown initial condition `{name}`"),
            }
        }
        self
    }

    pub fn control_state(&self) -> [f64; 5] {
        [self.a_p0, self.a_r0, self.e0, 0.0, self.g0]
    }

    pub fn treated_state(&self) -> [f64; 5] {
        [self.a_p0, self.a_r0, self.e0, self.x_b0, self.g0]
    }
}

/// Largest accepted output grid; the solver records every sample before downsampling.
pub const MAX_SAMPLE_POINTS: usize = 1_000_000;

/// Horizon and sampling grid of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationSettings {
    /// hours
    pub t_end: f64,
    pub n_points: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            t_end: 120.0,
            n_points: 2000,
        }
    }
}

impl SimulationSettings {
    pub const NAMES: &'static [&'static str] = &["t_end", "n_points"];

    pub fn with_overrides(mut self, overrides: &BTreeMap<String, f64>) -> Self {
        for (name, &value) in overrides {
            match name.as_str() {
                "t_end" => self.t_end = value,
                // saturating cast: negatives and NaN become 0 and fail validation
                "n_points" => self.n_points = value as usize,
                _ => log::debug!("ignoring unknown simulation setting `{name}`"),
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.t_end.is_finite() || self.t_end <= 0.0 {
            return Err(SimulationError::InvalidSettings(format!(
                "t_end must be finite and positive, got {}",
                self.t_end
            )));
        }
        if self.n_points < 2 {
            return Err(SimulationError::InvalidSettings(format!(
                "n_points must be at least 2, got {}",
                self.n_points
            )));
        }
        if self.n_points > MAX_SAMPLE_POINTS {
            return Err(SimulationError::InvalidSettings(format!(
                "n_points must be at most {MAX_SAMPLE_POINTS}, got {}",
                self.n_points
            )));
        }
        Ok(())
    }

    /// `n_points` evenly spaced times over [0, t_end], both ends included.
    pub fn sample_times(&self) -> Vec<f64> {
        let last = self.n_points.saturating_sub(1).max(1) as f64;
        (0..self.n_points)
            .map(|i| {
                if i + 1 == self.n_points {
                    self.t_end
                } else {
                    self.t_end * i as f64 / last
                }
            })
            .collect()
    }
}
