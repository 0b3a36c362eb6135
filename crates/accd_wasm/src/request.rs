//! Request decoding and absent-field filtering.
//!
//! The core never sees "unset" values: nulls and missing fields are dropped here,
//! the rest is split into parameter, initial-condition and settings overrides.

use accd_core::params::{InitialConditions, ParameterSet, SimulationSettings};
use accd_core::simulation::{SimulationRequest, DEFAULT_MODE};
use anyhow::{bail, Result};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MODEL_NAME: &str = "ACC-Ethylene-ACCD v2";
pub const API_VERSION: &str = "2.0.0";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum FieldValue {
    Number(f64),
    Bool(bool),
    Null(()),
    Other(IgnoredAny),
}

/// Request payload as sent by the front end.
#[derive(Debug, Default, Deserialize)]
pub struct RawRequest {
    #[serde(default)]
    mode: Option<String>,
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl RawRequest {
    pub fn into_request(self) -> Result<SimulationRequest> {
        let mut request = SimulationRequest {
            mode: self.mode.unwrap_or_else(|| DEFAULT_MODE.to_string()),
            ..SimulationRequest::default()
        };

        for (name, value) in self.fields {
            let target = if ParameterSet::NAMES.contains(&name.as_str()) {
                &mut request.params
            } else if InitialConditions::NAMES.contains(&name.as_str()) {
                &mut request.ics
            } else if SimulationSettings::NAMES.contains(&name.as_str()) {
                &mut request.sim
            } else {
                continue;
            };

            let number = match value {
                FieldValue::Number(v) => v,
                FieldValue::Bool(b) => f64::from(u8::from(b)),
                FieldValue::Null(()) => continue,
                FieldValue::Other(_) => bail!("Field `{name}` must be a number."),
            };
            target.insert(name, number);
        }

        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub model: &'static str,
    pub version: &'static str,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            status: "ok",
            model: MODEL_NAME,
            version: API_VERSION,
        }
    }
}
