//! Initialization intervals for the trainable LTC parameters

use serde::{Deserialize, Serialize};

use crate::error::{NcpError, Result};

/// Closed interval `[min, max]` a parameter is drawn from uniformly.
///
/// Serialized as a two-element array. `min == max` means a constant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct InitRange {
    pub min: f64,
    pub max: f64,
}

impl InitRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_constant(&self) -> bool {
        self.min == self.max
    }
}

impl From<(f64, f64)> for InitRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl From<InitRange> for (f64, f64) {
    fn from(range: InitRange) -> Self {
        (range.min, range.max)
    }
}

/// Per-parameter initialization ranges of an [`LTCCell`](super::LTCCell).
///
/// Reversal potentials are not listed: they come from the wiring polarities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InitRanges {
    pub gleak: InitRange,
    pub vleak: InitRange,
    pub cm: InitRange,
    pub w: InitRange,
    pub sigma: InitRange,
    pub mu: InitRange,
    pub sensory_w: InitRange,
    pub sensory_sigma: InitRange,
    pub sensory_mu: InitRange,
}

impl Default for InitRanges {
    fn default() -> Self {
        Self {
            gleak: InitRange::new(0.001, 1.0),
            vleak: InitRange::new(-0.2, 0.2),
            cm: InitRange::new(0.4, 0.6),
            w: InitRange::new(0.001, 1.0),
            sigma: InitRange::new(3.0, 8.0),
            mu: InitRange::new(0.3, 0.8),
            sensory_w: InitRange::new(0.001, 1.0),
            sensory_sigma: InitRange::new(3.0, 8.0),
            sensory_mu: InitRange::new(0.3, 0.8),
        }
    }
}

impl InitRanges {
    pub const NAMES: [&'static str; 9] = [
        "gleak",
        "vleak",
        "cm",
        "w",
        "sigma",
        "mu",
        "sensory_w",
        "sensory_sigma",
        "sensory_mu",
    ];

    fn slot(&mut self, name: &str) -> Option<&mut InitRange> {
        Some(match name {
            "gleak" => &mut self.gleak,
            "vleak" => &mut self.vleak,
            "cm" => &mut self.cm,
            "w" => &mut self.w,
            "sigma" => &mut self.sigma,
            "mu" => &mut self.mu,
            "sensory_w" => &mut self.sensory_w,
            "sensory_sigma" => &mut self.sensory_sigma,
            "sensory_mu" => &mut self.sensory_mu,
            _ => return None,
        })
    }

    pub fn get(&self, name: &str) -> Option<InitRange> {
        self.clone().slot(name).copied()
    }

    /// Override one range by parameter name
    pub fn with_range(mut self, name: &str, min: f64, max: f64) -> Result<Self> {
        check(name, min, max)?;
        let slot = self
            .slot(name)
            .ok_or_else(|| NcpError::UnknownInitParameter(name.to_string()))?;
        *slot = InitRange::new(min, max);
        Ok(self)
    }

    /// Apply several overrides, e.g. parsed from user input
    pub fn with_ranges<'a, I>(self, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, (f64, f64))>,
    {
        overrides
            .into_iter()
            .try_fold(self, |ranges, (name, (min, max))| ranges.with_range(name, min, max))
    }

    pub fn validate(&self) -> Result<()> {
        Self::NAMES.iter().try_for_each(|name| {
            let range = self
                .get(name)
                .ok_or_else(|| NcpError::UnknownInitParameter(name.to_string()))?;
            check(name, range.min, range.max)
        })
    }
}

fn check(name: &str, min: f64, max: f64) -> Result<()> {
    if min.is_nan() || max.is_nan() || min > max {
        return Err(NcpError::InvertedInitRange {
            name: name.to_string(),
            min,
            max,
        });
    }
    Ok(())
}
