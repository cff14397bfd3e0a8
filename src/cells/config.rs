use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

use super::init_ranges::InitRanges;
use super::ltc_cell::LTCCell;
use crate::error::{NcpError, Result};
use crate::wirings::Wiring;

/// Input/output mapping modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMode {
    /// Affine mapping: y = w * x + b
    #[default]
    Affine,
    /// Linear mapping: y = w * x
    Linear,
    /// No mapping (pass-through)
    None,
}

impl MappingMode {
    pub(crate) fn has_weight(self) -> bool {
        self != MappingMode::None
    }

    pub(crate) fn has_bias(self) -> bool {
        self == MappingMode::Affine
    }
}

impl FromStr for MappingMode {
    type Err = NcpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "affine" => Ok(MappingMode::Affine),
            "linear" => Ok(MappingMode::Linear),
            "none" => Ok(MappingMode::None),
            _ => Err(NcpError::UnknownMappingMode(s.to_string())),
        }
    }
}

/// Settings of an [`LTCCell`]; `init` turns them into a module.
///
/// ```
/// use ncps_ltc::cells::LTCCellConfig;
///
/// let config = LTCCellConfig::default()
///     .with_ode_unfolds(4)
///     .with_init_range("cm", 0.5, 0.5)
///     .unwrap();
/// assert_eq!(config.ode_unfolds, 4);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LTCCellConfig {
    /// Ranges the trainable parameters are drawn from
    pub init_ranges: InitRanges,
    /// Solver sub-steps per forward call
    pub ode_unfolds: usize,
    /// Added to the solver denominator
    pub epsilon: f64,
    pub input_mapping: MappingMode,
    pub output_mapping: MappingMode,
    /// Keep positive parameters positive through softplus; when off, call
    /// [`LTCCell::apply_weight_constraints`] after each optimizer step
    pub implicit_param_constraints: bool,
}

impl Default for LTCCellConfig {
    fn default() -> Self {
        Self {
            init_ranges: InitRanges::default(),
            ode_unfolds: 6,
            epsilon: 1e-8,
            input_mapping: MappingMode::Affine,
            output_mapping: MappingMode::Affine,
            implicit_param_constraints: true,
        }
    }
}

impl LTCCellConfig {
    pub fn with_init_ranges(mut self, init_ranges: InitRanges) -> Self {
        self.init_ranges = init_ranges;
        self
    }

    pub fn with_init_range(mut self, name: &str, min: f64, max: f64) -> Result<Self> {
        self.init_ranges = self.init_ranges.with_range(name, min, max)?;
        Ok(self)
    }

    pub fn with_ode_unfolds(mut self, ode_unfolds: usize) -> Self {
        self.ode_unfolds = ode_unfolds;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_input_mapping(mut self, mode: MappingMode) -> Self {
        self.input_mapping = mode;
        self
    }

    pub fn with_output_mapping(mut self, mode: MappingMode) -> Self {
        self.output_mapping = mode;
        self
    }

    pub fn with_implicit_param_constraints(mut self, implicit: bool) -> Self {
        self.implicit_param_constraints = implicit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.ode_unfolds == 0 {
            return Err(NcpError::InvalidConfig(
                "ode_unfolds must be at least 1".to_string(),
            ));
        }
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return Err(NcpError::InvalidConfig(format!(
                "epsilon must be non-negative, got {}",
                self.epsilon
            )));
        }
        self.init_ranges.validate()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    /// Create the cell for a built wiring
    pub fn init<B: Backend>(&self, wiring: &dyn Wiring, device: &B::Device) -> Result<LTCCell<B>> {
        self.validate()?;
        LTCCell::from_config(self, wiring, device)
    }
}
