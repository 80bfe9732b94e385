use serde::Serialize;

use crate::error::{Error, Result};

/// Distance covered by one animation increment of `forward`.
pub const DEFAULT_STEP_SIZE: f64 = 0.2;
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Planar,
    Spatial,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub step_size: f64,
    pub max_steps: u64,
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            step_size: DEFAULT_STEP_SIZE,
            max_steps: DEFAULT_MAX_STEPS,
            mode: Mode::Planar,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(Error::Config(format!(
                "step size must be a positive number, got {}",
                self.step_size
            )));
        }
        if self.max_steps == 0 {
            return Err(Error::Config("max steps must be at least 1".to_string()));
        }
        Ok(())
    }
}
