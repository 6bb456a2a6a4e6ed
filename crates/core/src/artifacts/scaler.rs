use crate::artifacts::{read_json, Artifact};
use crate::error::PredictError;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fitted per-column affine transform applied to the assembled vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`; a zero scale is treated as one.
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`.
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    pub fn n_features(&self) -> usize {
        match self {
            Scaler::Standard { mean, .. } => mean.len(),
            Scaler::MinMax { min, .. } => min.len(),
        }
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictError> {
        if row.len() != self.n_features() {
            return Err(PredictError::prediction(format!(
                "scaler was fitted on {} features, got {}",
                self.n_features(),
                row.len()
            )));
        }

        let out: Vec<f64> = match self {
            Scaler::Standard { mean, scale } => row
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(x, (m, s))| {
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    (x - m) / s
                })
                .collect(),
            Scaler::MinMax { min, scale } => row
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(x, (m, s))| x * s + m)
                .collect(),
        };

        if let Some(i) = out.iter().position(|v| !v.is_finite()) {
            return Err(PredictError::prediction(format!(
                "scaled column {i} is not finite"
            )));
        }
        Ok(out)
    }
}

impl Scaler {
    /// Checks the fitted parameters. Run at load time and again when a
    /// pipeline is built, since the variants are constructible in code.
    pub fn validate(&self) -> anyhow::Result<()> {
        let (offsets, scale) = match self {
            Scaler::Standard { mean, scale } => (mean, scale),
            Scaler::MinMax { min, scale } => (min, scale),
        };
        ensure!(!offsets.is_empty(), "scaler has no columns");
        ensure!(
            offsets.len() == scale.len(),
            "scaler parameter lengths differ ({} vs {})",
            offsets.len(),
            scale.len()
        );
        ensure!(
            offsets.iter().chain(scale).all(|v| v.is_finite()),
            "scaler parameters must be finite"
        );
        Ok(())
    }
}

impl Artifact for Scaler {
    const NAME: &'static str = "scaler";

    fn load(path: &Path) -> anyhow::Result<Self> {
        let scaler: Scaler = read_json(path, Self::NAME)?;
        scaler.validate()?;
        Ok(scaler)
    }
}
