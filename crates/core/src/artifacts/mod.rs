//! Fitted, read-only objects exported from the training pipeline.
//!
//! The encoder and scaler are small JSON parameter files. Both models are
//! ONNX graphs run through ONNX Runtime.

pub mod encoder;
pub mod loader;
pub mod model;
pub mod scaler;

use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::Path;

/// A fitted object that can be read from its exported file.
pub trait Artifact: Sized + Send + Sync {
    /// Name used in logs and error reports.
    const NAME: &'static str;

    /// Reads the file and validates the fitted parameters.
    fn load(path: &Path) -> anyhow::Result<Self>;
}

fn read_json<F: DeserializeOwned>(path: &Path, artifact: &str) -> anyhow::Result<F> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {} failed", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid {artifact} export", path.display()))
}
