//! Selling-price and status models, exported from scikit-learn with
//! skl2onnx and run through ONNX Runtime.

use crate::artifacts::Artifact;
use anyhow::{anyhow, bail, ensure, Context};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::tensor::TensorElementType;
use ort::value::{DynValue, Tensor, ValueType};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Model metadata key holding the comma-separated training column names.
pub const FEATURE_NAMES_KEY: &str = "feature_names";

/// Inference over one scaled feature row.
pub trait Predictor: Send + Sync + fmt::Debug {
    type Output;

    fn n_features(&self) -> usize;

    /// Column names recorded at fit time, when the export kept them.
    fn feature_names(&self) -> Option<&[String]>;

    fn predict(&self, row: &[f64]) -> anyhow::Result<Self::Output>;
}

/// Predictor shapes stored in an artifact set.
pub type PriceModel = dyn Predictor<Output = f64>;
pub type LabelModel = dyn Predictor<Output = i64>;

/// One ONNX session with a single `[batch, n_features]` float input.
pub struct OnnxModel {
    path: PathBuf,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    n_features: usize,
    feature_names: Option<Vec<String>>,
}

impl fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxModel")
            .field("path", &self.path)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

impl OnnxModel {
    /// Opens a session and reads its input width. `output_hint` picks the
    /// output whose name contains it, falling back to the first output.
    pub fn load(path: &Path, output_hint: &str) -> anyhow::Result<Self> {
        ensure!(path.exists(), "model file {} not found", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(1)?
            .commit_from_file(path)
            .with_context(|| format!("failed to load ONNX model from {}", path.display()))?;

        let input = session.inputs.first().context("model declares no inputs")?;
        let input_name = input.name.clone();
        let n_features = match &input.input_type {
            ValueType::Tensor { ty, shape, .. } => {
                ensure!(
                    *ty == TensorElementType::Float32,
                    "model input {input_name} is {ty:?}, expected a float tensor"
                );
                match shape.last() {
                    Some(&n) if n > 0 => n as usize,
                    _ => bail!("model input {input_name} has no fixed feature width ({shape:?})"),
                }
            }
            other => bail!("model input {input_name} is not a tensor ({other:?})"),
        };

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains(output_hint))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .context("model declares no outputs")?;

        let feature_names = session
            .metadata()
            .ok()
            .and_then(|m| m.custom(FEATURE_NAMES_KEY).ok().flatten())
            .map(|names| names.split(',').map(|c| c.trim().to_string()).collect());

        tracing::debug!(
            path = %path.display(),
            input = %input_name,
            output = %output_name,
            n_features,
            "onnx session ready"
        );

        Ok(Self {
            path: path.to_path_buf(),
            session: Mutex::new(session),
            input_name,
            output_name,
            n_features,
            feature_names,
        })
    }

    /// Runs one row and hands the selected output to `extract`.
    fn run<T>(
        &self,
        row: &[f64],
        extract: impl FnOnce(&DynValue) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        ensure!(
            row.len() == self.n_features,
            "model expects {} features, got {}",
            self.n_features,
            row.len()
        );
        let data: Vec<f32> = row.iter().map(|&x| x as f32).collect();
        let input = Tensor::from_array((vec![1_i64, self.n_features as i64], data))
            .context("failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("session for {} is poisoned: {e}", self.path.display()))?;
        let outputs = session.run(ort::inputs![&self.input_name => input])?;
        let output = outputs
            .get(&self.output_name)
            .with_context(|| format!("model produced no {} output", self.output_name))?;
        extract(output)
    }
}

/// Selling-price regressor. Reads the first value of its float output
/// (`variable` in skl2onnx exports).
#[derive(Debug)]
pub struct RegressionModel(OnnxModel);

impl Predictor for RegressionModel {
    type Output = f64;

    fn n_features(&self) -> usize {
        self.0.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.0.feature_names.as_deref()
    }

    fn predict(&self, row: &[f64]) -> anyhow::Result<f64> {
        let value = self.0.run(row, |output| {
            let (_, data) = output.try_extract_tensor::<f32>()?;
            data.first()
                .map(|v| f64::from(*v))
                .context("regression output is empty")
        })?;
        ensure!(value.is_finite(), "regression output is not finite ({value})");
        Ok(value)
    }
}

impl Artifact for RegressionModel {
    const NAME: &'static str = "regression_model";

    fn load(path: &Path) -> anyhow::Result<Self> {
        OnnxModel::load(path, "variable").map(Self)
    }
}

/// Deal-outcome classifier. Reads the predicted class from the int64 label
/// output (`output_label`), so the label is whatever the exported
/// estimator's own `predict` returns.
#[derive(Debug)]
pub struct ClassificationModel(OnnxModel);

impl Predictor for ClassificationModel {
    type Output = i64;

    fn n_features(&self) -> usize {
        self.0.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.0.feature_names.as_deref()
    }

    fn predict(&self, row: &[f64]) -> anyhow::Result<i64> {
        self.0.run(row, |output| {
            let (_, data) = output
                .try_extract_tensor::<i64>()
                .context("classifier label output must be an int64 tensor")?;
            data.first().copied().context("classifier label output is empty")
        })
    }
}

impl Artifact for ClassificationModel {
    const NAME: &'static str = "classification_model";

    fn load(path: &Path) -> anyhow::Result<Self> {
        OnnxModel::load(path, "label").map(Self)
    }
}
