use crate::artifacts::encoder::OneHotEncoder;
use crate::artifacts::model::{ClassificationModel, LabelModel, PriceModel, RegressionModel};
use crate::artifacts::scaler::Scaler;
use crate::artifacts::Artifact;
use crate::error::PredictError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A loaded artifact, or the reason it could not be loaded.
pub type Slot<T> = Result<Arc<T>, PredictError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub regression_model: PathBuf,
    pub classification_model: PathBuf,
    pub scaler: PathBuf,
    pub encoder: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside one artifact directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            regression_model: dir.join("regression_model.onnx"),
            classification_model: dir.join("classification_model.onnx"),
            scaler: dir.join("scaler.json"),
            encoder: dir.join("one_hot_encoder.json"),
        }
    }
}

/// The four fitted artifacts, each loaded independently. One bad file
/// leaves the others usable.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub paths: ArtifactPaths,
    pub regression_model: Slot<PriceModel>,
    pub classification_model: Slot<LabelModel>,
    pub scaler: Slot<Scaler>,
    pub encoder: Slot<OneHotEncoder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub name: &'static str,
    pub path: String,
    pub loaded: bool,
    pub error: Option<String>,
}

impl ArtifactSet {
    pub fn load(paths: ArtifactPaths) -> Self {
        Self {
            regression_model: load_slot::<RegressionModel>(&paths.regression_model)
                .map(|m| m as Arc<PriceModel>),
            classification_model: load_slot::<ClassificationModel>(&paths.classification_model)
                .map(|m| m as Arc<LabelModel>),
            scaler: load_slot(&paths.scaler),
            encoder: load_slot(&paths.encoder),
            paths,
        }
    }

    pub fn statuses(&self) -> Vec<ArtifactStatus> {
        vec![
            status_of(
                &self.regression_model,
                RegressionModel::NAME,
                &self.paths.regression_model,
            ),
            status_of(
                &self.classification_model,
                ClassificationModel::NAME,
                &self.paths.classification_model,
            ),
            status_of(&self.scaler, Scaler::NAME, &self.paths.scaler),
            status_of(&self.encoder, OneHotEncoder::NAME, &self.paths.encoder),
        ]
    }

    pub fn loaded_count(&self) -> usize {
        self.statuses().iter().filter(|s| s.loaded).count()
    }
}

fn status_of<T: ?Sized>(slot: &Slot<T>, name: &'static str, path: &Path) -> ArtifactStatus {
    ArtifactStatus {
        name,
        path: path.display().to_string(),
        loaded: slot.is_ok(),
        error: slot.as_ref().err().map(ToString::to_string),
    }
}

fn load_slot<T: Artifact>(path: &Path) -> Slot<T> {
    match T::load(path) {
        Ok(artifact) => {
            tracing::info!(artifact = T::NAME, path = %path.display(), "artifact loaded");
            Ok(Arc::new(artifact))
        }
        Err(e) => {
            tracing::error!(artifact = T::NAME, path = %path.display(), error = %format!("{e:#}"), "artifact load failed");
            Err(PredictError::ArtifactLoad {
                artifact: T::NAME,
                path: path.display().to_string(),
                detail: format!("{e:#}"),
            })
        }
    }
}
