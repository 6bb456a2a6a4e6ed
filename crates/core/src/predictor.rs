use crate::artifacts::encoder::OneHotEncoder;
use crate::artifacts::loader::{ArtifactSet, ArtifactStatus, Slot};
use crate::artifacts::model::{ClassificationModel, Predictor, RegressionModel};
use crate::artifacts::scaler::Scaler;
use crate::artifacts::Artifact;
use crate::assembler::{build_feature_vector, scale_and_predict};
use crate::domain::inputs::{Mode, SaleInputs};
use crate::domain::outcome::{LabelPolicy, PricePrediction, StatusPrediction};
use crate::error::PredictError;
use crate::schema::{FeatureSchema, SCHEMA_VERSION};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Encoder, scaler and model for one mode, checked against the schema.
#[derive(Debug)]
pub struct ModePipeline<O> {
    pub schema: FeatureSchema,
    encoder: Arc<OneHotEncoder>,
    scaler: Arc<Scaler>,
    model: Arc<dyn Predictor<Output = O>>,
}

impl<O> ModePipeline<O> {
    pub fn new(
        mode: Mode,
        encoder: &Slot<OneHotEncoder>,
        scaler: &Slot<Scaler>,
        model_name: &'static str,
        model: &Slot<dyn Predictor<Output = O>>,
    ) -> Result<Self, PredictError> {
        let encoder = Arc::clone(encoder.as_ref().map_err(Clone::clone)?);
        let scaler = Arc::clone(scaler.as_ref().map_err(Clone::clone)?);
        let model = Arc::clone(model.as_ref().map_err(Clone::clone)?);

        let schema = FeatureSchema::for_mode(mode, &encoder);
        if scaler.n_features() != schema.width() {
            return Err(PredictError::DimensionMismatch {
                artifact: Scaler::NAME.to_string(),
                expected: scaler.n_features(),
                actual: schema.width(),
            });
        }
        if model.n_features() != scaler.n_features() {
            return Err(PredictError::DimensionMismatch {
                artifact: model_name.to_string(),
                expected: model.n_features(),
                actual: scaler.n_features(),
            });
        }
        if let Some(names) = model.feature_names() {
            schema.check_names(model_name, names)?;
        }

        Ok(Self {
            schema,
            encoder,
            scaler,
            model,
        })
    }

    fn run(&self, inputs: &SaleInputs) -> Result<O, PredictError> {
        let vector = build_feature_vector(
            inputs,
            self.schema.mode,
            &self.encoder,
            self.scaler.n_features(),
        )?;
        scale_and_predict(&vector, &self.scaler, self.model.as_ref())
    }
}

/// Re-runs artifact validation on a slot that may have been filled in code
/// rather than by the loader.
fn revalidate<T>(
    slot: &Slot<T>,
    artifact: &'static str,
    path: &Path,
    check: impl FnOnce(&T) -> anyhow::Result<()>,
) -> Slot<T> {
    let loaded = slot.as_ref().map_err(Clone::clone)?;
    check(loaded).map_err(|e| PredictError::ArtifactLoad {
        artifact,
        path: path.display().to_string(),
        detail: format!("{e:#}"),
    })?;
    Ok(Arc::clone(loaded))
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeStatus {
    pub mode: Mode,
    pub ready: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub schema_version: &'static str,
    pub artifacts: Vec<ArtifactStatus>,
    pub modes: Vec<ModeStatus>,
}

impl StatusReport {
    pub fn all_ready(&self) -> bool {
        self.modes.iter().all(|m| m.ready)
    }
}

/// Both prediction pipelines over one immutable artifact set.
///
/// A mode whose artifacts failed to load or disagree with the schema stays
/// unavailable for the process lifetime and returns the same error on every
/// call.
#[derive(Debug)]
pub struct CopperPredictor {
    selling_price: Result<ModePipeline<f64>, PredictError>,
    status: Result<ModePipeline<i64>, PredictError>,
    label_policy: LabelPolicy,
    artifacts: Vec<ArtifactStatus>,
}

impl CopperPredictor {
    pub fn new(artifacts: &ArtifactSet, label_policy: LabelPolicy) -> Self {
        let scaler = revalidate(
            &artifacts.scaler,
            Scaler::NAME,
            &artifacts.paths.scaler,
            Scaler::validate,
        );
        let selling_price = ModePipeline::new(
            Mode::SellingPrice,
            &artifacts.encoder,
            &scaler,
            RegressionModel::NAME,
            &artifacts.regression_model,
        );
        let status = ModePipeline::new(
            Mode::Status,
            &artifacts.encoder,
            &scaler,
            ClassificationModel::NAME,
            &artifacts.classification_model,
        );

        for (mode, err) in [
            (Mode::SellingPrice, selling_price.as_ref().err()),
            (Mode::Status, status.as_ref().err()),
        ] {
            match err {
                None => tracing::info!(%mode, schema = SCHEMA_VERSION, "prediction mode ready"),
                Some(e) if e.is_configuration() => {
                    tracing::error!(%mode, error = %e, kind = e.kind(), "prediction mode disabled")
                }
                Some(e) => tracing::warn!(%mode, error = %e, "prediction mode disabled"),
            }
        }

        Self {
            selling_price,
            status,
            label_policy,
            artifacts: artifacts.statuses(),
        }
    }

    pub fn label_policy(&self) -> LabelPolicy {
        self.label_policy
    }

    pub fn schema(&self, mode: Mode) -> Result<&FeatureSchema, PredictError> {
        let schema = match mode {
            Mode::SellingPrice => self.selling_price.as_ref().map(|p| &p.schema),
            Mode::Status => self.status.as_ref().map(|p| &p.schema),
        };
        schema.map_err(Clone::clone)
    }

    pub fn predict_selling_price(&self, inputs: &SaleInputs) -> Result<PricePrediction, PredictError> {
        let pipeline = self.selling_price.as_ref().map_err(Clone::clone)?;
        let price = pipeline.run(inputs)?;
        if !price.is_finite() {
            return Err(PredictError::prediction(format!("price is not finite ({price})")));
        }
        tracing::debug!(price, item_type = %inputs.item_type, "selling price predicted");
        Ok(PricePrediction::new(price))
    }

    pub fn predict_status(&self, inputs: &SaleInputs) -> Result<StatusPrediction, PredictError> {
        let pipeline = self.status.as_ref().map_err(Clone::clone)?;
        let label = pipeline.run(inputs)?;
        let prediction = StatusPrediction::from_label(label, self.label_policy)?;
        tracing::debug!(label, outcome = %prediction.outcome, "status predicted");
        Ok(prediction)
    }

    pub fn status_report(&self) -> StatusReport {
        let mode_status = |mode, err: Option<&PredictError>| ModeStatus {
            mode,
            ready: err.is_none(),
            error: err.map(ToString::to_string),
        };
        StatusReport {
            schema_version: SCHEMA_VERSION,
            artifacts: self.artifacts.clone(),
            modes: vec![
                mode_status(Mode::SellingPrice, self.selling_price.as_ref().err()),
                mode_status(Mode::Status, self.status.as_ref().err()),
            ],
        }
    }
}
