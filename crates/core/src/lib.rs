pub mod artifacts;
pub mod assembler;
pub mod domain;
pub mod error;
pub mod predictor;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::inputs::{ItemType, Mode, PartDate, SaleInputs};
pub use domain::outcome::{LabelPolicy, PricePrediction, StatusOutcome, StatusPrediction};
pub use error::PredictError;
pub use predictor::{CopperPredictor, StatusReport};

pub mod config {
    use crate::artifacts::loader::ArtifactPaths;
    use crate::domain::outcome::LabelPolicy;
    use anyhow::Context;
    use std::path::PathBuf;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub artifact_dir: Option<String>,
        pub regression_model_path: Option<String>,
        pub classification_model_path: Option<String>,
        pub scaler_path: Option<String>,
        pub encoder_path: Option<String>,
        pub status_label_policy: Option<String>,
        pub sentry_dsn: Option<String>,
        pub port: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                artifact_dir: std::env::var("COPPER_ARTIFACT_DIR").ok(),
                regression_model_path: std::env::var("COPPER_REGRESSION_MODEL").ok(),
                classification_model_path: std::env::var("COPPER_CLASSIFICATION_MODEL").ok(),
                scaler_path: std::env::var("COPPER_SCALER").ok(),
                encoder_path: std::env::var("COPPER_ENCODER").ok(),
                status_label_policy: std::env::var("COPPER_STATUS_LABEL_POLICY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                port: std::env::var("PORT").ok(),
            })
        }

        /// Per-file overrides win over the artifact directory defaults.
        pub fn artifact_paths(&self) -> ArtifactPaths {
            let mut paths = ArtifactPaths::in_dir(self.artifact_dir.as_deref().unwrap_or("artifacts"));
            let overrides = [
                (&self.regression_model_path, &mut paths.regression_model),
                (&self.classification_model_path, &mut paths.classification_model),
                (&self.scaler_path, &mut paths.scaler),
                (&self.encoder_path, &mut paths.encoder),
            ];
            for (value, slot) in overrides {
                if let Some(p) = value {
                    *slot = PathBuf::from(p);
                }
            }
            paths
        }

        pub fn label_policy(&self) -> anyhow::Result<LabelPolicy> {
            match self.status_label_policy.as_deref() {
                None => Ok(LabelPolicy::default()),
                Some(s) => s
                    .parse()
                    .context("COPPER_STATUS_LABEL_POLICY is invalid"),
            }
        }

        pub fn port(&self) -> anyhow::Result<u16> {
            match self.port.as_deref() {
                None => Ok(3000),
                Some(p) => p.parse().with_context(|| format!("PORT must be a u16 (got {p:?})")),
            }
        }
    }

}
