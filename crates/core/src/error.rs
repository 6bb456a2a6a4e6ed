use thiserror::Error;

/// Failure kinds surfaced by a single prediction interaction.
///
/// Errors are `Clone` so a mode disabled at startup can hand the same
/// error back to every later request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("failed to load {artifact} from {path}: {detail}")]
    ArtifactLoad {
        artifact: &'static str,
        path: String,
        detail: String,
    },

    #[error("cannot encode item_type {value:?}: {detail}")]
    Encoding { value: String, detail: String },

    #[error("{artifact} expects {expected} features, assembled vector has {actual}")]
    DimensionMismatch {
        artifact: String,
        expected: usize,
        actual: usize,
    },

    #[error("{artifact} column {position} is {found:?}, schema expects {expected:?}")]
    SchemaMismatch {
        artifact: String,
        position: usize,
        expected: String,
        found: String,
    },

    #[error("invalid input {field}: {detail}")]
    InvalidInput { field: &'static str, detail: String },

    #[error("prediction failed: {0}")]
    Prediction(String),
}

impl PredictError {
    /// Stable machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArtifactLoad { .. } => "artifact_load",
            Self::Encoding { .. } => "encoding",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Prediction(_) => "prediction",
        }
    }

    /// Configuration drift between the assembler and the fitted artifacts.
    /// Never retried; the affected mode stays unavailable.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ArtifactLoad { .. } | Self::DimensionMismatch { .. } | Self::SchemaMismatch { .. }
        )
    }

    pub(crate) fn prediction(err: impl std::fmt::Display) -> Self {
        Self::Prediction(err.to_string())
    }
}
