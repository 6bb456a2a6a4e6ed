use crate::error::PredictError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How classifier labels other than 0 and 1 are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// 1 is WON, 0 is LOSS, anything else is a prediction error.
    #[default]
    Strict,
    /// 1 is WON, everything else is LOSS.
    Lossy,
}

impl FromStr for LabelPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(LabelPolicy::Strict),
            "lossy" => Ok(LabelPolicy::Lossy),
            other => anyhow::bail!("unknown status label policy {other:?} (expected strict or lossy)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusOutcome {
    Won,
    Loss,
}

impl StatusOutcome {
    pub fn from_label(label: i64, policy: LabelPolicy) -> Result<Self, PredictError> {
        match (label, policy) {
            (1, _) => Ok(StatusOutcome::Won),
            (0, _) | (_, LabelPolicy::Lossy) => Ok(StatusOutcome::Loss),
            (other, LabelPolicy::Strict) => Err(PredictError::Prediction(format!(
                "classifier returned unexpected label {other}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusOutcome::Won => "WON",
            StatusOutcome::Loss => "LOSS",
        }
    }
}

impl fmt::Display for StatusOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currency rendering used for selling-price results.
pub fn render_price(price: f64) -> String {
    format!("${price:.2}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    pub price: f64,
    pub rendered: String,
}

impl PricePrediction {
    pub fn new(price: f64) -> Self {
        Self {
            price,
            rendered: render_price(price),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPrediction {
    pub label: i64,
    pub outcome: StatusOutcome,
    pub rendered: String,
}

impl StatusPrediction {
    pub fn from_label(label: i64, policy: LabelPolicy) -> Result<Self, PredictError> {
        let outcome = StatusOutcome::from_label(label, policy)?;
        Ok(Self {
            label,
            outcome,
            rendered: outcome.to_string(),
        })
    }
}
