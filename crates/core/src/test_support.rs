//! Fixtures shared by unit tests: a small artifact set whose models read a
//! single column, so expected outputs are easy to read off.

use crate::artifacts::encoder::OneHotEncoder;
use crate::artifacts::loader::{ArtifactPaths, ArtifactSet};
use crate::artifacts::model::Predictor;
use crate::artifacts::scaler::Scaler;
use crate::domain::inputs::ItemType;
use anyhow::ensure;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const WIDTH: usize = 19;

/// `intercept + weight * row[column]`.
#[derive(Debug)]
pub struct ColumnRegressor {
    pub n_features: usize,
    pub column: usize,
    pub weight: f64,
    pub intercept: f64,
    pub feature_names: Option<Vec<String>>,
}

impl Predictor for ColumnRegressor {
    type Output = f64;

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, row: &[f64]) -> anyhow::Result<f64> {
        ensure!(row.len() == self.n_features, "width {} != {}", row.len(), self.n_features);
        Ok(self.intercept + self.weight * row[self.column])
    }
}

/// `above` when `row[column] > threshold`, otherwise `below`.
#[derive(Debug)]
pub struct ColumnClassifier {
    pub n_features: usize,
    pub column: usize,
    pub threshold: f64,
    pub below: i64,
    pub above: i64,
    pub feature_names: Option<Vec<String>>,
}

impl Predictor for ColumnClassifier {
    type Output = i64;

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, row: &[f64]) -> anyhow::Result<i64> {
        ensure!(row.len() == self.n_features, "width {} != {}", row.len(), self.n_features);
        Ok(if row[self.column] > self.threshold {
            self.above
        } else {
            self.below
        })
    }
}

pub fn encoder() -> OneHotEncoder {
    OneHotEncoder::new(ItemType::ALL.to_vec()).unwrap()
}

pub fn identity_scaler() -> Scaler {
    Scaler::Standard {
        mean: vec![0.0; WIDTH],
        scale: vec![1.0; WIDTH],
    }
}

/// Price depends only on the `width` column (index 6) so tests can steer it.
pub fn regression() -> ColumnRegressor {
    ColumnRegressor {
        n_features: WIDTH,
        column: 6,
        weight: 0.5,
        intercept: 412.25,
        feature_names: None,
    }
}

/// Wins when `selling_price` (index 7) exceeds 500.
pub fn classification() -> ColumnClassifier {
    ColumnClassifier {
        n_features: WIDTH,
        column: 7,
        threshold: 500.0,
        below: 0,
        above: 1,
        feature_names: None,
    }
}

pub fn artifact_set() -> ArtifactSet {
    ArtifactSet {
        paths: ArtifactPaths::in_dir("fixtures"),
        regression_model: Ok(Arc::new(regression())),
        classification_model: Ok(Arc::new(classification())),
        scaler: Ok(Arc::new(identity_scaler())),
        encoder: Ok(Arc::new(encoder())),
    }
}

/// Writes the JSON encoder and scaler. Model files are left absent.
pub fn write_preprocessing(dir: &Path) -> ArtifactPaths {
    let paths = ArtifactPaths::in_dir(dir);
    fs::write(
        &paths.encoder,
        json!({ "categories": ["Others", "PL", "S", "W", "WI"] }).to_string(),
    )
    .unwrap();
    fs::write(
        &paths.scaler,
        serde_json::to_string(&identity_scaler()).unwrap(),
    )
    .unwrap();
    paths
}
