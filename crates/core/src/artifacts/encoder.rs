use crate::artifacts::{read_json, Artifact};
use crate::domain::inputs::ItemType;
use crate::error::PredictError;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderFile {
    pub categories: Vec<String>,
}

/// Fitted one-hot transform for `item_type`. Column order follows the
/// fitted category order.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    categories: Vec<ItemType>,
}

impl OneHotEncoder {
    pub fn new(categories: Vec<ItemType>) -> anyhow::Result<Self> {
        ensure!(!categories.is_empty(), "encoder must have at least one category");
        let unique: BTreeSet<_> = categories.iter().collect();
        ensure!(
            unique.len() == categories.len(),
            "encoder categories must be unique (got {categories:?})"
        );
        Ok(Self { categories })
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = String> + '_ {
        self.categories.iter().map(|c| format!("item_type_{}", c.label()))
    }

    /// Indicator row for a raw item-type label. Unknown labels are an error,
    /// never an all-zero row.
    pub fn encode(&self, raw: &str) -> Result<Vec<f64>, PredictError> {
        let item_type: ItemType = raw.parse()?;
        let hot = self
            .categories
            .iter()
            .position(|c| *c == item_type)
            .ok_or_else(|| PredictError::Encoding {
                value: raw.to_string(),
                detail: "category was not seen when the encoder was fitted".to_string(),
            })?;

        let mut row = vec![0.0; self.width()];
        row[hot] = 1.0;
        Ok(row)
    }

    pub fn from_file(file: EncoderFile) -> anyhow::Result<Self> {
        let categories = file
            .categories
            .iter()
            .map(|c| c.parse::<ItemType>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(categories)
    }
}

impl Artifact for OneHotEncoder {
    const NAME: &'static str = "one_hot_encoder";

    fn load(path: &Path) -> anyhow::Result<Self> {
        Self::from_file(read_json(path, Self::NAME)?)
    }
}
