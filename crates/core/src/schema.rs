//! Named, versioned column layout shared by the assembler and the fitted
//! artifacts, plus the value ranges the input form enforces.

use crate::artifacts::encoder::OneHotEncoder;
use crate::domain::inputs::{ItemType, Mode};
use crate::error::PredictError;
use serde::Serialize;

pub const SCHEMA_VERSION: &str = "copper-v1";

/// Numeric columns preceding the one-hot block, in either mode.
pub const BASE_WIDTH: usize = 14;

const SELLING_PRICE_COLUMNS: [&str; BASE_WIDTH] = [
    "quantity_tons_log",
    "customer_log",
    "country",
    "status",
    "application",
    "thickness_log",
    "width",
    "product_ref",
    "item_date_day",
    "item_date_month",
    "item_date_year",
    "delivery_date_day",
    "delivery_date_month",
    "delivery_date_year",
];

// `status` is the classification target; `selling_price` takes a slot after
// `product_ref` instead.
const STATUS_COLUMNS: [&str; BASE_WIDTH] = [
    "quantity_tons_log",
    "customer_log",
    "country",
    "application",
    "thickness_log",
    "width",
    "product_ref",
    "selling_price",
    "item_date_day",
    "item_date_month",
    "item_date_year",
    "delivery_date_day",
    "delivery_date_month",
    "delivery_date_year",
];

pub fn base_columns(mode: Mode) -> &'static [&'static str; BASE_WIDTH] {
    match mode {
        Mode::SellingPrice => &SELLING_PRICE_COLUMNS,
        Mode::Status => &STATUS_COLUMNS,
    }
}

/// Full column list for one mode: base numeric columns followed by the
/// encoder's one-hot columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSchema {
    pub version: &'static str,
    pub mode: Mode,
    pub columns: Vec<String>,
}

impl FeatureSchema {
    pub fn for_mode(mode: Mode, encoder: &OneHotEncoder) -> Self {
        let mut columns: Vec<String> = base_columns(mode).iter().map(|c| c.to_string()).collect();
        columns.extend(encoder.column_names());
        Self {
            version: SCHEMA_VERSION,
            mode,
            columns,
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Compares column names declared by a fitted artifact with this schema.
    pub fn check_names(&self, artifact: &str, names: &[String]) -> Result<(), PredictError> {
        if names.len() != self.width() {
            return Err(PredictError::DimensionMismatch {
                artifact: artifact.to_string(),
                expected: names.len(),
                actual: self.width(),
            });
        }
        match self
            .columns
            .iter()
            .zip(names)
            .position(|(ours, theirs)| ours != theirs)
        {
            Some(position) => Err(PredictError::SchemaMismatch {
                artifact: artifact.to_string(),
                position,
                expected: self.columns[position].clone(),
                found: names[position].clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Float,
    Int,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default: f64,
}

impl FieldSpec {
    const fn float(name: &'static str, label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Float,
            min: Some(min),
            max: Some(max),
            default,
        }
    }

    const fn int(name: &'static str, label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Int,
            min: Some(min),
            max: Some(max),
            default,
        }
    }

    pub fn check(&self, value: f64) -> Result<(), PredictError> {
        if !value.is_finite() {
            return Err(PredictError::InvalidInput {
                field: self.name,
                detail: format!("must be finite (got {value})"),
            });
        }
        let below = self.min.is_some_and(|min| value < min);
        let above = self.max.is_some_and(|max| value > max);
        if below || above {
            return Err(PredictError::InvalidInput {
                field: self.name,
                detail: format!(
                    "{value} is outside {}..={}",
                    self.min.unwrap_or(f64::NEG_INFINITY),
                    self.max.unwrap_or(f64::INFINITY)
                ),
            });
        }
        Ok(())
    }
}

const THICKNESS_LOG: FieldSpec = FieldSpec {
    name: "thickness_log",
    label: "THICKNESS (Log Value)",
    kind: FieldKind::Float,
    min: None,
    max: None,
    default: 0.0,
};

pub const FIELDS: [FieldSpec; 15] = [
    FieldSpec::float("quantity_tons_log", "QUANTITY_TONS (Log)", -0.3223, 6.9247, 0.3223),
    FieldSpec::float("customer_log", "CUSTOMER (Log)", 17.2191, 17.2301, 17.2191),
    FieldSpec::int("country", "COUNTRY", 25.0, 113.0, 25.0),
    FieldSpec::int("status", "STATUS", 0.0, 8.0, 0.0),
    FieldSpec::float("application", "APPLICATION", 2.0, 87.5, 2.0),
    THICKNESS_LOG,
    FieldSpec::float("width", "WIDTH", 700.0, 1980.0, 700.0),
    FieldSpec::int("product_ref", "PRODUCT_REF", 611728.0, 1722207579.0, 611728.0),
    FieldSpec::float("selling_price", "SELLING PRICE", 5.97503, 1500.0, 100.0),
    FieldSpec::int("item_date_day", "ITEM DATE - Day", 1.0, 31.0, 1.0),
    FieldSpec::int("item_date_month", "ITEM DATE - Month", 1.0, 12.0, 1.0),
    FieldSpec::int("item_date_year", "ITEM DATE - Year", 2020.0, 2021.0, 2020.0),
    FieldSpec::int("delivery_date_day", "DELIVERY DATE - Day", 1.0, 31.0, 1.0),
    FieldSpec::int("delivery_date_month", "DELIVERY DATE - Month", 1.0, 12.0, 1.0),
    FieldSpec::int("delivery_date_year", "DELIVERY DATE - Year", 2020.0, 2022.0, 2020.0),
];

pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// One section of the prediction form.
#[derive(Debug, Clone, Serialize)]
pub struct FormSection {
    pub mode: Mode,
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
    pub item_types: Vec<&'static str>,
}

pub fn form_section(mode: Mode) -> FormSection {
    let fields = base_columns(mode)
        .iter()
        .filter_map(|c| field_spec(c).copied())
        .collect();
    FormSection {
        mode,
        title: match mode {
            Mode::SellingPrice => "Selling Price",
            Mode::Status => "Status",
        },
        fields,
        item_types: ItemType::ALL.iter().map(|t| t.label()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> OneHotEncoder {
        OneHotEncoder::new(ItemType::ALL.to_vec()).unwrap()
    }

    #[test]
    fn every_base_column_has_a_field_spec() {
        for mode in Mode::ALL {
            for column in base_columns(mode) {
                assert!(field_spec(column).is_some(), "missing spec for {column}");
            }
        }
    }

    #[test]
    fn schema_width_is_base_plus_one_hot() {
        let schema = FeatureSchema::for_mode(Mode::SellingPrice, &encoder());
        assert_eq!(schema.width(), BASE_WIDTH + 5);
        assert_eq!(schema.version, SCHEMA_VERSION);
        assert_eq!(schema.columns[BASE_WIDTH], "item_type_Others");
        assert_eq!(schema.columns.last().unwrap(), "item_type_WI");
    }

    #[test]
    fn modes_differ_only_in_status_and_selling_price() {
        let sp: Vec<_> = SELLING_PRICE_COLUMNS.iter().filter(|c| **c != "status").collect();
        let st: Vec<_> = STATUS_COLUMNS.iter().filter(|c| **c != "selling_price").collect();
        assert_eq!(sp.len(), BASE_WIDTH - 1);
        assert_eq!(sp, st);
    }

    #[test]
    fn check_names_reports_first_divergent_column() {
        let schema = FeatureSchema::for_mode(Mode::Status, &encoder());
        let mut names = schema.columns.clone();
        assert!(schema.check_names("model", &names).is_ok());

        names.swap(3, 4);
        let err = schema.check_names("model", &names).unwrap_err();
        assert_eq!(
            err,
            PredictError::SchemaMismatch {
                artifact: "model".to_string(),
                position: 3,
                expected: "application".to_string(),
                found: "thickness_log".to_string(),
            }
        );

        names.pop();
        let err = schema.check_names("model", &names).unwrap_err();
        assert_eq!(err.kind(), "dimension_mismatch");
    }

    #[test]
    fn field_check_enforces_bounds() {
        let width = field_spec("width").unwrap();
        assert!(width.check(700.0).is_ok());
        assert!(width.check(1980.0).is_ok());
        assert!(width.check(699.9).is_err());
        assert!(width.check(f64::NAN).is_err());

        let thickness = field_spec("thickness_log").unwrap();
        assert!(thickness.check(-3.5).is_ok());
        assert!(thickness.check(f64::INFINITY).is_err());
    }

    #[test]
    fn form_sections_list_mode_fields() {
        let status = form_section(Mode::Status);
        assert!(status.fields.iter().any(|f| f.name == "selling_price"));
        assert!(!status.fields.iter().any(|f| f.name == "status"));
        assert_eq!(status.item_types, vec!["Others", "PL", "S", "W", "WI"]);
    }
}
