use crate::error::PredictError;
use crate::schema::{self, BASE_WIDTH};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the two fitted predictors a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    SellingPrice,
    Status,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::SellingPrice, Mode::Status];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::SellingPrice => "selling_price",
            Mode::Status => "status",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of item-type labels the encoder was fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemType {
    Others,
    #[serde(rename = "PL")]
    Pl,
    S,
    W,
    #[serde(rename = "WI")]
    Wi,
}

impl ItemType {
    pub const ALL: [ItemType; 5] = [
        ItemType::Others,
        ItemType::Pl,
        ItemType::S,
        ItemType::W,
        ItemType::Wi,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ItemType::Others => "Others",
            ItemType::Pl => "PL",
            ItemType::S => "S",
            ItemType::W => "W",
            ItemType::Wi => "WI",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ItemType {
    type Err = PredictError;

    // Labels are matched exactly; the fitted encoder is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| PredictError::Encoding {
                value: s.to_string(),
                detail: format!(
                    "expected one of {}",
                    ItemType::ALL.map(ItemType::label).join(", ")
                ),
            })
    }
}

/// Calendar parts as entered on the form. Days are range-checked only,
/// not calendar-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl PartDate {
    pub fn new(day: u32, month: u32, year: i32) -> Self {
        Self { day, month, year }
    }
}

impl From<NaiveDate> for PartDate {
    fn from(d: NaiveDate) -> Self {
        Self::new(d.day(), d.month(), d.year())
    }
}

/// Raw user-entered attributes of a copper sale.
///
/// `status` is only read in selling-price mode and `selling_price` only in
/// status mode. Missing fields fall back to the form defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleInputs {
    pub quantity_tons_log: f64,
    pub customer_log: f64,
    pub country: i64,
    pub status: Option<i64>,
    pub application: f64,
    pub thickness_log: f64,
    pub width: f64,
    pub product_ref: i64,
    pub selling_price: Option<f64>,
    pub item_date: PartDate,
    pub delivery_date: PartDate,
    pub item_type: String,
}

impl Default for SaleInputs {
    fn default() -> Self {
        Self {
            quantity_tons_log: 0.3223,
            customer_log: 17.2191,
            country: 25,
            status: Some(0),
            application: 2.0,
            thickness_log: 0.0,
            width: 700.0,
            product_ref: 611728,
            selling_price: Some(100.0),
            item_date: PartDate::new(1, 1, 2020),
            delivery_date: PartDate::new(1, 1, 2020),
            item_type: ItemType::Others.label().to_string(),
        }
    }
}

impl SaleInputs {
    /// Numeric columns in fitted order for `mode`, each checked against its
    /// form range.
    pub fn numeric_features(&self, mode: Mode) -> Result<[f64; BASE_WIDTH], PredictError> {
        let columns = schema::base_columns(mode);
        let mut out = [0.0; BASE_WIDTH];
        for (slot, &column) in out.iter_mut().zip(columns.iter()) {
            let value = self.value_of(column)?;
            schema::field_spec(column)
                .ok_or_else(|| PredictError::InvalidInput {
                    field: column,
                    detail: "no field spec for column".to_string(),
                })?
                .check(value)?;
            *slot = value;
        }
        Ok(out)
    }

    fn value_of(&self, column: &'static str) -> Result<f64, PredictError> {
        let value = match column {
            "quantity_tons_log" => self.quantity_tons_log,
            "customer_log" => self.customer_log,
            "country" => self.country as f64,
            "status" => self.status.ok_or_else(|| PredictError::InvalidInput {
                field: "status",
                detail: "required for selling price predictions".to_string(),
            })? as f64,
            "application" => self.application,
            "thickness_log" => self.thickness_log,
            "width" => self.width,
            "product_ref" => self.product_ref as f64,
            "selling_price" => self.selling_price.ok_or_else(|| PredictError::InvalidInput {
                field: "selling_price",
                detail: "required for status predictions".to_string(),
            })?,
            "item_date_day" => f64::from(self.item_date.day),
            "item_date_month" => f64::from(self.item_date.month),
            "item_date_year" => f64::from(self.item_date.year),
            "delivery_date_day" => f64::from(self.delivery_date.day),
            "delivery_date_month" => f64::from(self.delivery_date.month),
            "delivery_date_year" => f64::from(self.delivery_date.year),
            other => {
                return Err(PredictError::InvalidInput {
                    field: other,
                    detail: "unknown column".to_string(),
                })
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_parses_exact_labels() {
        for t in ItemType::ALL {
            assert_eq!(t.label().parse::<ItemType>().unwrap(), t);
        }
        let err = "pl".parse::<ItemType>().unwrap_err();
        assert_eq!(err.kind(), "encoding");
        assert!("IPL".parse::<ItemType>().is_err());
    }

    #[test]
    fn item_type_serializes_as_label() {
        let json = serde_json::to_string(&ItemType::Wi).unwrap();
        assert_eq!(json, "\"WI\"");
        let back: ItemType = serde_json::from_str("\"PL\"").unwrap();
        assert_eq!(back, ItemType::Pl);
    }

    #[test]
    fn selling_price_columns_follow_fitted_order() {
        let inputs = SaleInputs {
            status: Some(7),
            ..SaleInputs::default()
        };
        let row = inputs.numeric_features(Mode::SellingPrice).unwrap();
        assert_eq!(
            row,
            [
                0.3223, 17.2191, 25.0, 7.0, 2.0, 0.0, 700.0, 611728.0, 1.0, 1.0, 2020.0, 1.0, 1.0,
                2020.0
            ]
        );
    }

    #[test]
    fn status_columns_place_selling_price_after_product_ref() {
        let inputs = SaleInputs {
            selling_price: Some(250.5),
            delivery_date: PartDate::new(15, 6, 2022),
            ..SaleInputs::default()
        };
        let row = inputs.numeric_features(Mode::Status).unwrap();
        assert_eq!(row[7], 250.5);
        assert_eq!(&row[11..], &[15.0, 6.0, 2022.0]);
    }

    #[test]
    fn missing_mode_field_is_invalid_input() {
        let inputs = SaleInputs {
            status: None,
            ..SaleInputs::default()
        };
        let err = inputs.numeric_features(Mode::SellingPrice).unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput { field: "status", .. }));
        // Status mode never reads the status field.
        assert!(inputs.numeric_features(Mode::Status).is_ok());
    }

    #[test]
    fn out_of_range_value_is_rejected() {
        let inputs = SaleInputs {
            country: 200,
            ..SaleInputs::default()
        };
        let err = inputs.numeric_features(Mode::Status).unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput { field: "country", .. }));
    }

    #[test]
    fn partial_json_uses_form_defaults() {
        let inputs: SaleInputs =
            serde_json::from_value(serde_json::json!({ "width": 1200.0, "item_type": "W" })).unwrap();
        assert_eq!(inputs.width, 1200.0);
        assert_eq!(inputs.country, 25);
        assert_eq!(inputs.selling_price, Some(100.0));
    }

    #[test]
    fn part_date_from_naive_date() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 9).unwrap();
        assert_eq!(PartDate::from(d), PartDate::new(9, 3, 2021));
    }
}
