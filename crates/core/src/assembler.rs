//! Feature vector assembly and scaled inference.

use crate::artifacts::encoder::OneHotEncoder;
use crate::artifacts::model::Predictor;
use crate::artifacts::scaler::Scaler;
use crate::domain::inputs::{Mode, SaleInputs};
use crate::error::PredictError;

/// Concatenates the mode's numeric columns in fitted order with the one-hot
/// encoding of `item_type`.
///
/// `expected_width` is the width the scaler was fitted on. A different
/// assembled width means the hardcoded order has drifted from the artifacts.
pub fn build_feature_vector(
    inputs: &SaleInputs,
    mode: Mode,
    encoder: &OneHotEncoder,
    expected_width: usize,
) -> Result<Vec<f64>, PredictError> {
    let numeric = inputs.numeric_features(mode)?;
    let encoded = encoder.encode(&inputs.item_type)?;

    let mut vector = Vec::with_capacity(numeric.len() + encoded.len());
    vector.extend_from_slice(&numeric);
    vector.extend(encoded);

    if vector.len() != expected_width {
        return Err(PredictError::DimensionMismatch {
            artifact: "scaler".to_string(),
            expected: expected_width,
            actual: vector.len(),
        });
    }
    Ok(vector)
}

/// Scales an assembled vector and runs one predictor over it. Every
/// lower-level failure comes back as `PredictError::Prediction`.
pub fn scale_and_predict<P: Predictor + ?Sized>(
    vector: &[f64],
    scaler: &Scaler,
    predictor: &P,
) -> Result<P::Output, PredictError> {
    let scaled = scaler.transform(vector)?;
    predictor
        .predict(&scaled)
        .map_err(|e| PredictError::prediction(format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inputs::PartDate;
    use crate::test_support::{self, WIDTH};

    fn scenario_inputs() -> SaleInputs {
        SaleInputs {
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
            item_type: "Others".to_string(),
        }
    }

    #[test]
    fn selling_price_vector_is_fourteen_plus_one_hot() {
        let encoder = test_support::encoder();
        let v = build_feature_vector(&scenario_inputs(), Mode::SellingPrice, &encoder, WIDTH).unwrap();
        assert_eq!(v.len(), 14 + 5);
        assert_eq!(&v[14..], &[1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(v[3], 0.0);
        assert_eq!(v[7], 611728.0);
    }

    #[test]
    fn status_vector_carries_selling_price() {
        let encoder = test_support::encoder();
        let inputs = SaleInputs {
            item_type: "WI".to_string(),
            ..scenario_inputs()
        };
        let v = build_feature_vector(&inputs, Mode::Status, &encoder, WIDTH).unwrap();
        assert_eq!(v.len(), WIDTH);
        assert_eq!(v[7], 100.0);
        assert_eq!(&v[14..], &[0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn assembly_is_deterministic() {
        let encoder = test_support::encoder();
        let inputs = scenario_inputs();
        let first = build_feature_vector(&inputs, Mode::Status, &encoder, WIDTH).unwrap();
        let _ = build_feature_vector(&inputs, Mode::SellingPrice, &encoder, WIDTH).unwrap();
        let second = build_feature_vector(&inputs, Mode::Status, &encoder, WIDTH).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_item_type_never_yields_a_vector() {
        let encoder = test_support::encoder();
        let inputs = SaleInputs {
            item_type: "SLAWR".to_string(),
            ..scenario_inputs()
        };
        let err = build_feature_vector(&inputs, Mode::SellingPrice, &encoder, WIDTH).unwrap_err();
        assert!(matches!(err, PredictError::Encoding { .. }));
    }

    #[test]
    fn width_drift_is_a_dimension_mismatch() {
        let encoder = test_support::encoder();
        let err = build_feature_vector(&scenario_inputs(), Mode::SellingPrice, &encoder, 20).unwrap_err();
        assert_eq!(
            err,
            PredictError::DimensionMismatch {
                artifact: "scaler".to_string(),
                expected: 20,
                actual: 19,
            }
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn scale_and_predict_is_pure() {
        let encoder = test_support::encoder();
        let scaler = test_support::identity_scaler();
        let model = test_support::regression();
        let v = build_feature_vector(&scenario_inputs(), Mode::SellingPrice, &encoder, WIDTH).unwrap();

        let a = scale_and_predict(&v, &scaler, &model).unwrap();
        let b = scale_and_predict(&v, &scaler, &model).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, 700.0 * 0.5 + 412.25);
    }

    #[test]
    fn inference_failures_are_wrapped() {
        let scaler = test_support::identity_scaler();
        let model = test_support::classification();
        let err = scale_and_predict(&[1.0; 3], &scaler, &model).unwrap_err();
        assert_eq!(err.kind(), "prediction");
    }
}
