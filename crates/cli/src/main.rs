use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use copper_core::artifacts::loader::ArtifactSet;
use copper_core::schema::FeatureSchema;
use copper_core::{CopperPredictor, Mode, PartDate, PredictError, SaleInputs};

#[derive(Debug, Parser)]
#[command(name = "copper_cli")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Predict the selling price of a sale.
    SellingPrice(PredictArgs),
    /// Predict whether a sale is won or lost.
    Status(PredictArgs),
    /// Load every artifact and report which prediction modes are usable.
    Check,
    /// Print the feature column layout for both modes.
    Schema,
}

/// Sale attributes. Defaults match the form defaults.
#[derive(Debug, clap::Args)]
struct PredictArgs {
    /// Read the inputs from a JSON file instead of the flags below.
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, default_value_t = 0.3223, allow_negative_numbers = true)]
    quantity_tons_log: f64,

    #[arg(long, default_value_t = 17.2191)]
    customer_log: f64,

    #[arg(long, default_value_t = 25)]
    country: i64,

    /// Only used for selling price predictions.
    #[arg(long, default_value_t = 0)]
    status: i64,

    #[arg(long, default_value_t = 2.0)]
    application: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    thickness_log: f64,

    #[arg(long, default_value_t = 700.0)]
    width: f64,

    #[arg(long, default_value_t = 611728)]
    product_ref: i64,

    /// Only used for status predictions.
    #[arg(long, default_value_t = 100.0)]
    selling_price: f64,

    /// YYYY-MM-DD
    #[arg(long, default_value = "2020-01-01")]
    item_date: String,

    /// YYYY-MM-DD
    #[arg(long, default_value = "2020-01-01")]
    delivery_date: String,

    /// One of Others, PL, S, W, WI.
    #[arg(long, default_value = "Others")]
    item_type: String,
}

impl PredictArgs {
    fn to_inputs(&self) -> anyhow::Result<SaleInputs> {
        if let Some(path) = &self.input {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read {} failed", path.display()))?;
            return serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a valid inputs document", path.display()));
        }

        Ok(SaleInputs {
            quantity_tons_log: self.quantity_tons_log,
            customer_log: self.customer_log,
            country: self.country,
            status: Some(self.status),
            application: self.application,
            thickness_log: self.thickness_log,
            width: self.width,
            product_ref: self.product_ref,
            selling_price: Some(self.selling_price),
            item_date: parse_date("item-date", &self.item_date)?,
            delivery_date: parse_date("delivery-date", &self.delivery_date)?,
            item_type: self.item_type.clone(),
        })
    }
}

fn parse_date(flag: &str, s: &str) -> anyhow::Result<PartDate> {
    let date = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("--{flag} must be YYYY-MM-DD (got {s:?})"))?;
    Ok(PartDate::from(date))
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = copper_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let artifacts = ArtifactSet::load(settings.artifact_paths());

    match args.command {
        Command::SellingPrice(predict) => {
            let predictor = CopperPredictor::new(&artifacts, settings.label_policy()?);
            let inputs = predict.to_inputs()?;
            let out = predictor
                .predict_selling_price(&inputs)
                .map_err(|e| report(Mode::SellingPrice, e))?;
            println!("Predicted Selling Price: {}", out.rendered);
        }
        Command::Status(predict) => {
            let predictor = CopperPredictor::new(&artifacts, settings.label_policy()?);
            let inputs = predict.to_inputs()?;
            let out = predictor
                .predict_status(&inputs)
                .map_err(|e| report(Mode::Status, e))?;
            println!("{}", out.rendered);
        }
        Command::Check => {
            let predictor = CopperPredictor::new(&artifacts, settings.label_policy()?);
            let status = predictor.status_report();
            println!("{}", serde_json::to_string_pretty(&status)?);
            anyhow::ensure!(status.all_ready(), "not every prediction mode is available");
        }
        Command::Schema => {
            let encoder = artifacts.encoder.clone()?;
            let schemas: Vec<FeatureSchema> = Mode::ALL
                .into_iter()
                .map(|mode| FeatureSchema::for_mode(mode, &encoder))
                .collect();
            println!("{}", serde_json::to_string_pretty(&schemas)?);
        }
    }

    Ok(())
}

/// Logs a failed prediction and converts it for the process exit path.
fn report(mode: Mode, e: PredictError) -> anyhow::Error {
    tracing::error!(%mode, kind = e.kind(), error = %e, "prediction failed");
    let err = anyhow::Error::new(e);
    sentry_anyhow::capture_anyhow(&err);
    err
}

fn init_sentry(settings: &copper_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predict_args(argv: &[&str]) -> PredictArgs {
        let args = Args::try_parse_from(argv).unwrap();
        match args.command {
            Command::SellingPrice(p) | Command::Status(p) => p,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flags_default_to_form_values() {
        let inputs = predict_args(&["copper_cli", "selling-price"]).to_inputs().unwrap();
        assert_eq!(inputs, SaleInputs::default());
    }

    #[test]
    fn dates_and_negative_values_parse() {
        let inputs = predict_args(&[
            "copper_cli",
            "status",
            "--thickness-log",
            "-0.75",
            "--item-date",
            "2021-04-30",
            "--delivery-date",
            "2022-01-15",
            "--item-type",
            "WI",
        ])
        .to_inputs()
        .unwrap();
        assert_eq!(inputs.thickness_log, -0.75);
        assert_eq!(inputs.item_date, PartDate::new(30, 4, 2021));
        assert_eq!(inputs.delivery_date, PartDate::new(15, 1, 2022));
        assert_eq!(inputs.item_type, "WI");
    }

    #[test]
    fn bad_date_names_the_flag() {
        let err = predict_args(&["copper_cli", "status", "--item-date", "01/01/2020"])
            .to_inputs()
            .unwrap_err();
        assert!(err.to_string().contains("--item-date"));
    }

    #[test]
    fn input_file_overrides_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sale.json");
        std::fs::write(
            &path,
            serde_json::json!({ "width": 1500.0, "item_type": "S", "status": 4 }).to_string(),
        )
        .unwrap();

        let path_arg = path.to_string_lossy().to_string();
        let inputs = predict_args(&["copper_cli", "selling-price", "--width", "900", "--input", &path_arg])
            .to_inputs()
            .unwrap();
        assert_eq!(inputs.width, 1500.0);
        assert_eq!(inputs.status, Some(4));
        assert_eq!(inputs.item_type, "S");
    }

    #[test]
    fn check_and_schema_take_no_arguments() {
        assert!(matches!(
            Args::try_parse_from(["copper_cli", "check"]).unwrap().command,
            Command::Check
        ));
        assert!(Args::try_parse_from(["copper_cli", "schema", "--width", "1"]).is_err());
    }
}
