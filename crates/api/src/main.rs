use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use copper_core::artifacts::loader::ArtifactSet;
use copper_core::schema::{form_section, FormSection};
use copper_core::{
    CopperPredictor, LabelPolicy, Mode, PredictError, PricePrediction, SaleInputs,
    StatusPrediction, StatusReport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = copper_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let label_policy = settings.label_policy()?;
    let artifacts = ArtifactSet::load(settings.artifact_paths());
    let predictor = CopperPredictor::new(&artifacts, label_policy);
    if !predictor.status_report().all_ready() {
        tracing::warn!(
            loaded = artifacts.loaded_count(),
            "not every prediction mode is available; starting API in degraded mode"
        );
    }

    let state = AppState {
        predictor: Arc::new(predictor),
    };

    let port = settings.port()?;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/overview", get(overview))
        .route("/form", get(form))
        .route("/artifacts", get(artifacts))
        .route("/predict/selling-price", post(predict_selling_price))
        .route("/predict/status", post(predict_status))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    predictor: Arc<CopperPredictor>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

/// Renders a failed interaction; the process keeps serving.
#[derive(Debug)]
struct ApiError(PredictError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PredictError::InvalidInput { .. } | PredictError::Encoding { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PredictError::ArtifactLoad { .. }
            | PredictError::DimensionMismatch { .. }
            | PredictError::SchemaMismatch { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            sentry_anyhow::capture_anyhow(&anyhow::Error::new(self.0.clone()));
        }
        let body = ErrorBody {
            kind: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// A body that fails to deserialize is an input error, rendered like any
/// other.
fn sale_inputs(
    payload: Result<Json<SaleInputs>, JsonRejection>,
) -> Result<SaleInputs, ApiError> {
    payload.map(|Json(inputs)| inputs).map_err(|rejection| {
        ApiError(PredictError::InvalidInput {
            field: "body",
            detail: rejection.body_text(),
        })
    })
}

#[derive(Debug, Serialize)]
struct Overview {
    title: &'static str,
    summary: [&'static str; 2],
    sections: [&'static str; 3],
    label_policy: LabelPolicy,
    status: StatusReport,
}

async fn overview(State(state): State<AppState>) -> Json<Overview> {
    Json(Overview {
        title: "Copper Modeling Overview",
        summary: [
            "Predicts the selling price of a copper sale and whether the deal is won or lost, \
             from its dimensions, dates, customer and country codes, and item type.",
            "Inputs are one-hot encoded and scaled with the fitted preprocessing artifacts \
             before being passed to the pre-trained regression and classification models.",
        ],
        sections: ["Overview", "Selling Price", "Status"],
        label_policy: state.predictor.label_policy(),
        status: state.predictor.status_report(),
    })
}

async fn form() -> Json<Vec<FormSection>> {
    Json(Mode::ALL.into_iter().map(form_section).collect())
}

async fn artifacts(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.predictor.status_report())
}

#[derive(Debug, Serialize)]
struct ApiPrediction<T> {
    prediction_id: Uuid,
    #[serde(flatten)]
    prediction: T,
}

async fn predict_selling_price(
    State(state): State<AppState>,
    payload: Result<Json<SaleInputs>, JsonRejection>,
) -> Result<Json<ApiPrediction<PricePrediction>>, ApiError> {
    let prediction_id = Uuid::new_v4();
    let inputs = sale_inputs(payload)?;
    let prediction = state.predictor.predict_selling_price(&inputs).map_err(|e| {
        tracing::warn!(%prediction_id, mode = %Mode::SellingPrice, kind = e.kind(), error = %e, "prediction failed");
        ApiError(e)
    })?;
    tracing::info!(%prediction_id, mode = %Mode::SellingPrice, rendered = %prediction.rendered, "prediction served");
    Ok(Json(ApiPrediction {
        prediction_id,
        prediction,
    }))
}

async fn predict_status(
    State(state): State<AppState>,
    payload: Result<Json<SaleInputs>, JsonRejection>,
) -> Result<Json<ApiPrediction<StatusPrediction>>, ApiError> {
    let prediction_id = Uuid::new_v4();
    let inputs = sale_inputs(payload)?;
    let prediction = state.predictor.predict_status(&inputs).map_err(|e| {
        tracing::warn!(%prediction_id, mode = %Mode::Status, kind = e.kind(), error = %e, "prediction failed");
        ApiError(e)
    })?;
    tracing::info!(%prediction_id, mode = %Mode::Status, rendered = %prediction.rendered, "prediction served");
    Ok(Json(ApiPrediction {
        prediction_id,
        prediction,
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
