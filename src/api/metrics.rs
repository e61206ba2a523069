use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static PREDICTION_COUNT: AtomicU64 = AtomicU64::new(0);
static PREDICTION_ERROR_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn increment_prediction_count() {
    PREDICTION_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_prediction_error_count() {
    PREDICTION_ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub crop_predictions_total: u64,
    pub crop_prediction_errors_total: u64,
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "System metrics", body = MetricsResponse)
    )
)]
pub async fn get_metrics() -> HttpResponse {
    let predictions = PREDICTION_COUNT.load(Ordering::Relaxed);
    let errors = PREDICTION_ERROR_COUNT.load(Ordering::Relaxed);

    let metrics = format!(
        "# HELP crop_predictions_total Total number of crop prediction requests\n\
         # TYPE crop_predictions_total counter\n\
         crop_predictions_total {}\n\
         \n\
         # HELP crop_prediction_errors_total Total number of failed crop prediction requests\n\
         # TYPE crop_prediction_errors_total counter\n\
         crop_prediction_errors_total {}\n",
        predictions, errors
    );

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics)
}
