use crate::api::metrics;
use crate::database::MongoDB;
use crate::ml::CropModel;
use crate::models::PredictionResponse;
use crate::services::auth_service::Claims;
use crate::services::prediction_service;
use crate::services::prediction_service::{PredictCropRequest, PredictCropResponse};
use actix_web::{web, HttpResponse, Responder};

/// POST /api/predict-crop - run the classifier and persist the result
///
/// Every prediction-path failure (missing field, non-numeric value, model
/// fault, storage fault) collapses to a single 400 payload carrying the
/// error message.
#[utoipa::path(
    post,
    path = "/api/predict-crop",
    tag = "Predictions",
    request_body = PredictCropRequest,
    responses(
        (status = 200, description = "Prediction created", body = PredictCropResponse),
        (status = 400, description = "Invalid input or prediction failure")
    ),
    security(("bearer_auth" = []))
)]
pub async fn predict_crop(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    model: web::Data<CropModel>,
    request: web::Json<PredictCropRequest>,
) -> impl Responder {
    log::info!("🌾 POST /predict-crop - user {}", user.sub);
    metrics::increment_prediction_count();

    match prediction_service::predict_crop(&db, &model, &user, &request).await {
        Ok(response) => {
            log::info!(
                "✅ Predicted '{}' for user {}",
                response.predicted_crop,
                user.sub
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("⚠️ Prediction failed for user {}: {}", user.sub, e);
            metrics::increment_prediction_error_count();
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// GET /api/predictions - the caller's prediction history, newest first
#[utoipa::path(
    get,
    path = "/api/predictions",
    tag = "Predictions",
    responses(
        (status = 200, description = "Prediction history"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_predictions(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> impl Responder {
    log::info!("📋 GET /predictions - user {}", user.sub);

    match prediction_service::list_predictions(&db, &user).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Error listing predictions: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// GET /api/predictions/{id} - scoped fetch of one immutable record
#[utoipa::path(
    get,
    path = "/api/predictions/{id}",
    tag = "Predictions",
    responses(
        (status = 200, description = "Prediction found", body = PredictionResponse),
        (status = 404, description = "Prediction not found or not visible")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_prediction(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    let prediction_id = path.into_inner();
    log::info!("🔎 GET /predictions/{} - user {}", prediction_id, user.sub);

    match prediction_service::get_prediction(&db, &user, &prediction_id).await {
        Ok(Some(prediction)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "prediction": prediction
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Prediction not found"
        })),
        Err(e) => {
            log::warn!("⚠️ Error fetching prediction {}: {}", prediction_id, e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}
