// ==================== CROP PREDICTION ====================
// Wraps the pre-trained classifier: parse the seven inputs, predict,
// persist the input/output tuple as append-only history.

use crate::database::MongoDB;
use crate::ml::CropModel;
use crate::models::{CropPrediction, PredictionResponse};
use crate::services::auth_service::Claims;
use chrono::Utc;
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Body of POST /predict-crop. Fields arrive as raw JSON values so that
/// both numbers and numeric strings are accepted, and so a missing or
/// non-numeric field produces our 400 payload instead of a framework
/// deserialization error.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PredictCropRequest {
    #[schema(value_type = f64)]
    pub nitrogen: Option<serde_json::Value>,
    #[schema(value_type = f64)]
    pub phosphorus: Option<serde_json::Value>,
    #[schema(value_type = f64)]
    pub potassium: Option<serde_json::Value>,
    #[schema(value_type = f64)]
    pub temperature: Option<serde_json::Value>,
    #[schema(value_type = f64)]
    pub humidity: Option<serde_json::Value>,
    #[schema(value_type = f64)]
    pub ph: Option<serde_json::Value>,
    #[schema(value_type = f64)]
    pub rainfall: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PredictCropResponse {
    pub success: bool,
    pub prediction_id: String,
    pub predicted_crop: String,
    pub fertilizer_recommendation: String,
}

#[derive(Debug, Serialize)]
pub struct ListPredictionsResponse {
    pub success: bool,
    pub predictions: Vec<PredictionResponse>,
    pub count: usize,
}

/// Parses one input field. Accepts JSON numbers and numeric strings;
/// anything else (or a missing field) is an error naming the field.
fn parse_feature(name: &str, value: &Option<serde_json::Value>) -> Result<f64, String> {
    let value = value
        .as_ref()
        .ok_or_else(|| format!("Field '{}' is required", name))?;

    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("Field '{}' is not a valid number", name)),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Field '{}' is not a valid number: '{}'", name, s)),
        _ => Err(format!("Field '{}' is not a valid number", name)),
    }
}

/// Extracts the seven features in model order
pub fn parse_features(request: &PredictCropRequest) -> Result<[f64; 7], String> {
    Ok([
        parse_feature("nitrogen", &request.nitrogen)?,
        parse_feature("phosphorus", &request.phosphorus)?,
        parse_feature("potassium", &request.potassium)?,
        parse_feature("temperature", &request.temperature)?,
        parse_feature("humidity", &request.humidity)?,
        parse_feature("ph", &request.ph)?,
        parse_feature("rainfall", &request.rainfall)?,
    ])
}

/// POST /predict-crop - predict and persist
pub async fn predict_crop(
    db: &MongoDB,
    model: &CropModel,
    claims: &Claims,
    request: &PredictCropRequest,
) -> Result<PredictCropResponse, String> {
    let features = parse_features(request)?;

    let (predicted_crop, fertilizer_recommendation) = model.predict_crop(&features)?;

    let prediction = CropPrediction {
        id: None,
        user_id: claims.sub.clone(),
        nitrogen: features[0],
        phosphorus: features[1],
        potassium: features[2],
        temperature: features[3],
        humidity: features[4],
        ph: features[5],
        rainfall: features[6],
        predicted_crop: predicted_crop.clone(),
        fertilizer_recommendation: fertilizer_recommendation.clone(),
        created_at: Utc::now().timestamp(),
    };

    let collection = db.collection::<CropPrediction>("crop_predictions");
    let result = collection
        .insert_one(&prediction)
        .await
        .map_err(|e| format!("Failed to save prediction: {}", e))?;

    let prediction_id = result
        .inserted_id
        .as_object_id()
        .map(|id| id.to_hex())
        .unwrap_or_default();

    log::info!(
        "🌾 Prediction {} for user {}: {}",
        prediction_id,
        claims.sub,
        predicted_crop
    );

    Ok(PredictCropResponse {
        success: true,
        prediction_id,
        predicted_crop,
        fertilizer_recommendation,
    })
}

/// GET /predictions - the caller's history, newest first (admin: all)
pub async fn list_predictions(
    db: &MongoDB,
    claims: &Claims,
) -> Result<ListPredictionsResponse, String> {
    let collection = db.collection::<CropPrediction>("crop_predictions");

    let mut cursor = collection
        .find(claims.visibility_filter())
        .sort(doc! { "created_at": -1 })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let mut predictions = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(prediction) => predictions.push(PredictionResponse::from(prediction)),
            Err(e) => log::warn!("⚠️ Skipping unreadable prediction document: {}", e),
        }
    }

    let count = predictions.len();
    Ok(ListPredictionsResponse {
        success: true,
        predictions,
        count,
    })
}

/// GET /predictions/{id} - scoped fetch; records are immutable so this is
/// the only single-record operation on history
pub async fn get_prediction(
    db: &MongoDB,
    claims: &Claims,
    prediction_id: &str,
) -> Result<Option<PredictionResponse>, String> {
    let object_id =
        ObjectId::parse_str(prediction_id).map_err(|_| "Invalid prediction ID".to_string())?;

    let collection = db.collection::<CropPrediction>("crop_predictions");

    let mut filter = claims.visibility_filter();
    filter.insert("_id", object_id);

    let prediction = collection
        .find_one(filter)
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    Ok(prediction.map(PredictionResponse::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_request() -> PredictCropRequest {
        PredictCropRequest {
            nitrogen: Some(json!(90)),
            phosphorus: Some(json!(42.0)),
            potassium: Some(json!("43")),
            temperature: Some(json!(20.88)),
            humidity: Some(json!(82.0)),
            ph: Some(json!("6.5")),
            rainfall: Some(json!(202.93)),
        }
    }

    #[test]
    fn test_parse_features_accepts_numbers_and_numeric_strings() {
        let features = parse_features(&full_request()).unwrap();
        assert_eq!(features[0], 90.0);
        assert_eq!(features[2], 43.0);
        assert_eq!(features[5], 6.5);
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let mut request = full_request();
        request.ph = None;

        let err = parse_features(&request).unwrap_err();
        assert!(err.contains("'ph'"));
        assert!(err.contains("required"));
    }

    #[test]
    fn test_non_numeric_field_names_the_field() {
        let mut request = full_request();
        request.rainfall = Some(json!("lots"));

        let err = parse_features(&request).unwrap_err();
        assert!(err.contains("'rainfall'"));
    }

    #[test]
    fn test_non_scalar_field_rejected() {
        let mut request = full_request();
        request.nitrogen = Some(json!({ "value": 90 }));

        assert!(parse_features(&request).is_err());
    }

    #[test]
    fn test_no_range_validation() {
        // Out-of-range agronomic values are accepted as-is
        let mut request = full_request();
        request.ph = Some(json!(-40.0));
        request.humidity = Some(json!(900.0));

        let features = parse_features(&request).unwrap();
        assert_eq!(features[5], -40.0);
        assert_eq!(features[4], 900.0);
    }
}
