use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Crop prediction record (stored in MongoDB `crop_predictions` collection)
///
/// Append-only history: records are never updated or deleted through the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropPrediction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Requesting user (hex ObjectId string)
    pub user_id: String,

    // Soil/climate inputs, stored exactly as received
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,

    /// One of the 22 crop labels
    pub predicted_crop: String,

    /// Canned fertilizer text for the predicted crop
    pub fertilizer_recommendation: String,

    /// Unix timestamp of creation
    pub created_at: i64,
}

/// Prediction as returned by the history endpoints
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PredictionResponse {
    pub id: String,
    pub user_id: String,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
    pub predicted_crop: String,
    pub fertilizer_recommendation: String,
    pub created_at: i64,
}

impl From<CropPrediction> for PredictionResponse {
    fn from(p: CropPrediction) -> Self {
        PredictionResponse {
            id: p.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: p.user_id,
            nitrogen: p.nitrogen,
            phosphorus: p.phosphorus,
            potassium: p.potassium,
            temperature: p.temperature,
            humidity: p.humidity,
            ph: p.ph,
            rainfall: p.rainfall,
            predicted_crop: p.predicted_crop,
            fertilizer_recommendation: p.fertilizer_recommendation,
            created_at: p.created_at,
        }
    }
}
