use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Farmer profile (stored in MongoDB `farmer_profiles` collection)
///
/// One-to-one with a user: the `user_id` field carries a unique index,
/// so a second insert for the same user fails at the database level too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmerProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Owning user (hex ObjectId string)
    pub user_id: String,

    /// Free-text location (village, district, region)
    pub location: String,

    /// Farm size in acres, strictly positive
    pub farm_size: f64,

    /// Unix timestamp of creation
    pub created_at: i64,

    /// Unix timestamp of last update
    pub updated_at: i64,
}

/// Request to create a farmer profile
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateProfileRequest {
    pub location: String,
    pub farm_size: f64,
}

/// Request to update a farmer profile
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub location: Option<String>,
    pub farm_size: Option<f64>,
}

/// Profile as returned by the API
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    pub id: String,
    pub user_id: String,
    pub location: String,
    pub farm_size: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<FarmerProfile> for ProfileResponse {
    fn from(profile: FarmerProfile) -> Self {
        ProfileResponse {
            id: profile.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: profile.user_id,
            location: profile.location,
            farm_size: profile.farm_size,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_from_profile() {
        let oid = ObjectId::new();
        let profile = FarmerProfile {
            id: Some(oid),
            user_id: "abc123".to_string(),
            location: "Nashik, Maharashtra".to_string(),
            farm_size: 4.5,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        };

        let response = ProfileResponse::from(profile);
        assert_eq!(response.id, oid.to_hex());
        assert_eq!(response.user_id, "abc123");
        assert_eq!(response.farm_size, 4.5);
    }
}
