// ==================== FARMER PROFILE MANAGEMENT ====================
// One profile per user, enforced both here and by the unique index on
// farmer_profiles(user_id). Scoping mirrors user_service: non-admins
// only see their own profile, foreign ids behave as not-found.

use crate::database::MongoDB;
use crate::models::{CreateProfileRequest, FarmerProfile, ProfileResponse, UpdateProfileRequest};
use crate::services::auth_service::Claims;
use chrono::Utc;
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId};

/// Field validation shared by create (both fields present) and update
/// (either field optional).
fn validate_profile_input(location: Option<&str>, farm_size: Option<f64>) -> Result<(), String> {
    if let Some(location) = location {
        if location.trim().is_empty() {
            return Err("Location is required".to_string());
        }
    }
    if let Some(farm_size) = farm_size {
        if !(farm_size > 0.0) {
            return Err("Farm size must be a positive number of acres".to_string());
        }
    }
    Ok(())
}

/// One profile per user: a second creation attempt is rejected
fn reject_second_profile(existing: Option<&FarmerProfile>) -> Result<(), String> {
    if existing.is_some() {
        return Err("Profile already exists".to_string());
    }
    Ok(())
}

#[derive(Debug, serde::Serialize)]
pub struct ListProfilesResponse {
    pub success: bool,
    pub profiles: Vec<ProfileResponse>,
    pub count: usize,
}

/// GET /profiles - list profiles visible to the caller
pub async fn list_profiles(db: &MongoDB, claims: &Claims) -> Result<ListProfilesResponse, String> {
    let collection = db.collection::<FarmerProfile>("farmer_profiles");

    let mut cursor = collection
        .find(claims.visibility_filter())
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let mut profiles = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(profile) => profiles.push(ProfileResponse::from(profile)),
            Err(e) => log::warn!("⚠️ Skipping unreadable profile document: {}", e),
        }
    }

    let count = profiles.len();
    Ok(ListProfilesResponse {
        success: true,
        profiles,
        count,
    })
}

/// GET /profiles/{id} - scoped fetch by profile id
pub async fn get_profile(
    db: &MongoDB,
    claims: &Claims,
    profile_id: &str,
) -> Result<Option<ProfileResponse>, String> {
    let object_id =
        ObjectId::parse_str(profile_id).map_err(|_| "Invalid profile ID".to_string())?;

    let collection = db.collection::<FarmerProfile>("farmer_profiles");

    let mut filter = claims.visibility_filter();
    filter.insert("_id", object_id);

    let profile = collection
        .find_one(filter)
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    Ok(profile.map(ProfileResponse::from))
}

/// POST /profiles - create the caller's profile
///
/// A second creation attempt for the same user is rejected.
pub async fn create_profile(
    db: &MongoDB,
    claims: &Claims,
    request: &CreateProfileRequest,
) -> Result<ProfileResponse, String> {
    validate_profile_input(Some(&request.location), Some(request.farm_size))?;

    let collection = db.collection::<FarmerProfile>("farmer_profiles");

    let existing = collection
        .find_one(doc! { "user_id": &claims.sub })
        .await
        .map_err(|e| format!("Database error: {}", e))?;
    reject_second_profile(existing.as_ref())?;

    let now = Utc::now().timestamp();
    let mut profile = FarmerProfile {
        id: None,
        user_id: claims.sub.clone(),
        location: request.location.clone(),
        farm_size: request.farm_size,
        created_at: now,
        updated_at: now,
    };

    // The unique index catches the race where two requests pass the
    // check above at the same time.
    let result = collection
        .insert_one(&profile)
        .await
        .map_err(|e| format!("Failed to create profile: {}", e))?;

    profile.id = result.inserted_id.as_object_id();

    log::info!("✅ Profile created for user {}", claims.sub);

    Ok(ProfileResponse::from(profile))
}

/// PUT /profiles/{id} - update own profile (admin: any)
pub async fn update_profile(
    db: &MongoDB,
    claims: &Claims,
    profile_id: &str,
    request: &UpdateProfileRequest,
) -> Result<Option<ProfileResponse>, String> {
    let object_id =
        ObjectId::parse_str(profile_id).map_err(|_| "Invalid profile ID".to_string())?;

    validate_profile_input(request.location.as_deref(), request.farm_size)?;

    let collection = db.collection::<FarmerProfile>("farmer_profiles");

    let mut filter = claims.visibility_filter();
    filter.insert("_id", object_id);

    let mut set = doc! { "updated_at": Utc::now().timestamp() };
    if let Some(location) = &request.location {
        set.insert("location", location.as_str());
    }
    if let Some(farm_size) = request.farm_size {
        set.insert("farm_size", farm_size);
    }

    let result = collection
        .update_one(filter.clone(), doc! { "$set": set })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    if result.matched_count == 0 {
        return Ok(None);
    }

    let updated = collection
        .find_one(filter)
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    Ok(updated.map(ProfileResponse::from))
}

/// DELETE /profiles/{id} - delete own profile (admin: any)
pub async fn delete_profile(
    db: &MongoDB,
    claims: &Claims,
    profile_id: &str,
) -> Result<bool, String> {
    let object_id =
        ObjectId::parse_str(profile_id).map_err(|_| "Invalid profile ID".to_string())?;

    let collection = db.collection::<FarmerProfile>("farmer_profiles");

    let mut filter = claims.visibility_filter();
    filter.insert("_id", object_id);

    let result = collection
        .delete_one(filter)
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    Ok(result.deleted_count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing_profile() -> FarmerProfile {
        FarmerProfile {
            id: Some(ObjectId::new()),
            user_id: ObjectId::new().to_hex(),
            location: "Nashik, Maharashtra".to_string(),
            farm_size: 4.5,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_valid_input_accepted() {
        assert!(validate_profile_input(Some("Nashik"), Some(4.5)).is_ok());
        // Update touching neither field only bumps updated_at
        assert!(validate_profile_input(None, None).is_ok());
    }

    #[test]
    fn test_empty_location_rejected() {
        let err = validate_profile_input(Some("   "), Some(4.5)).unwrap_err();
        assert_eq!(err, "Location is required");
    }

    #[test]
    fn test_non_positive_farm_size_rejected() {
        for farm_size in [0.0, -1.0, f64::NAN] {
            let err = validate_profile_input(Some("Nashik"), Some(farm_size)).unwrap_err();
            assert!(err.contains("positive"));
        }
    }

    #[test]
    fn test_second_profile_rejected() {
        let existing = existing_profile();
        let err = reject_second_profile(Some(&existing)).unwrap_err();
        assert_eq!(err, "Profile already exists");
    }

    #[test]
    fn test_first_profile_allowed() {
        assert!(reject_second_profile(None).is_ok());
    }
}
