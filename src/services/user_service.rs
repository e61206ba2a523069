// ==================== USER MANAGEMENT ====================
// Scoped CRUD over the `users` collection. Non-admins only ever see
// their own record; foreign records are filtered out, never 403'd.

use crate::database::MongoDB;
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserResponse};
use crate::services::auth_service::Claims;
use bcrypt::{hash, DEFAULT_COST};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document, DateTime as BsonDateTime};

/// Filter matching another user already holding the requested email or
/// username. `None` when the update touches neither field.
fn uniqueness_conflict_filter(user_id: &str, request: &UpdateUserRequest) -> Option<Document> {
    let mut taken = Vec::new();
    if let Some(email) = &request.email {
        taken.push(doc! { "email": email.as_str() });
    }
    if let Some(username) = &request.username {
        taken.push(doc! { "username": username.as_str() });
    }

    if taken.is_empty() {
        return None;
    }

    Some(doc! {
        "user_id": { "$ne": user_id },
        "$or": taken
    })
}

#[derive(Debug, serde::Serialize)]
pub struct ListUsersResponse {
    pub success: bool,
    pub users: Vec<UserResponse>,
    pub count: usize,
}

/// GET /users - list users visible to the caller
pub async fn list_users(db: &MongoDB, claims: &Claims) -> Result<ListUsersResponse, String> {
    let collection = db.collection::<User>("users");

    let mut cursor = collection
        .find(claims.visibility_filter())
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let mut users = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(user) => users.push(UserResponse::from(user)),
            Err(e) => log::warn!("⚠️ Skipping unreadable user document: {}", e),
        }
    }

    let count = users.len();
    Ok(ListUsersResponse {
        success: true,
        users,
        count,
    })
}

/// GET /users/{user_id} - scoped fetch; a foreign id behaves as not-found
pub async fn get_user(
    db: &MongoDB,
    claims: &Claims,
    user_id: &str,
) -> Result<Option<UserResponse>, String> {
    if !claims.is_admin() && claims.sub != user_id {
        // Scoped out: behaves exactly like a missing record
        return Ok(None);
    }

    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    Ok(user.map(UserResponse::from))
}

/// POST /users - direct creation, same uniqueness rules as register
pub async fn create_user(
    db: &MongoDB,
    request: &CreateUserRequest,
) -> Result<UserResponse, String> {
    let collection = db.collection::<User>("users");

    if request.username.trim().is_empty() {
        return Err("Username is required".to_string());
    }
    if request.email.trim().is_empty() {
        return Err("Email is required".to_string());
    }

    let filter = doc! {
        "$or": [
            { "email": &request.email },
            { "username": &request.username }
        ]
    };

    if collection
        .find_one(filter)
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .is_some()
    {
        return Err("User already exists".to_string());
    }

    let hashed_password = hash(&request.password, DEFAULT_COST)
        .map_err(|e| format!("Failed to hash password: {}", e))?;

    let new_user = User {
        _id: None,
        user_id: ObjectId::new().to_hex(),
        username: request.username.clone(),
        email: request.email.clone(),
        name: request.name.clone(),
        password: Some(hashed_password),
        roles: vec!["user".to_string()],
        is_active: true,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
        last_login: None,
    };

    collection
        .insert_one(&new_user)
        .await
        .map_err(|e| format!("Failed to create user: {}", e))?;

    log::info!("✅ User created: {}", new_user.user_id);

    Ok(UserResponse::from(new_user))
}

/// PUT /users/{user_id} - update own record (admin: any record)
pub async fn update_user(
    db: &MongoDB,
    claims: &Claims,
    user_id: &str,
    request: &UpdateUserRequest,
) -> Result<Option<UserResponse>, String> {
    if !claims.is_admin() && claims.sub != user_id {
        // Scoped out: behaves exactly like a missing record
        return Ok(None);
    }

    let collection = db.collection::<User>("users");

    // Same uniqueness rules as register/create: taking another user's
    // email or username is a client error, not a unique-index blowup.
    if let Some(conflict) = uniqueness_conflict_filter(user_id, request) {
        if collection
            .find_one(conflict)
            .await
            .map_err(|e| format!("Database error: {}", e))?
            .is_some()
        {
            return Err("User already exists".to_string());
        }
    }

    let mut set = doc! { "updated_at": BsonDateTime::now() };
    if let Some(username) = &request.username {
        set.insert("username", username.as_str());
    }
    if let Some(email) = &request.email {
        set.insert("email", email.as_str());
    }
    if let Some(name) = &request.name {
        set.insert("name", name.as_str());
    }

    let result = collection
        .update_one(doc! { "user_id": user_id }, doc! { "$set": set })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    if result.matched_count == 0 {
        return Ok(None);
    }

    let updated = collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    Ok(updated.map(UserResponse::from))
}

/// DELETE /users/{user_id} - delete the user plus profile and prediction history
pub async fn delete_user(db: &MongoDB, claims: &Claims, user_id: &str) -> Result<bool, String> {
    if !claims.is_admin() && claims.sub != user_id {
        return Ok(false);
    }

    let users = db.collection::<User>("users");
    let result = users
        .delete_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Failed to delete user: {}", e))?;

    if result.deleted_count == 0 {
        return Ok(false);
    }

    // Cascade: profile and prediction history
    let profiles = db.collection::<Document>("farmer_profiles");
    let deleted_profiles = profiles
        .delete_many(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Failed to delete profile: {}", e))?;

    let predictions = db.collection::<Document>("crop_predictions");
    let deleted_predictions = predictions
        .delete_many(doc! { "user_id": user_id })
        .await
        .map_err(|e| format!("Failed to delete predictions: {}", e))?;

    log::info!(
        "🗑️ Deleted user {} ({} profile, {} predictions)",
        user_id,
        deleted_profiles.deleted_count,
        deleted_predictions.deleted_count
    );

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_request(email: Option<&str>, username: Option<&str>) -> UpdateUserRequest {
        UpdateUserRequest {
            username: username.map(str::to_string),
            email: email.map(str::to_string),
            name: None,
        }
    }

    #[test]
    fn test_conflict_filter_excludes_target_user() {
        let request = update_request(Some("new@example.com"), None);
        let filter = uniqueness_conflict_filter("abc123", &request).unwrap();

        let exclusion = filter.get_document("user_id").unwrap();
        assert_eq!(exclusion.get_str("$ne").unwrap(), "abc123");

        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 1);
    }

    #[test]
    fn test_conflict_filter_covers_username_and_email() {
        let request = update_request(Some("new@example.com"), Some("newname"));
        let filter = uniqueness_conflict_filter("abc123", &request).unwrap();

        assert_eq!(filter.get_array("$or").unwrap().len(), 2);
    }

    #[test]
    fn test_no_conflict_check_when_identity_untouched() {
        let mut request = update_request(None, None);
        request.name = Some("New Name".to_string());

        assert!(uniqueness_conflict_filter("abc123", &request).is_none());
    }
}
