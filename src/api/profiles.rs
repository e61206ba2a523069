use crate::database::MongoDB;
use crate::models::{CreateProfileRequest, ProfileResponse, UpdateProfileRequest};
use crate::services::auth_service::Claims;
use crate::services::profile_service;
use actix_web::{web, HttpResponse, Responder};

/// GET /api/profiles - list profiles visible to the caller
#[utoipa::path(
    get,
    path = "/api/profiles",
    tag = "Profiles",
    responses(
        (status = 200, description = "Profiles visible to the caller"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_profiles(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    log::info!("📋 GET /profiles - user {}", user.sub);

    match profile_service::list_profiles(&db, &user).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Error listing profiles: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// GET /api/profiles/{id} - scoped fetch by profile id
#[utoipa::path(
    get,
    path = "/api/profiles/{id}",
    tag = "Profiles",
    responses(
        (status = 200, description = "Profile found", body = ProfileResponse),
        (status = 404, description = "Profile not found or not visible")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    let profile_id = path.into_inner();
    log::info!("👤 GET /profiles/{} - user {}", profile_id, user.sub);

    match profile_service::get_profile(&db, &user, &profile_id).await {
        Ok(Some(profile)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "profile": profile
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Profile not found"
        })),
        Err(e) => {
            log::warn!("⚠️ Error fetching profile {}: {}", profile_id, e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// POST /api/profiles - create the caller's profile
#[utoipa::path(
    post,
    path = "/api/profiles",
    tag = "Profiles",
    request_body = CreateProfileRequest,
    responses(
        (status = 201, description = "Profile created", body = ProfileResponse),
        (status = 400, description = "Invalid request or profile already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_profile(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateProfileRequest>,
) -> impl Responder {
    log::info!("📝 POST /profiles - user {}", user.sub);

    match profile_service::create_profile(&db, &user, &request).await {
        Ok(profile) => {
            log::info!("✅ Profile created: {}", profile.id);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "profile": profile
            }))
        }
        Err(e) => {
            log::warn!("⚠️ Failed to create profile: {}", e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// PUT /api/profiles/{id} - update own profile
#[utoipa::path(
    put,
    path = "/api/profiles/{id}",
    tag = "Profiles",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 404, description = "Profile not found or not visible")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    let profile_id = path.into_inner();
    log::info!("🔧 PUT /profiles/{} - user {}", profile_id, user.sub);

    match profile_service::update_profile(&db, &user, &profile_id, &request).await {
        Ok(Some(profile)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "profile": profile
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Profile not found"
        })),
        Err(e) => {
            log::warn!("⚠️ Error updating profile {}: {}", profile_id, e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// DELETE /api/profiles/{id} - delete own profile
#[utoipa::path(
    delete,
    path = "/api/profiles/{id}",
    tag = "Profiles",
    responses(
        (status = 200, description = "Profile deleted"),
        (status = 404, description = "Profile not found or not visible")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_profile(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    let profile_id = path.into_inner();
    log::info!("🗑️ DELETE /profiles/{} - user {}", profile_id, user.sub);

    match profile_service::delete_profile(&db, &user, &profile_id).await {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Profile deleted"
        })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Profile not found"
        })),
        Err(e) => {
            log::warn!("⚠️ Error deleting profile {}: {}", profile_id, e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}
