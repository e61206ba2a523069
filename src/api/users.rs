use crate::models::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::services::auth_service::Claims;
use crate::services::user_service;
use crate::database::MongoDB;
use actix_web::{web, HttpResponse, Responder};

/// GET /api/users - list users visible to the caller
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Users visible to the caller"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> impl Responder {
    log::info!("📋 GET /users - user {}", user.sub);

    match user_service::list_users(&db, &user).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Error listing users: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// GET /api/users/{user_id} - scoped fetch
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "Users",
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found or not visible")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = path.into_inner();
    log::info!("👤 GET /users/{} - user {}", user_id, user.sub);

    match user_service::get_user(&db, &user, &user_id).await {
        Ok(Some(found)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": found
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "User not found"
        })),
        Err(e) => {
            log::error!("❌ Error fetching user {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// POST /api/users - create a user
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request or user already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CreateUserRequest>,
) -> impl Responder {
    log::info!("📝 POST /users - by {}", user.sub);

    match user_service::create_user(&db, &request).await {
        Ok(created) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "user": created
        })),
        Err(e) => {
            log::warn!("⚠️ Failed to create user: {}", e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// PUT /api/users/{user_id} - update own record (admin: any)
#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    tag = "Users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Email or username already in use"),
        (status = 404, description = "User not found or not visible")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateUserRequest>,
) -> impl Responder {
    let user_id = path.into_inner();
    log::info!("🔧 PUT /users/{} - user {}", user_id, user.sub);

    match user_service::update_user(&db, &user, &user_id, &request).await {
        Ok(Some(updated)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": updated
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "User not found"
        })),
        Err(e) if e == "User already exists" => {
            log::warn!("⚠️ Conflicting update for user {}: {}", user_id, e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
        Err(e) => {
            log::error!("❌ Error updating user {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// DELETE /api/users/{user_id} - delete user plus profile and predictions
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    tag = "Users",
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found or not visible")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = path.into_inner();
    log::info!("🗑️ DELETE /users/{} - user {}", user_id, user.sub);

    match user_service::delete_user(&db, &user, &user_id).await {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "User deleted"
        })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "User not found"
        })),
        Err(e) => {
            log::error!("❌ Error deleting user {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}
