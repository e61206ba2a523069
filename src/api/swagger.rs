use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Farm Helper API",
        version = "1.0.0",
        description = "Backend for the Farm Helper application. \n\n**Authentication:** All /api endpoints except register and login require a JWT Bearer token.\n\n**Features:**\n- User accounts and farmer profiles (scoped CRUD)\n- Crop recommendation from soil and climate inputs\n- Fertilizer recommendation per crop\n- Prediction history\n- Health monitoring and metrics",
        contact(
            name = "Farm Helper Team",
            email = "support@farmhelper.app"
        )
    ),
    paths(
        // Auth endpoints
        crate::api::auth::login,
        crate::api::auth::register,
        crate::api::auth::refresh_token,
        crate::api::auth::verify_token,
        crate::api::auth::get_me,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Users
        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::create_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        // Profiles
        crate::api::profiles::list_profiles,
        crate::api::profiles::get_profile,
        crate::api::profiles::create_profile,
        crate::api::profiles::update_profile,
        crate::api::profiles::delete_profile,

        // Predictions
        crate::api::predictions::predict_crop,
        crate::api::predictions::list_predictions,
        crate::api::predictions::get_prediction,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::RefreshTokenRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::UserInfo,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,

            // Users
            crate::models::user::CreateUserRequest,
            crate::models::user::UpdateUserRequest,
            crate::models::user::UserResponse,

            // Profiles
            crate::models::profile::CreateProfileRequest,
            crate::models::profile::UpdateProfileRequest,
            crate::models::profile::ProfileResponse,

            // Predictions
            crate::services::prediction_service::PredictCropRequest,
            crate::services::prediction_service::PredictCropResponse,
            crate::models::prediction::PredictionResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and token management."),
        (name = "Health", description = "Health check and metrics endpoints for monitoring service status."),
        (name = "Users", description = "User accounts. Non-admin callers only see their own record."),
        (name = "Profiles", description = "Farmer profiles, one per user: location and farm size."),
        (name = "Predictions", description = "Crop and fertilizer recommendation from soil/climate inputs, with per-user history."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
