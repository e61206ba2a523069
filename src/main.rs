mod api;
mod database;
mod middleware;
mod ml;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use std::path::Path;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3002".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let model_path =
        env::var("MODEL_PATH").unwrap_or_else(|_| "ml_models/cropmodel.json".to_string());

    log::info!("🚀 Starting Farm Helper Service...");
    log::info!("📊 Database: {}", database_url);
    log::info!("🌾 Model artifact: {}", model_path);

    // Load the crop model once; a missing or corrupt artifact is fatal
    let model = match ml::CropModel::load(Path::new(&model_path)) {
        Ok(model) => model,
        Err(e) => {
            log::error!("❌ Failed to load crop model: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()));
        }
    };
    let model_data = web::Data::new(model);
    log::info!("✅ Crop model loaded");

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(model_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Auth endpoints
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(api::auth::register))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/refresh", web::post().to(api::auth::refresh_token))
                    .service(
                        web::resource("/verify")
                            .wrap(middleware::AuthMiddleware)
                            .route(web::get().to(api::auth::verify_token)),
                    )
                    .service(
                        web::resource("/me")
                            .wrap(middleware::AuthMiddleware)
                            .route(web::get().to(api::auth::get_me)),
                    ),
            )
            // Users: scoped CRUD
            .service(
                web::scope("/api/users")
                    .wrap(middleware::AuthMiddleware)
                    .route("", web::get().to(api::users::list_users))
                    .route("", web::post().to(api::users::create_user))
                    .route("/{user_id}", web::get().to(api::users::get_user))
                    .route("/{user_id}", web::put().to(api::users::update_user))
                    .route("/{user_id}", web::delete().to(api::users::delete_user)),
            )
            // Farmer profiles: scoped CRUD, one per user
            .service(
                web::scope("/api/profiles")
                    .wrap(middleware::AuthMiddleware)
                    .route("", web::get().to(api::profiles::list_profiles))
                    .route("", web::post().to(api::profiles::create_profile))
                    .route("/{id}", web::get().to(api::profiles::get_profile))
                    .route("/{id}", web::put().to(api::profiles::update_profile))
                    .route("/{id}", web::delete().to(api::profiles::delete_profile)),
            )
            // Crop prediction + append-only history
            .service(
                web::resource("/api/predict-crop")
                    .wrap(middleware::AuthMiddleware)
                    .route(web::post().to(api::predictions::predict_crop)),
            )
            .service(
                web::scope("/api/predictions")
                    .wrap(middleware::AuthMiddleware)
                    .route("", web::get().to(api::predictions::list_predictions))
                    .route("/{id}", web::get().to(api::predictions::get_prediction)),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
