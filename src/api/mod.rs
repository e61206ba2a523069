pub mod auth;
pub mod health;
pub mod metrics;
pub mod predictions;
pub mod profiles;
pub mod swagger;
pub mod users;
