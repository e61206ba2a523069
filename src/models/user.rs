use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// User account (stored in MongoDB `users` collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    /// PRIMARY IDENTIFIER - hex ObjectId string used across collections
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    /// bcrypt hash; never serialized back to clients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
    pub last_login: Option<BsonDateTime>,
}

fn default_roles() -> Vec<String> {
    vec!["user".to_string()]
}

fn default_is_active() -> bool {
    true
}

/// Request to create a user directly (same validation as register)
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Request to update a user (all fields optional)
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Public view of a user (no password hash, no Mongo internals)
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.user_id,
            username: user.username,
            email: user.email,
            name: user.name,
            roles: user.roles,
            is_active: user.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            _id: None,
            user_id: "abc123".to_string(),
            username: "farmer1".to_string(),
            email: "farmer1@example.com".to_string(),
            name: Some("Farmer One".to_string()),
            password: Some("$2b$12$hash".to_string()),
            roles: vec!["user".to_string()],
            is_active: true,
            created_at: None,
            updated_at: None,
            last_login: None,
        }
    }

    #[test]
    fn test_response_hides_password() {
        let response = UserResponse::from(sample_user());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["username"], "farmer1");
    }

    #[test]
    fn test_defaults_applied_on_deserialize() {
        // Old documents without roles/is_active still deserialize
        let user: User = serde_json::from_value(serde_json::json!({
            "user_id": "abc123",
            "username": "farmer1",
            "email": "farmer1@example.com",
            "name": null,
            "created_at": null,
            "updated_at": null,
            "last_login": null
        }))
        .unwrap();
        assert_eq!(user.roles, vec!["user".to_string()]);
        assert!(user.is_active);
    }
}
