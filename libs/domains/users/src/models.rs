use chrono::{DateTime, Utc};
use sea_orm::{sea_query::StringLen, DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// User roles, string-typed in the store
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Default unprivileged role
    #[default]
    #[sea_orm(string_value = "STUDENT")]
    Student,
    #[sea_orm(string_value = "INSTRUCTOR")]
    Instructor,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

/// User entity - matches the users table schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// User email; stored lowercase, unique across all users
    pub email: String,
    /// Argon2 password hash (never exposed in API responses)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Optional phone number; unique when present, matched exactly
    pub phone: Option<String>,
    pub role: UserRole,
    /// Deactivated accounts cannot log in even with a correct password
    pub is_active: bool,
    pub is_verified: bool,
    pub is_two_factor_enabled: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user (password must already be hashed, email already lowercased)
    pub fn new(
        email: String,
        first_name: String,
        last_name: String,
        phone: Option<String>,
        role: UserRole,
        password_hash: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email,
            password_hash,
            first_name,
            last_name,
            phone,
            role,
            is_active: true,
            is_verified: false,
            is_two_factor_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Apply a partial update; absent fields are left untouched.
    ///
    /// `updated_at` is only touched when the patch carries at least one field,
    /// so an empty patch leaves the entity byte-identical. Password changes go
    /// through the service, not here.
    pub fn apply_update(&mut self, update: UpdateUser) {
        if update.is_empty() {
            return;
        }

        if let Some(email) = update.email {
            self.email = email.to_lowercase();
        }
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

/// User response DTO (without password_hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Derived "{first_name} {last_name}" convenience field
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            is_verified: user.is_verified,
            is_two_factor_enabled: user.is_two_factor_enabled,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// DTO for creating a new user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[validate(length(min = 8, max = 100))]
    pub password: String,
}

/// DTO for partially updating an existing user
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

impl UpdateUser {
    /// True when no field is present; such a patch is a no-op
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

/// DTO for changing a user's password
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePassword {
    pub current_password: String,
    #[validate(length(min = 8, max = 100))]
    pub new_password: String,
}

/// DTO for user login
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    pub password: String,
}

/// Query parameters for listing users (1-based page numbering)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u64,
    pub is_active: Option<bool>,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

impl Default for ListUsersQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            is_active: None,
        }
    }
}

/// Paginated list response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub items: Vec<UserResponse>,
    /// Count of users matching the filter, independent of pagination
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// Storage-level filter for listing users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub is_active: Option<bool>,
    pub limit: u64,
    pub offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new(
            "alice@example.com".to_string(),
            "Alice".to_string(),
            "Smith".to_string(),
            None,
            UserRole::Student,
            "hashed".to_string(),
        );

        assert!(user.is_active);
        assert!(!user.is_verified);
        assert!(!user.is_two_factor_enabled);
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(user.full_name(), "Alice Smith");
    }

    #[test]
    fn test_apply_empty_update_is_noop() {
        let mut user = User::new(
            "alice@example.com".to_string(),
            "Alice".to_string(),
            "Smith".to_string(),
            None,
            UserRole::Student,
            "hashed".to_string(),
        );
        let before = user.clone();

        user.apply_update(UpdateUser::default());

        assert_eq!(user, before);
    }

    #[test]
    fn test_apply_update_touches_updated_at() {
        let mut user = User::new(
            "alice@example.com".to_string(),
            "Alice".to_string(),
            "Smith".to_string(),
            None,
            UserRole::Student,
            "hashed".to_string(),
        );
        let before = user.updated_at;

        user.apply_update(UpdateUser {
            first_name: Some("Alicia".to_string()),
            ..Default::default()
        });

        assert_eq!(user.first_name, "Alicia");
        assert_eq!(user.last_name, "Smith");
        assert!(user.updated_at >= before);
    }

    #[test]
    fn test_apply_update_lowercases_email() {
        let mut user = User::new(
            "alice@example.com".to_string(),
            "Alice".to_string(),
            "Smith".to_string(),
            None,
            UserRole::Student,
            "hashed".to_string(),
        );

        user.apply_update(UpdateUser {
            email: Some("Bob@Example.COM".to_string()),
            ..Default::default()
        });

        assert_eq!(user.email, "bob@example.com");
    }

    #[test]
    fn test_role_string_round_trip() {
        assert_eq!(UserRole::Student.to_string(), "STUDENT");
        assert_eq!(UserRole::Instructor.to_string(), "INSTRUCTOR");
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User::new(
            "alice@example.com".to_string(),
            "Alice".to_string(),
            "Smith".to_string(),
            None,
            UserRole::Student,
            "super-secret-hash".to_string(),
        );

        let entity_json = serde_json::to_string(&user).unwrap();
        assert!(!entity_json.contains("super-secret-hash"));

        let response_json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!response_json.contains("super-secret-hash"));
        assert!(response_json.contains("\"full_name\":\"Alice Smith\""));
    }
}
