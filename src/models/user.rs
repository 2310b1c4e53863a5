//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::text_enum;
use crate::error::{AppError, AppResult};

/// User role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

text_enum!(Role {
    User => "user",
    Admin => "admin",
});

impl Role {
    /// Admin satisfies every requirement, user only satisfies `user`
    pub fn satisfies(self, required: Role) -> bool {
        match required {
            Role::User => true,
            Role::Admin => self == Role::Admin,
        }
    }
}

/// Role policy shared by every admin-gated operation
pub fn require_role(caller: Role, required: Role) -> AppResult<()> {
    if caller.satisfies(required) {
        Ok(())
    } else {
        Err(AppError::Authorization(format!(
            "{} privileges required",
            required
        )))
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub student_id: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing, default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Short user representation embedded in checkout listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserShort {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// User query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Substring of name, email or student id
    pub search: Option<String>,
    pub role: Option<Role>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Repository-level user filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
}

impl UserQuery {
    pub fn filter(&self) -> UserFilter {
        UserFilter {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            role: self.role,
        }
    }
}

/// Create user request (admin creation and public registration)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, max = 255, message = "Password must be 6-255 characters"))]
    pub password: String,
    #[validate(length(max = 50, message = "Student ID must be at most 50 characters"))]
    pub student_id: Option<String>,
    pub role: Option<Role>,
}

/// Update user request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 255, message = "Password must be 6-255 characters"))]
    pub password: Option<String>,
    /// Empty string clears the student id
    #[validate(length(max = 50, message = "Student ID must be at most 50 characters"))]
    pub student_id: Option<String>,
    pub role: Option<Role>,
}

/// Update role request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRole {
    pub role: Role,
}

/// Change own password request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePassword {
    pub current_password: String,
    #[validate(length(min = 6, max = 255, message = "Password must be 6-255 characters"))]
    pub new_password: String,
}

/// Values for a user insert; the password is already hashed
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub student_id: Option<String>,
    pub role: Role,
}

/// Blank student ids are treated as absent
pub fn normalize_student_id(student_id: Option<String>) -> Option<String> {
    student_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl User {
    /// Users with active checkouts cannot be removed
    pub fn ensure_deletable(&self, active_checkouts: i64) -> AppResult<()> {
        if active_checkouts > 0 {
            return Err(AppError::InvalidState(format!(
                "User {} has {} active checkout(s)",
                self.id, active_checkouts
            )));
        }
        Ok(())
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn for_user(user: &User, lifetime_hours: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user.id.to_string(),
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            exp: now + (lifetime_hours as i64 * 3600),
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> AppResult<()> {
        require_role(self.role, Role::Admin)
    }

    /// Per-user views are open to that user and to admins
    pub fn require_self_or_admin(&self, user_id: i32) -> AppResult<()> {
        if self.user_id == user_id {
            return Ok(());
        }
        require_role(self.role, Role::Admin)
    }
}
