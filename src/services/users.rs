//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        pagination::PageRequest,
        user::{
            normalize_student_id, ChangePassword, CreateUser, NewUser, Role, UpdateUser, User,
            UserClaims, UserFilter,
        },
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by email and return a JWT token with the user
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self.validate_credentials(email, password).await?;
        let token = self.create_token(&user)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((token, user))
    }

    /// Look up by email and verify the password; any mismatch is `InvalidCredential`
    pub async fn validate_credentials(&self, email: &str, password: &str) -> AppResult<User> {
        let Some(user) = self.repository.users.get_by_email(email.trim()).await? else {
            tracing::warn!("Login attempt for unknown email");
            return Err(AppError::InvalidCredential);
        };

        if !verify_password(&user.password, password)? {
            tracing::warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(AppError::InvalidCredential);
        }

        Ok(user)
    }

    /// Public self-registration; the role is always `user`
    pub async fn register(&self, mut user: CreateUser) -> AppResult<(String, User)> {
        user.role = Some(Role::User);
        let user = self.create_user(user).await?;
        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    /// Create JWT token for a user
    pub fn create_token(&self, user: &User) -> AppResult<String> {
        UserClaims::for_user(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users
    pub async fn search_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(filter, page).await
    }

    /// Create a new user
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        user.validate()?;

        let email = user.email.trim().to_string();
        if self.repository.users.email_exists(&email, None).await? {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let student_id = normalize_student_id(user.student_id);
        if let Some(ref sid) = student_id {
            if self.repository.users.student_id_exists(sid, None).await? {
                return Err(AppError::Conflict("Student ID already in use".to_string()));
            }
        }

        let new_user = NewUser {
            name: user.name.trim().to_string(),
            email,
            password_hash: hash_password(&user.password)?,
            student_id,
            role: user.role.unwrap_or_default(),
        };

        let created = self.repository.users.create(&new_user).await?;
        tracing::info!(user_id = created.id, role = %created.role, "User created");
        Ok(created)
    }

    /// Update an existing user
    pub async fn update_user(&self, id: i32, update: UpdateUser) -> AppResult<User> {
        update.validate()?;

        let mut user = self.repository.users.get_by_id(id).await?;

        if let Some(email) = update.email {
            let email = email.trim().to_string();
            if !email.eq_ignore_ascii_case(&user.email)
                && self.repository.users.email_exists(&email, Some(id)).await?
            {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
            user.email = email;
        }

        if update.student_id.is_some() {
            let student_id = normalize_student_id(update.student_id);
            if let Some(ref sid) = student_id {
                if user.student_id.as_ref() != Some(sid)
                    && self.repository.users.student_id_exists(sid, Some(id)).await?
                {
                    return Err(AppError::Conflict("Student ID already in use".to_string()));
                }
            }
            user.student_id = student_id;
        }

        if let Some(name) = update.name {
            user.name = name.trim().to_string();
        }
        if let Some(password) = update.password {
            user.password = hash_password(&password)?;
        }
        if let Some(role) = update.role {
            user.role = role;
        }

        self.repository.users.update(&user).await
    }

    /// Update a user's role (admin only)
    pub async fn update_role(&self, id: i32, role: Role) -> AppResult<User> {
        let user = self.repository.users.update_role(id, role).await?;
        tracing::info!(user_id = id, role = %role, "User role changed");
        Ok(user)
    }

    /// Change the caller's own password after verifying the current one
    pub async fn change_password(&self, user_id: i32, request: ChangePassword) -> AppResult<()> {
        request.validate()?;

        let user = self.repository.users.get_by_id(user_id).await?;
        if !verify_password(&user.password, &request.current_password)? {
            return Err(AppError::InvalidCredential);
        }

        let hash = hash_password(&request.new_password)?;
        self.repository.users.update_password(user_id, &hash).await
    }

    /// Soft delete a user without active checkouts
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.repository
            .users
            .soft_delete(id)
            .await
            .inspect_err(|e| tracing::warn!(user_id = id, "User deletion refused: {}", e))?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
