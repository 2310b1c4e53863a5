//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{like_pattern, UsersRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::PageRequest,
        user::{NewUser, Role, User, UserFilter},
    },
};

const DUPLICATE_USER: &str = "Email or student ID already in use";

#[derive(Clone)]
pub struct PgUsersRepository {
    pool: Pool<Postgres>,
}

impl PgUsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("User with id {} not found", id))
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE LOWER(email) = LOWER($1)
                  AND deleted_at IS NULL
                  AND ($2::int IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn student_id_exists(&self, student_id: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE student_id = $1
                  AND deleted_at IS NULL
                  AND ($2::int IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(student_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, student_id, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.student_id)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::on_unique_violation(e, DUPLICATE_USER))
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3, password = $4, student_id = $5, role = $6,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.student_id)
        .bind(user.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::on_unique_violation(e, DUPLICATE_USER))?
        .ok_or_else(|| not_found(user.id))
    }

    async fn update_role(&self, id: i32, role: Role) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET role = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found(id))?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkouts WHERE user_id = $1 AND status = 'borrowed'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        user.ensure_deletable(active)?;

        sqlx::query("UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn search(&self, filter: &UserFilter, page: PageRequest) -> AppResult<(Vec<User>, i64)> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE deleted_at IS NULL
              AND ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1 OR student_id ILIKE $1)
              AND ($2::text IS NULL OR role = $2)
            "#,
        )
        .bind(&pattern)
        .bind(filter.role)
        .fetch_one(&self.pool)
        .await?;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE deleted_at IS NULL
              AND ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1 OR student_id ILIKE $1)
              AND ($2::text IS NULL OR role = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&pattern)
        .bind(filter.role)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }
}
