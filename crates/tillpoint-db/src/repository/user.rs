//! # User Repository
//!
//! Staff accounts and credential checks. Password hashes are argon2 PHC
//! strings and never leave this module.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tillpoint_core::{Role, User};

const USER_COLUMNS: &str = "id, name, email, role, is_active, created_at";

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account with an argon2 hash of `password`.
    pub async fn create(&self, input: NewUser) -> DbResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            email: input.email.trim().to_lowercase(),
            role: input.role,
            is_active: true,
            created_at: Utc::now(),
        };
        let password_hash = hash_password(&input.password)?;

        debug!(email = %user.email, role = ?user.role, "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Returns the active user whose email and password match.
    ///
    /// Unknown email, wrong password and disabled account all come back
    /// as `Ok(None)` so callers cannot tell them apart.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> DbResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"
        ))
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        if !row.user.is_active {
            warn!(user_id = %row.user.id, "Login attempt on disabled account");
            return Ok(None);
        }

        let parsed = PasswordHash::new(&row.password_hash)
            .map_err(|e| DbError::Internal(format!("stored password hash is invalid: {e}")))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return Ok(None);
        }

        Ok(Some(row.user))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Internal(format!("password hashing failed: {e}")))
}
