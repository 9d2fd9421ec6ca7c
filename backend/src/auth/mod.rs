// This file defines the auth module: password hashing, credential
// verification, user creation, and JWT handling (jwt submodule).

pub mod jwt;

use crate::models::users::{NewUser, User};
use crate::schema::users;
use crate::state::DbPool;
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper};
use deadpool_diesel::InteractError;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Wrong credentials")]
    WrongCredentials,
    #[error("Email already taken")]
    EmailTaken,
    #[error("Password hashing failed")]
    HashingError,
    #[error("User not found")]
    UserNotFound,
    #[error("Database error during authentication: {0}")]
    DatabaseError(String),
    #[error("Database pool error: {0}")]
    PoolError(#[from] deadpool_diesel::PoolError),
    #[error("Database interaction error: {0}")]
    InteractError(String),
}

// Manual From implementation for InteractError
impl From<InteractError> for AuthError {
    fn from(err: InteractError) -> Self {
        Self::InteractError(err.to_string())
    }
}

// From implementation for diesel::result::Error
impl From<diesel::result::Error> for AuthError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::UserNotFound,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            ) => {
                if info.constraint_name() == Some("users_email_key") {
                    Self::EmailTaken
                } else {
                    Self::DatabaseError(format!(
                        "Unique constraint violation: {:?}",
                        info.message()
                    ))
                }
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

/// Hashes a password with bcrypt on a blocking thread.
///
/// # Errors
///
/// Returns `AuthError::HashingError` if the bcrypt hashing operation fails.
pub async fn hash_password(password: SecretString) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        bcrypt::hash(password.expose_secret(), bcrypt::DEFAULT_COST).map_err(|e| {
            error!(error = %e, "bcrypt hashing failed");
            AuthError::HashingError
        })
    })
    .await
    .map_err(|e| {
        error!(error = %e, "hash_password blocking task failed");
        AuthError::HashingError
    })?
}

/// Creates a new user, hashing the password first. A unique violation on the
/// email column surfaces as `AuthError::EmailTaken`.
#[instrument(skip(pool, password), err)]
pub async fn create_user(
    pool: &DbPool,
    email: String,
    password: SecretString,
) -> Result<User, AuthError> {
    let password_hash = hash_password(password).await?;

    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let new_user = NewUser {
            email,
            password_hash,
        };
        diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_select())
            .get_result::<User>(conn)
            .map_err(AuthError::from)
    })
    .await?
}

/// Verifies the supplied credentials against the stored bcrypt hash.
///
/// A missing user and a wrong password both surface as `WrongCredentials` so
/// the response does not reveal which part failed.
#[instrument(skip(pool, password), err)]
pub async fn verify_credentials(
    pool: &DbPool,
    email: String,
    password: SecretString,
) -> Result<User, AuthError> {
    let conn = pool.get().await?;
    let user = conn
        .interact(move |conn| {
            users::table
                .filter(users::email.eq(email))
                .select(User::as_select())
                .first::<User>(conn)
                .map_err(AuthError::from)
        })
        .await?
        .map_err(|e| match e {
            AuthError::UserNotFound => {
                warn!("Login attempt for unknown email");
                AuthError::WrongCredentials
            }
            other => other,
        })?;

    debug!(user_id = %user.id, "Verifying password hash");
    let is_valid = bcrypt::verify(password.expose_secret(), &user.password_hash).map_err(|e| {
        error!(error = %e, "bcrypt verification failed");
        AuthError::HashingError
    })?;

    if !is_valid {
        warn!(user_id = %user.id, "Password mismatch");
        return Err(AuthError::WrongCredentials);
    }

    Ok(user)
}
