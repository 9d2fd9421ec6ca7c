use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Request body for POST /auth/signup.
#[derive(Deserialize, Debug, Validate)]
pub struct RegisterPayload {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(custom = "validate_password")]
    pub password: SecretString,
}

/// Request body for POST /auth/login.
#[derive(Deserialize, Debug)]
pub struct LoginPayload {
    pub email: String,
    pub password: SecretString,
}

/// Response body for signup/login: the bearer token plus the user identity.
#[derive(Serialize, Debug, Clone)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub token_type: String,
}

impl AuthResponse {
    pub fn bearer(user_id: Uuid, email: String, access_token: String) -> Self {
        Self {
            user_id,
            email,
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

fn validate_password(password: &SecretString) -> Result<(), ValidationError> {
    if password.expose_secret().len() < 8 {
        return Err(ValidationError::new("password_too_short"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_payload_rejects_short_password() {
        let payload = RegisterPayload {
            email: "valid@example.com".to_string(),
            password: SecretString::new("short".to_string()),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_register_payload_rejects_bad_email() {
        let payload = RegisterPayload {
            email: "not-an-email".to_string(),
            password: SecretString::new("long enough password".to_string()),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_register_payload_accepts_valid_input() {
        let payload = RegisterPayload {
            email: "valid@example.com".to_string(),
            password: SecretString::new("long enough password".to_string()),
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_auth_response_bearer() {
        let response = AuthResponse::bearer(
            Uuid::new_v4(),
            "user@example.com".to_string(),
            "token".to_string(),
        );
        assert_eq!(response.token_type, "bearer");
    }
}
