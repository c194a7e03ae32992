use serde::{Deserialize, Serialize};

use crate::session::SessionUser;

/// Request body for user registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for admin registration; the backend checks `admin_secret`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub admin_secret: String,
}

/// Request body for user login. `identifier` is a username or an email.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Request body for admin login.
#[derive(Debug, Clone, Serialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// Response returned after login or register.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: SessionUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_register_uses_camel_case() {
        let req = AdminRegisterRequest {
            username: "root".into(),
            email: "root@x.io".into(),
            password: "secret123".into(),
            admin_secret: "s3".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["adminSecret"], "s3");
    }

    #[test]
    fn auth_response_reads_access_token() {
        let json = r#"{"accessToken":"abc","user":{"id":1,"username":"u","role":"USER"}}"#;
        let resp: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "abc");
        assert_eq!(resp.user.role.as_deref(), Some("USER"));
    }
}
