use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::dto::{AdminLoginRequest, AdminRegisterRequest, AuthResponse, LoginRequest, RegisterRequest};
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::session::{Session, SessionUser};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Login, signup and session lifecycle for users and admins.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn start_session(&self, resp: AuthResponse) -> Result<Session, ApiError> {
        let session = Session::new(resp.access_token, resp.user);
        self.api.session().set(session.clone()).await?;
        Ok(session)
    }

    /// Registers and logs the new user in.
    #[instrument(skip(self, req), fields(username = %req.username))]
    pub async fn signup(&self, req: RegisterRequest) -> Result<Session, ApiError> {
        require(&req.username, "Username")?;
        require(&req.password, "Password")?;
        if !is_valid_email(req.email.trim()) {
            return Err(ApiError::Validation("Invalid email".into()));
        }
        let resp: AuthResponse = self.api.post_json("/api/auth/register", &req).await?;
        info!("user registered");
        self.start_session(resp).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<Session, ApiError> {
        require(identifier, "Identifier")?;
        require(password, "Password")?;
        let req = LoginRequest {
            identifier: identifier.trim().to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.api.post_json("/api/auth/login", &req).await?;
        self.start_session(resp).await
    }

    #[instrument(skip(self, req), fields(username = %req.username))]
    pub async fn admin_signup(&self, req: AdminRegisterRequest) -> Result<Session, ApiError> {
        require(&req.username, "Username")?;
        require(&req.password, "Password")?;
        require(&req.admin_secret, "Admin secret")?;
        if !is_valid_email(req.email.trim()) {
            return Err(ApiError::Validation("Invalid email".into()));
        }
        let resp: AuthResponse = self.api.post_json("/api/admin/auth/register", &req).await?;
        info!("admin registered");
        self.start_session(resp).await
    }

    #[instrument(skip(self, password))]
    pub async fn admin_login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        require(username, "Username")?;
        require(password, "Password")?;
        let req = AdminLoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.api.post_json("/api/admin/auth/login", &req).await?;
        self.start_session(resp).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.api.session().clear().await
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.api.session().user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.session().is_authenticated()
    }

    /// Re-reads the profile from `/api/auth/me` and stores it next to the
    /// existing token. Returns `None` when there is no session.
    #[instrument(skip(self))]
    pub async fn refresh_current_user(&self) -> Result<Option<SessionUser>, ApiError> {
        if !self.is_authenticated() {
            return Ok(None);
        }
        match self.api.get_json::<SessionUser>("/api/auth/me").await {
            Ok(user) => {
                self.api.session().update_user(user.clone()).await?;
                Ok(Some(user))
            }
            Err(e) => {
                if matches!(e, ApiError::Unauthorized(_)) {
                    warn!("profile refresh rejected; logging out");
                    self.logout().await?;
                }
                Err(e)
            }
        }
    }
}
