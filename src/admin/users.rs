use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::http::ApiClient;

/// Account row from the admin user listing. The backend has shipped both a
/// single `role` and a `roles` list, so both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl AdminUser {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("-")
    }

    pub fn role_list(&self) -> Vec<String> {
        let mut roles = self.roles.clone();
        if let Some(role) = &self.role {
            if !roles.contains(role) {
                roles.insert(0, role.clone());
            }
        }
        roles
    }
}

#[derive(Clone)]
pub struct AdminUserService {
    api: ApiClient,
}

impl AdminUserService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<AdminUser>, ApiError> {
        self.api.get_json("/api/admin/users").await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/admin/users/{id}")).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }
}
