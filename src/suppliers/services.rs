use serde::Serialize;
use tracing::{info, instrument};

use super::dto::{
    ApplicationStatus, Decision, ReviewRequest, SupplierApplication, SupplierApplicationRequest,
    SupplierDashboard,
};
use crate::auth::is_valid_email;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::products::Page;

#[derive(Serialize)]
struct ApplicationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<ApplicationStatus>,
    page: u32,
    size: u32,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Supplier onboarding: the applicant side and the admin review side.
#[derive(Clone)]
pub struct SupplierService {
    api: ApiClient,
}

impl SupplierService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn dashboard(&self) -> Result<SupplierDashboard, ApiError> {
        self.api.get_json("/api/suppliers/dashboard").await
    }

    #[instrument(skip(self, req), fields(business = %req.business_name))]
    pub async fn apply(
        &self,
        mut req: SupplierApplicationRequest,
    ) -> Result<SupplierApplication, ApiError> {
        req.business_name = req.business_name.trim().to_string();
        req.business_email = req.business_email.trim().to_string();
        if req.business_name.is_empty() {
            return Err(ApiError::Validation("Business name is required".into()));
        }
        if !is_valid_email(&req.business_email) {
            return Err(ApiError::Validation("A valid business email is required".into()));
        }
        req.business_phone = non_blank(req.business_phone);
        req.website = non_blank(req.website);
        req.message = non_blank(req.message);

        let created: SupplierApplication =
            self.api.post_json("/api/suppliers/applications", &req).await?;
        info!(application_id = created.id, "supplier application submitted");
        Ok(created)
    }

    pub async fn my_applications(&self) -> Result<Vec<SupplierApplication>, ApiError> {
        self.api.get_json("/api/suppliers/applications/me").await
    }

    pub async fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
        page: u32,
        size: u32,
    ) -> Result<Page<SupplierApplication>, ApiError> {
        let query = ApplicationQuery { status, page, size };
        self.api
            .get_json_with("/api/admin/suppliers/applications", &query)
            .await
    }

    #[instrument(skip(self, admin_note))]
    pub async fn review(
        &self,
        id: i64,
        decision: Decision,
        admin_note: Option<String>,
    ) -> Result<SupplierApplication, ApiError> {
        let body = ReviewRequest {
            decision,
            admin_note: non_blank(admin_note),
        };
        let reviewed: SupplierApplication = self
            .api
            .patch_json(&format!("/api/admin/suppliers/applications/{id}"), &body)
            .await?;
        info!(application_id = id, status = %reviewed.status, "application reviewed");
        Ok(reviewed)
    }
}
