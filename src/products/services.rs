use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use super::dto::{Page, PageRequest, Product, ProductImage, ProductInput};
use crate::error::ApiError;
use crate::http::ApiClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SellerParam<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    seller_identifier: Option<&'a str>,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    page: u32,
    size: u32,
}

/// Product catalog calls.
#[derive(Clone)]
pub struct ProductService {
    api: ApiClient,
}

impl ProductService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: &PageRequest) -> Result<Page<Product>, ApiError> {
        self.api.get_json_with("/api/products", page).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Product, ApiError> {
        self.api.get_json(&format!("/api/products/{id}")).await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &ProductInput) -> Result<Product, ApiError> {
        let created: Product = self.api.post_json("/api/products", input).await?;
        info!(product_id = created.id, "product created");
        Ok(created)
    }

    /// Multipart create; `seller_identifier` assigns the product to another seller.
    #[instrument(skip(self, input, image), fields(name = %input.name))]
    pub async fn create_with_image(
        &self,
        input: &ProductInput,
        image: Option<ProductImage>,
        seller_identifier: Option<&str>,
    ) -> Result<Product, ApiError> {
        let form = product_form(input, image)?;
        let params = SellerParam {
            seller_identifier: seller_identifier.map(str::trim).filter(|s| !s.is_empty()),
        };
        let created: Product = self
            .api
            .send_multipart_with(Method::POST, "/api/products", form, &params)
            .await?;
        info!(product_id = created.id, "product created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i64, input: &ProductInput) -> Result<Product, ApiError> {
        self.api.put_json(&format!("/api/products/{id}"), input).await
    }

    #[instrument(skip(self, input, image))]
    pub async fn update_with_image(
        &self,
        id: i64,
        input: &ProductInput,
        image: Option<ProductImage>,
    ) -> Result<Product, ApiError> {
        let form = product_form(input, image)?;
        self.api
            .send_multipart(Method::PUT, &format!("/api/products/{id}"), form)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/products/{id}")).await?;
        info!(product_id = id, "product deleted");
        Ok(())
    }

    /// Products the current supplier has provided to sellers.
    pub async fn supplied(&self, page: &PageRequest) -> Result<Page<Product>, ApiError> {
        self.api.get_json_with("/api/products/supplied", page).await
    }

    /// Products owned by the current user.
    pub async fn mine(&self, page: &PageRequest) -> Result<Page<Product>, ApiError> {
        self.api.get_json_with("/api/products/my", page).await
    }

    pub async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<Product>, ApiError> {
        let params = SearchParams {
            q: query,
            page: page.page,
            size: page.size,
        };
        self.api.get_json_with("/api/products/search", &params).await
    }
}

fn product_form(input: &ProductInput, image: Option<ProductImage>) -> Result<Form, ApiError> {
    let mut form = Form::new()
        .text("name", input.name.clone())
        .text("price", input.price.to_string());
    if let Some(description) = input.description.as_ref().filter(|d| !d.is_empty()) {
        form = form.text("description", description.clone());
    }
    if let Some(qty) = input.stock_quantity {
        form = form.text("stockQuantity", qty.to_string());
    }
    if let Some(img) = image {
        let part = Part::bytes(img.body.to_vec())
            .file_name(img.file_name)
            .mime_str(&img.content_type)?;
        form = form.part("image", part);
    }
    Ok(form)
}

fn mime_from_ext(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Reads an image from disk for a multipart upload.
pub async fn load_image(path: &Path) -> Result<ProductImage, ApiError> {
    let body = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::Validation(format!("cannot read {}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into());
    let content_type = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(mime_from_ext)
        .unwrap_or("application/octet-stream")
        .to_string();
    Ok(ProductImage {
        file_name,
        content_type,
        body: body.into(),
    })
}
