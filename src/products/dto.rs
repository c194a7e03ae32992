use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock_quantity: Option<i32>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub owner_username: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub supplier_username: Option<String>,
}

/// Fields accepted by create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i32>,
}

impl ProductInput {
    /// Builds input from raw form strings, coercing the numeric fields.
    pub fn from_form(
        name: &str,
        description: &str,
        price: &str,
        stock_quantity: &str,
    ) -> Result<Self, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Name is required".into()));
        }
        let price: f64 = price
            .trim()
            .parse()
            .map_err(|_| {
                ApiError::Validation(format!("Price must be a number, got '{}'", price.trim()))
            })?;
        let stock_quantity = match stock_quantity.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i32>().map_err(|_| {
                    ApiError::Validation(format!("Stock quantity must be a whole number, got '{raw}'"))
                })?,
            ),
        };
        let description = Some(description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Self {
            name: name.to_string(),
            description,
            price,
            stock_quantity,
        })
    }
}

/// An image attached to a multipart create/update.
#[derive(Debug, Clone)]
pub struct ProductImage {
    pub file_name: String,
    pub content_type: String,
    pub body: bytes::Bytes,
}

/// One page of a Spring-style paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            number: 0,
            size: 20,
            total_elements: 0,
            total_pages: 0,
            first: true,
            last: true,
        }
    }
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.number > 0
    }

    /// An empty listing still counts as one page.
    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: None,
        }
    }

    pub fn sorted(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, 20)
    }
}
