use tracing::warn;

use super::dto::{Page, PageRequest, Product};
use super::services::ProductService;
use crate::error::ApiError;

pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];
pub const SORT_OPTIONS: [&str; 6] = [
    "name,asc",
    "name,desc",
    "price,asc",
    "price,desc",
    "id,asc",
    "id,desc",
];

/// State behind the products table: paging controls, the last page loaded and
/// the inline error shown above the table.
pub struct ProductListing {
    service: ProductService,
    page: u32,
    size: u32,
    sort: String,
    data: Page<Product>,
    error: Option<String>,
}

impl ProductListing {
    pub fn new(service: ProductService) -> Self {
        Self {
            service,
            page: 0,
            size: 20,
            sort: SORT_OPTIONS[0].to_string(),
            data: Page::default(),
            error: None,
        }
    }

    /// Starts at a given page, size and sort without fetching anything.
    pub fn starting_at(mut self, page: u32, size: u32, sort: &str) -> Result<Self, ApiError> {
        if !PAGE_SIZES.contains(&size) {
            return Err(ApiError::Validation(format!("unsupported page size {size}")));
        }
        if !SORT_OPTIONS.contains(&sort) {
            return Err(ApiError::Validation(format!("unsupported sort '{sort}'")));
        }
        self.page = page;
        self.size = size;
        self.sort = sort.to_string();
        Ok(self)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> &str {
        &self.sort
    }

    pub fn data(&self) -> &Page<Product> {
        &self.data
    }

    pub fn items(&self) -> &[Product] {
        &self.data.content
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.data.has_next()
    }

    fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size).sorted(self.sort.clone())
    }

    /// Fetches the current page. On failure the previous page stays visible
    /// and the error is kept for display.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.error = None;
        match self.service.list(&self.request()).await {
            Ok(page) => {
                self.data = page;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.display_message("Failed to load products"));
                Err(e)
            }
        }
    }

    /// Moves to `page`. A failed fetch leaves the listing on the page still shown.
    pub async fn go_to(&mut self, page: u32) -> Result<(), ApiError> {
        let shown = self.page;
        self.page = page;
        if let Err(e) = self.load().await {
            self.page = shown;
            return Err(e);
        }
        Ok(())
    }

    pub async fn next(&mut self) -> Result<(), ApiError> {
        if !self.has_next() {
            return Ok(());
        }
        self.go_to(self.page + 1).await
    }

    pub async fn prev(&mut self) -> Result<(), ApiError> {
        if !self.has_prev() {
            return Ok(());
        }
        self.go_to(self.page - 1).await
    }

    /// Unsupported sizes are rejected; a new size restarts from the first page.
    pub async fn set_size(&mut self, size: u32) -> Result<(), ApiError> {
        if !PAGE_SIZES.contains(&size) {
            return Err(ApiError::Validation(format!("unsupported page size {size}")));
        }
        self.size = size;
        self.page = 0;
        self.load().await
    }

    pub async fn set_sort(&mut self, sort: &str) -> Result<(), ApiError> {
        if !SORT_OPTIONS.contains(&sort) {
            return Err(ApiError::Validation(format!("unsupported sort '{sort}'")));
        }
        self.sort = sort.to_string();
        self.load().await
    }

    /// Deletes then refetches; nothing is removed locally ahead of the server.
    pub async fn delete(&mut self, id: i64) -> Result<(), ApiError> {
        if let Err(e) = self.service.delete(id).await {
            warn!(product_id = id, error = %e, "delete failed");
            self.error = Some(e.display_message("Delete failed"));
            return Err(e);
        }
        self.load().await
    }
}
