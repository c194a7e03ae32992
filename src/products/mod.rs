pub mod dto;
pub mod listing;
mod services;

pub use dto::{Page, PageRequest, Product, ProductImage, ProductInput};
pub use listing::ProductListing;
pub use services::{load_image, ProductService};
