pub mod admin;
pub mod auth;
pub mod batch;
pub mod config;
pub mod error;
pub mod http;
pub mod products;
pub mod session;
pub mod state;
pub mod suppliers;

pub use config::ClientConfig;
pub use error::ApiError;
pub use state::AppState;
