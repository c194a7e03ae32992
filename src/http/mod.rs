mod client;
mod navigator;

pub use client::{ApiClient, REQUEST_ID_HEADER};
pub use navigator::{MemoryNavigator, Navigator, HOME_PATH, LOGIN_PATH};
