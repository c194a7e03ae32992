pub mod dto;
mod services;

pub use dto::{
    ApplicationStatus, Decision, ReviewRequest, SupplierAlert, SupplierApplication,
    SupplierApplicationRequest, SupplierDashboard,
};
pub use services::SupplierService;
