mod claims;
pub mod dto;
pub mod gate;
mod services;

pub use claims::TokenClaims;
pub use gate::{check_route, evaluate, GateDecision};
pub use services::AuthService;
pub(crate) use services::is_valid_email;
