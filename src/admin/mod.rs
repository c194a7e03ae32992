mod users;

pub use users::{AdminUser, AdminUserService};
