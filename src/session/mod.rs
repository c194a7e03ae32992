mod context;
mod model;
mod store;

pub use context::SessionContext;
pub use model::{Session, SessionUser};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
