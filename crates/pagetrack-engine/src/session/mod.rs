mod context;
mod store;

pub use context::{SessionBuilder, SessionContext, SessionError};
pub use store::{CURRENT_PAGE_KEY, FileSessionStore, MemorySessionStore, SessionStore};
