//! Sessions: storage collaborator contracts, the object cache and the
//! session that ties them to a catalog.

mod cache;
mod session;
mod storage;

pub use cache::{CacheStats, SessionCache};
pub use session::Session;
pub(crate) use storage::ScopedCursor;
pub use storage::{Cursor, ModelFactory, RecordFactory, StorageSession};
