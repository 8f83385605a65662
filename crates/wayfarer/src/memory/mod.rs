//! Memory: the working history, its compactor, and the takeaway store.
//!
//! - [`working`]: [`WorkingMemory`], an immutable, role-tagged history.
//! - [`compactor`]: [`Compactor`], which bounds the history and owns the
//!   persistent conversation note.
//! - [`store`]: [`TakeawayStore`] for path-keyed takeaways, with in-memory
//!   and JSON-file implementations.

pub mod compactor;
pub mod store;
pub mod working;

pub use compactor::{Compactor, CompactorConfig};
pub use store::{InMemoryStore, JsonFileStore, TakeawayStore};
pub use working::{MemoryEntry, Role, WorkingMemory};
