//! Filesystem views used by the environment: directory navigation and the
//! paginated file editor.

pub mod directory;
pub mod editor;

pub use directory::{DirectoryEntry, DirectoryView, change_directory, join_path};
pub use editor::{DEFAULT_PAGE_SIZE, FileSession};
