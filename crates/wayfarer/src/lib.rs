//! An autonomous agent that explores a codebase.
//!
//! `wayfarer` drives an agent through a directory tree: it lists
//! directories, reads files page by page, edits line ranges, and files
//! tickets, while keeping a bounded working memory of what it has seen and
//! decided. The orchestration core is a small state machine
//! ([`Process`](process::Process)) run by an event loop
//! ([`Agent`](runner::Agent)).
//!
//! # Where to find things
//!
//! - **The states:** [`process`] (Explore, ReadFile, EditFile, and the
//!   terminal Chat handoff) and the shared think/speak/decide cycle in
//!   [`process::deliberation`].
//! - **Memory:** [`WorkingMemory`](memory::WorkingMemory), the
//!   [`Compactor`](memory::Compactor) that bounds it, and the
//!   [`TakeawayStore`](memory::TakeawayStore) for path-keyed takeaways.
//! - **Filesystem views:** [`fs::DirectoryView`] and the paginated
//!   [`fs::FileSession`].
//! - **Tools:** per-state registries with JSON Schema validation in
//!   [`tools`].
//! - **Collaborators:** the [`Reasoning`](reasoning::Reasoning) trait with
//!   an OpenRouter implementation, and the
//!   [`Environment`](environment::Environment) trait with a local
//!   filesystem implementation.
//! - **Observability:** [`events`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`runner`] | [`Agent`](runner::Agent) event loop |
//! | [`process`] | States, transitions, deliberation |
//! | [`memory`] | Working memory, compaction, takeaway stores |
//! | [`fs`] | Directory view and file editor |
//! | [`tools`] | Tool specs, registries, typed choices |
//! | [`perception`] | Perception and dispatch wire types |
//! | [`environment`] | Environment trait and local implementation |
//! | [`reasoning`] | Reasoning trait, speech channel, OpenRouter backend |
//! | [`llm`] | OpenRouter chat-completions client |
//! | [`events`] | Event handlers |
//! | [`config`] | [`AgentConfig`](config::AgentConfig) |
//! | [`error`] | Error types |

pub mod config;
pub mod environment;
pub mod error;
pub mod events;
pub mod fs;
pub mod llm;
pub mod memory;
pub mod perception;
pub mod process;
pub mod reasoning;
pub mod runner;
pub mod tools;

use schemars::JsonSchema;

pub use config::AgentConfig;
pub use error::{FsError, ReasoningError, StoreError, ToolError, TransitionError};
pub use runner::{Agent, RunOutcome, Step};

/// Generate a JSON Schema value for a type implementing
/// `schemars::JsonSchema`, in the shape the function-calling API expects.
///
/// ```
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct CdArgs {
///     directory: String,
/// }
///
/// let schema = wayfarer::json_schema_for::<CdArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"directory".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}
