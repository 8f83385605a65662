//! Error types for the agent core.
//!
//! Filesystem errors raised while executing a dispatched action never reach
//! the orchestrator directly: the environment turns them into perceptions.
//! Only reasoning, tool-argument and store failures abort a transition.

use thiserror::Error;

/// Errors from the Directory View and the File Editor.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("directory not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        FsError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error means the target vanished from the tree.
    pub fn is_missing(&self) -> bool {
        matches!(self, FsError::NotFound(_) | FsError::FileNotFound(_))
    }
}

/// Errors resolving a tool choice against a state's registry.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for tool '{tool}':\n{details}")]
    InvalidArguments { tool: String, details: String },
}

/// Errors from the reasoning collaborators.
#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM returned an empty response for {0}")]
    EmptyResponse(&'static str),

    #[error("spoken stream failed: {0}")]
    Stream(String),
}

/// Errors from the takeaway store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A failed state transition. The runner keeps its previous memory and
/// state when one of these is returned.
#[derive(Error, Debug)]
pub enum TransitionError {
    #[error(transparent)]
    Reasoning(#[from] ReasoningError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
