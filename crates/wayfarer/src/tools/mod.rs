//! Tools: the closed, per-state sets of actions the agent can choose from.
//!
//! - [`names`]: canonical tool/action name constants.
//! - [`spec`]: [`ToolSpec`], a tool's description and argument schema.
//! - [`registry`]: [`ToolRegistry`] and the [`ToolChoice`] trait that
//!   validates and decodes raw choices.
//! - [`choices`]: the typed enums for Explore, ReadFile and EditFile.

pub mod choices;
pub mod names;
pub mod registry;
pub mod spec;

pub use choices::{
    CdArgs, EditArgs, EditFileTool, ExploreTool, OpenInEditorArgs, ReadFileTool, ReplacementArgs,
    TicketArgs,
};
pub use registry::{ToolChoice, ToolRegistry};
pub use spec::ToolSpec;
