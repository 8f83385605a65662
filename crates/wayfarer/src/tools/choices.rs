//! Typed tool choices for each state.
//!
//! Every state has a closed set of tools. The registry built by
//! [`ToolChoice::registry`] is what the chooser sees; the enum is what the
//! state matches on after validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::tools::names;
use crate::tools::registry::{ToolChoice, ToolRegistry, decode_args};
use crate::tools::spec::ToolSpec;

// ── Arguments ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CdArgs {
    /// The directory to change to.
    pub directory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OpenInEditorArgs {
    /// The file to read or edit.
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TicketArgs {
    /// The one line description of the ticket.
    pub subject: String,
    /// The content of the ticket: what should be done.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EditArgs {
    /// Starting line number.
    pub start: usize,
    /// Ending line number (exclusive).
    pub end: usize,
    /// Why the edit is wanted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReplacementArgs {
    /// The text that replaces the selected lines.
    pub replacement: String,
}

fn ticket_spec() -> ToolSpec {
    ToolSpec::new(
        names::FILE_A_TICKET,
        "File a ticket (feature request, bug report, etc) with the agent's creator",
    )
    .when_to_use("The change is too broad, or editing the code directly feels wrong")
    .parameters_for::<TicketArgs>()
}

// ── Explore ────────────────────────────────────────────────────────

/// Tools available while exploring the directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreTool {
    Cd(CdArgs),
    Ls,
    OpenInEditor(OpenInEditorArgs),
    FileATicket(TicketArgs),
    Stop,
}

impl ToolChoice for ExploreTool {
    fn registry() -> ToolRegistry {
        ToolRegistry::new("explore")
            .with(
                ToolSpec::new(
                    names::CD,
                    "Change directory to a directory in the current working directory",
                )
                .when_not_to_use("To look at a file; open it in the editor instead")
                .parameters_for::<CdArgs>(),
            )
            .with(ToolSpec::new(
                names::LS,
                "List the files in the current directory",
            ))
            .with(
                ToolSpec::new(
                    names::OPEN_IN_EDITOR,
                    "Open a file in the current directory in a text editor",
                )
                .parameters_for::<OpenInEditorArgs>(),
            )
            .with(ticket_spec())
            .with(
                ToolSpec::new(
                    names::STOP,
                    "Stop exploring the file system and chat with the creator",
                )
                .when_to_use("After gaining a good understanding of the codebase"),
            )
    }

    fn decode(name: &str, arguments: serde_json::Value) -> Result<Self, ToolError> {
        match name {
            names::CD => Ok(ExploreTool::Cd(decode_args(name, arguments)?)),
            names::LS => Ok(ExploreTool::Ls),
            names::OPEN_IN_EDITOR => Ok(ExploreTool::OpenInEditor(decode_args(name, arguments)?)),
            names::FILE_A_TICKET => Ok(ExploreTool::FileATicket(decode_args(name, arguments)?)),
            names::STOP => Ok(ExploreTool::Stop),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ExploreTool::Cd(_) => names::CD,
            ExploreTool::Ls => names::LS,
            ExploreTool::OpenInEditor(_) => names::OPEN_IN_EDITOR,
            ExploreTool::FileATicket(_) => names::FILE_A_TICKET,
            ExploreTool::Stop => names::STOP,
        }
    }
}

// ── ReadFile ───────────────────────────────────────────────────────

/// Tools available while a file is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFileTool {
    Edit(EditArgs),
    PageUp,
    PageDown,
    Exit,
    FileATicket(TicketArgs),
}

impl ToolChoice for ReadFileTool {
    fn registry() -> ToolRegistry {
        ToolRegistry::new("read_file")
            .with(
                ToolSpec::new(names::EDIT, "Edit a range of lines in the open file")
                    .when_to_use(
                        "Give the start and end line numbers of the section to replace, \
                         and any commentary on why",
                    )
                    .parameters_for::<EditArgs>(),
            )
            .with(ToolSpec::new(names::PAGE_UP, "Page up in the current file"))
            .with(ToolSpec::new(names::PAGE_DOWN, "Page down in the current file"))
            .with(ToolSpec::new(names::EXIT, "Exit reading the current file"))
            .with(ticket_spec())
    }

    fn decode(name: &str, arguments: serde_json::Value) -> Result<Self, ToolError> {
        match name {
            names::EDIT => Ok(ReadFileTool::Edit(decode_args(name, arguments)?)),
            names::PAGE_UP => Ok(ReadFileTool::PageUp),
            names::PAGE_DOWN => Ok(ReadFileTool::PageDown),
            names::EXIT => Ok(ReadFileTool::Exit),
            names::FILE_A_TICKET => Ok(ReadFileTool::FileATicket(decode_args(name, arguments)?)),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ReadFileTool::Edit(_) => names::EDIT,
            ReadFileTool::PageUp => names::PAGE_UP,
            ReadFileTool::PageDown => names::PAGE_DOWN,
            ReadFileTool::Exit => names::EXIT,
            ReadFileTool::FileATicket(_) => names::FILE_A_TICKET,
        }
    }
}

// ── EditFile ───────────────────────────────────────────────────────

/// Tools available while composing an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditFileTool {
    Edit(ReplacementArgs),
    Cancel,
}

impl ToolChoice for EditFileTool {
    fn registry() -> ToolRegistry {
        ToolRegistry::new("edit_file")
            .with(
                ToolSpec::new(
                    names::EDIT,
                    "Replace the selected lines with new text and save the file",
                )
                .parameters_for::<ReplacementArgs>(),
            )
            .with(
                ToolSpec::new(names::CANCEL, "Abandon the edit and return to reading")
                    .when_to_use("The planned change no longer looks right"),
            )
    }

    fn decode(name: &str, arguments: serde_json::Value) -> Result<Self, ToolError> {
        match name {
            names::EDIT => Ok(EditFileTool::Edit(decode_args(name, arguments)?)),
            names::CANCEL => Ok(EditFileTool::Cancel),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            EditFileTool::Edit(_) => names::EDIT,
            EditFileTool::Cancel => names::CANCEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explore_registry_is_closed() {
        let registry = ExploreTool::registry();
        assert_eq!(
            registry.names(),
            vec!["cd", "ls", "openInEditor", "fileATicket", "stop"]
        );
        assert!(matches!(
            registry.resolve::<ExploreTool>("edit", json!({})),
            Err(ToolError::UnknownTool(_))
        ));
    }

    #[test]
    fn explore_decodes_arguments() {
        let registry = ExploreTool::registry();
        let choice: ExploreTool = registry.resolve("cd", json!({"directory": "src"})).unwrap();
        assert_eq!(
            choice,
            ExploreTool::Cd(CdArgs {
                directory: "src".into()
            })
        );
        let choice: ExploreTool = registry.resolve("stop", serde_json::Value::Null).unwrap();
        assert_eq!(choice, ExploreTool::Stop);
    }

    #[test]
    fn ticket_requires_subject_and_content() {
        let registry = ExploreTool::registry();
        let err = registry
            .resolve::<ExploreTool>("fileATicket", json!({"subject": "only"}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn read_file_edit_commentary_is_optional() {
        let registry = ReadFileTool::registry();
        let choice: ReadFileTool = registry
            .resolve("edit", json!({"start": 3, "end": 5}))
            .unwrap();
        assert_eq!(
            choice,
            ReadFileTool::Edit(EditArgs {
                start: 3,
                end: 5,
                commentary: None
            })
        );
    }

    #[test]
    fn read_file_edit_rejects_negative_lines() {
        let registry = ReadFileTool::registry();
        assert!(
            registry
                .resolve::<ReadFileTool>("edit", json!({"start": -1, "end": 5}))
                .is_err()
        );
    }

    #[test]
    fn edit_file_registry() {
        let registry = EditFileTool::registry();
        assert_eq!(registry.names(), vec!["edit", "cancel"]);
        let choice: EditFileTool = registry
            .resolve("edit", json!({"replacement": "a\nb"}))
            .unwrap();
        assert_eq!(choice.name(), "edit");
        assert!(registry.resolve::<EditFileTool>("edit", json!({})).is_err());
    }
}
