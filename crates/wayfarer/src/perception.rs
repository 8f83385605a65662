//! Messages crossing the boundary between the agent and its environment.
//!
//! A [`Perception`] flows in (wire format, camelCase JSON) and is decoded
//! once into [`Perceived`]. A [`Dispatch`] flows out.

use serde::{Deserialize, Serialize};

use crate::fs::DirectoryEntry;
use crate::tools::{EditArgs, TicketArgs, names};

/// Perception action names produced by the environment.
pub mod actions {
    pub const LISTED: &str = "listed";
    pub const FAILED_TO_LIST: &str = "failed to list";
    pub const READ_FILE: &str = "readFile";
    pub const PAGE: &str = "page";
    pub const EDITED: &str = "edited";
    pub const FAILED_TO_EDIT: &str = "failed to edit";
    pub const TICKET_FILED: &str = "ticket filed";
    pub const FAILED_TO_FILE_TICKET: &str = "failed to file ticket";
    pub const CLOSED: &str = "closed";
}

/// An event delivered by the environment.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Perception {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "_metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PerceptionMetadata>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerceptionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<DirectoryEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_chunk: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub missing_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The file a perception refers to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileRef {
    pub cwd: String,
    pub file_name: String,
}

impl FileRef {
    /// `<cwd>/<file_name>`, the takeaway key of the file.
    pub fn path(&self) -> String {
        crate::fs::join_path(&self.cwd, &self.file_name)
    }
}

/// A perception decoded into what it means to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Perceived {
    /// The file the agent expected to be reading is gone.
    FileMissing,
    ListingReceived {
        cwd: String,
        list: Vec<DirectoryEntry>,
    },
    /// A file was just opened; `content` holds its first chunk.
    FileOpened {
        file: FileRef,
        content: String,
        screen: String,
    },
    EditResult {
        ok: bool,
        file: FileRef,
        screen: Option<String>,
        error: Option<String>,
    },
    /// Anything else carrying an editor screen (paging, idle refresh).
    ScreenUpdated { file: FileRef, screen: String },
    Other,
}

impl Perception {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_metadata(mut self, metadata: PerceptionMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn listed(cwd: impl Into<String>, list: Vec<DirectoryEntry>) -> Self {
        let cwd = cwd.into();
        let content = list
            .iter()
            .map(DirectoryEntry::label)
            .collect::<Vec<_>>()
            .join("\n");
        Perception::new(actions::LISTED)
            .with_content(content)
            .with_metadata(PerceptionMetadata {
                list: Some(list),
                cwd: Some(cwd),
                ..Default::default()
            })
    }

    pub fn file_missing(cwd: impl Into<String>, file_name: impl Into<String>) -> Self {
        Perception::new(actions::READ_FILE).with_metadata(PerceptionMetadata {
            missing_file: true,
            cwd: Some(cwd.into()),
            file_name: Some(file_name.into()),
            ..Default::default()
        })
    }

    /// Metadata, or an empty default.
    pub fn metadata(&self) -> PerceptionMetadata {
        self.metadata.clone().unwrap_or_default()
    }

    /// Text appended to working memory when the perception arrives.
    pub fn to_memory_text(&self) -> String {
        match self.content.as_deref() {
            Some(content) if !content.is_empty() => format!("{}: {content}", self.action),
            _ => self.action.clone(),
        }
    }

    /// Decode into [`Perceived`]. `missingFile` wins over everything else.
    pub fn decode(&self) -> Perceived {
        let meta = self.metadata();
        if meta.missing_file {
            return Perceived::FileMissing;
        }
        if let Some(list) = meta.list {
            return Perceived::ListingReceived {
                cwd: meta.cwd.unwrap_or_default(),
                list,
            };
        }

        let file = FileRef {
            cwd: meta.cwd.unwrap_or_default(),
            file_name: meta.file_name.unwrap_or_default(),
        };
        match self.action.as_str() {
            actions::READ_FILE => Perceived::FileOpened {
                file,
                content: meta
                    .large_chunk
                    .or_else(|| self.content.clone())
                    .unwrap_or_default(),
                screen: meta.screen.unwrap_or_default(),
            },
            actions::EDITED | actions::FAILED_TO_EDIT => Perceived::EditResult {
                ok: self.action == actions::EDITED,
                file,
                screen: meta.screen,
                error: meta.error,
            },
            _ => match meta.screen {
                Some(screen) => Perceived::ScreenUpdated { file, screen },
                None => Perceived::Other,
            },
        }
    }
}

// ── Dispatch ───────────────────────────────────────────────────────

/// Actions the agent asks the environment to perform.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Ls,
    Cd,
    OpenInEditor,
    FileATicket,
    PageUp,
    PageDown,
    Stop,
    Edit,
    Exit,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Ls => names::LS,
            Action::Cd => names::CD,
            Action::OpenInEditor => names::OPEN_IN_EDITOR,
            Action::FileATicket => names::FILE_A_TICKET,
            Action::PageUp => names::PAGE_UP,
            Action::PageDown => names::PAGE_DOWN,
            Action::Stop => names::STOP,
            Action::Edit => names::EDIT,
            Action::Exit => names::EXIT,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request sent to the environment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Dispatch {
    pub action: Action,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// Parameters of an `edit` dispatch.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EditParams {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
}

impl Dispatch {
    fn simple(action: Action) -> Self {
        Self {
            action,
            content: String::new(),
            params: None,
        }
    }

    pub fn ls() -> Self {
        Self::simple(Action::Ls)
    }

    pub fn cd(directory: impl Into<String>) -> Self {
        Self {
            content: directory.into(),
            ..Self::simple(Action::Cd)
        }
    }

    pub fn open_in_editor(file: impl Into<String>) -> Self {
        Self {
            content: file.into(),
            ..Self::simple(Action::OpenInEditor)
        }
    }

    pub fn ticket(ticket: &TicketArgs) -> Self {
        Self {
            content: ticket.subject.clone(),
            params: serde_json::to_value(ticket).ok(),
            ..Self::simple(Action::FileATicket)
        }
    }

    pub fn page_up() -> Self {
        Self::simple(Action::PageUp)
    }

    pub fn page_down() -> Self {
        Self::simple(Action::PageDown)
    }

    pub fn stop() -> Self {
        Self::simple(Action::Stop)
    }

    pub fn exit() -> Self {
        Self::simple(Action::Exit)
    }

    pub fn edit(params: &EditParams) -> Self {
        Self {
            content: params.replacement.clone(),
            params: serde_json::to_value(params).ok(),
            ..Self::simple(Action::Edit)
        }
    }

    /// Decode `params` into a typed struct.
    pub fn params_as<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.params
            .clone()
            .and_then(|p| serde_json::from_value(p).ok())
    }
}

impl EditParams {
    pub fn new(request: &EditArgs, replacement: impl Into<String>) -> Self {
        Self {
            start: request.start,
            end: request.end,
            replacement: replacement.into(),
            commentary: request.commentary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_wire_listing() {
        let p: Perception = serde_json::from_value(json!({
            "action": "listed",
            "_metadata": {
                "cwd": "src",
                "list": [{"name": "main.rs", "isDirectory": false},
                         {"name": "..", "isDirectory": true}]
            }
        }))
        .unwrap();
        match p.decode() {
            Perceived::ListingReceived { cwd, list } => {
                assert_eq!(cwd, "src");
                assert_eq!(list.len(), 2);
                assert!(list[1].is_directory);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_file_wins() {
        let p: Perception = serde_json::from_value(json!({
            "action": "readFile",
            "_metadata": {"missingFile": true, "screen": "0 : x", "cwd": ".", "fileName": "a"}
        }))
        .unwrap();
        assert_eq!(p.decode(), Perceived::FileMissing);
        assert_eq!(Perception::file_missing(".", "gone.rs").decode(), Perceived::FileMissing);
    }

    #[test]
    fn decodes_file_and_edit_results() {
        let meta = PerceptionMetadata {
            cwd: Some(".".into()),
            file_name: Some("notes.txt".into()),
            screen: Some("0 : hello".into()),
            large_chunk: Some("hello".into()),
            ..Default::default()
        };
        let opened = Perception::new("readFile").with_metadata(meta.clone()).decode();
        assert!(matches!(opened, Perceived::FileOpened { ref content, .. } if content == "hello"));

        let failed = Perception::new("failed to edit")
            .with_metadata(PerceptionMetadata {
                error: Some("disk full".into()),
                ..meta.clone()
            })
            .decode();
        assert!(matches!(failed, Perceived::EditResult { ok: false, error: Some(_), .. }));

        let paged = Perception::new("page").with_metadata(meta).decode();
        match paged {
            Perceived::ScreenUpdated { file, screen } => {
                assert_eq!(file.path(), "./notes.txt");
                assert_eq!(screen, "0 : hello");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(Perception::new("closed").decode(), Perceived::Other);
    }

    #[test]
    fn metadata_serializes_camel_case() {
        let p = Perception::file_missing("src", "lib.rs");
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["_metadata"]["missingFile"], true);
        assert_eq!(v["_metadata"]["fileName"], "lib.rs");
        assert!(v["_metadata"].get("list").is_none());
    }

    #[test]
    fn dispatch_wire_format() {
        let params = EditParams {
            start: 1,
            end: 3,
            replacement: "x".into(),
            commentary: Some("tidy".into()),
        };
        let d = Dispatch::edit(&params);
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["action"], "edit");
        assert_eq!(v["params"]["start"], 1);
        assert_eq!(d.params_as::<EditParams>(), Some(params));

        let v = serde_json::to_value(Dispatch::open_in_editor("a.rs")).unwrap();
        assert_eq!(v["action"], "openInEditor");
        assert!(v.get("params").is_none());
        assert_eq!(Action::FileATicket.to_string(), "fileATicket");
    }
}
