//! Canonical tool name constants.
//!
//! Tool names double as dispatch action names, so every string literal for
//! either should reference these constants.

pub const CD: &str = "cd";
pub const LS: &str = "ls";
pub const OPEN_IN_EDITOR: &str = "openInEditor";
pub const FILE_A_TICKET: &str = "fileATicket";
pub const STOP: &str = "stop";
pub const EDIT: &str = "edit";
pub const PAGE_UP: &str = "pageUp";
pub const PAGE_DOWN: &str = "pageDown";
pub const EXIT: &str = "exit";
pub const CANCEL: &str = "cancel";
