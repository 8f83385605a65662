//! Directory View: listing and navigation against a rooted tree.
//!
//! Working directories are root-relative strings (`""` is the root). Path
//! resolution is purely lexical; existence is only checked by [`DirectoryView::list`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::FsError;

/// Name of the synthetic parent entry appended to every listing.
pub const PARENT_ENTRY: &str = "..";

/// One entry of a directory listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
}

impl DirectoryEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }

    /// Listing label in the `name <DIR>` / `name <FILE>` form.
    pub fn label(&self) -> String {
        let kind = if self.is_directory { "<DIR>" } else { "<FILE>" };
        format!("{} {kind}", self.name)
    }
}

/// Lists and resolves directories under a fixed root.
#[derive(Debug, Clone)]
pub struct DirectoryView {
    root: PathBuf,
}

impl DirectoryView {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a root-relative `cwd`.
    ///
    /// A `cwd` that climbs above the root (only reachable through the
    /// synthetic `..` entry) does not exist inside the tree.
    pub fn resolve(&self, cwd: &str) -> Result<PathBuf, FsError> {
        let normalized = change_directory("", cwd);
        if normalized.split('/').next() == Some(PARENT_ENTRY) {
            return Err(FsError::NotFound(cwd.to_string()));
        }
        if normalized.is_empty() {
            Ok(self.root.clone())
        } else {
            Ok(self.root.join(normalized))
        }
    }

    /// List `cwd`. Real entries come first, sorted by name, followed by the
    /// synthetic `..` entry, which is appended even at the root.
    pub async fn list(&self, cwd: &str) -> Result<Vec<DirectoryEntry>, FsError> {
        let dir = self.resolve(cwd)?;
        let meta = fs::metadata(&dir).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(cwd.to_string()),
            _ => FsError::io(dir.display().to_string(), e),
        })?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory(cwd.to_string()));
        }

        let io_err = |e| FsError::io(dir.display().to_string(), e);
        let mut reader = fs::read_dir(&dir).await.map_err(io_err)?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(io_err)? {
            let is_directory = entry.file_type().await.map_err(io_err)?.is_dir();
            entries.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.push(DirectoryEntry::directory(PARENT_ENTRY));

        debug!("Listed '{}': {} entries", cwd, entries.len());
        Ok(entries)
    }
}

/// Resolve `relative` against `cwd` lexically.
///
/// Empty and `.` segments are dropped, `..` pops the previous segment, and a
/// `..` with nothing left to pop is kept so the result can climb above the
/// root. The tree is never consulted.
pub fn change_directory(cwd: &str, relative: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in cwd.split('/').chain(relative.split('/')) {
        match segment {
            "" | "." => {}
            PARENT_ENTRY => match parts.last() {
                Some(&last) if last != PARENT_ENTRY => {
                    parts.pop();
                }
                _ => parts.push(PARENT_ENTRY),
            },
            name => parts.push(name),
        }
    }
    parts.join("/")
}

/// Join a root-relative `cwd` with an entry name for display and store keys.
pub fn join_path(cwd: &str, name: &str) -> String {
    if cwd.is_empty() {
        name.to_string()
    } else {
        format!("{}/{name}", cwd.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_directory_round_trips() {
        for cwd in ["a", "a/b", "deep/er/still"] {
            for sub in ["x", "nested/dir"] {
                let down = change_directory(cwd, sub);
                let mut up = down.clone();
                for _ in sub.split('/') {
                    up = change_directory(&up, "..");
                }
                assert_eq!(up, cwd, "cd {sub} from {cwd} went to {down}");
            }
        }
        assert_eq!(change_directory(&change_directory("a/b", "sub"), ".."), "a/b");
    }

    #[test]
    fn change_directory_normalizes_segments() {
        assert_eq!(change_directory("", "src"), "src");
        assert_eq!(change_directory("src", "./lib/../bin/"), "src/bin");
        assert_eq!(change_directory("src", ".."), "");
        assert_eq!(change_directory("", ".."), "..");
        assert_eq!(change_directory("..", ".."), "../..");
    }

    #[test]
    fn join_path_handles_root() {
        assert_eq!(join_path("", "a.txt"), "a.txt");
        assert_eq!(join_path("src", "a.txt"), "src/a.txt");
        assert_eq!(join_path("src/", "a.txt"), "src/a.txt");
    }

    #[test]
    fn label_marks_kind() {
        assert_eq!(DirectoryEntry::file("a.txt").label(), "a.txt <FILE>");
        assert_eq!(DirectoryEntry::directory("src").label(), "src <DIR>");
    }

    #[test]
    fn entry_serializes_camel_case() {
        let json = serde_json::to_value(DirectoryEntry::directory("sub")).unwrap();
        assert_eq!(json["isDirectory"], true);
        assert_eq!(json["name"], "sub");
    }

    #[tokio::test]
    async fn list_appends_parent_after_sorted_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let view = DirectoryView::new(dir.path());
        let entries = view.list("").await.unwrap();
        assert_eq!(
            entries,
            vec![
                DirectoryEntry::file("a.txt"),
                DirectoryEntry::file("b.txt"),
                DirectoryEntry::directory("sub"),
                DirectoryEntry::directory(".."),
            ]
        );
    }

    #[tokio::test]
    async fn list_empty_directory_still_has_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        let view = DirectoryView::new(dir.path());
        let entries = view.list("empty").await.unwrap();
        assert_eq!(entries, vec![DirectoryEntry::directory("..")]);
    }

    #[tokio::test]
    async fn list_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), "x").unwrap();
        let view = DirectoryView::new(dir.path());

        assert!(matches!(
            view.list("missing").await,
            Err(FsError::NotFound(_))
        ));
        assert!(matches!(
            view.list("file.txt").await,
            Err(FsError::NotADirectory(_))
        ));
        assert!(matches!(view.list("..").await, Err(FsError::NotFound(_))));
    }
}
