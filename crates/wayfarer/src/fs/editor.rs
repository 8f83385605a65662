//! Paginated file reader and line-range editor.
//!
//! A [`FileSession`] holds the whole file in memory as `\n`-separated lines
//! and exposes fixed-size pages through a cursor. Edits splice a single
//! replacement element into the line list and rewrite the file atomically.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::FsError;
use crate::fs::directory::{DirectoryView, change_directory};

/// Default number of lines per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One open file.
#[derive(Debug, Clone)]
pub struct FileSession {
    absolute_path: PathBuf,
    lines: Vec<String>,
    cursor: usize,
    page_size: usize,
}

impl FileSession {
    /// Open `relative` under `root/cwd` and read it entirely.
    pub async fn open(
        root: &Path,
        cwd: &str,
        relative: &str,
        page_size: usize,
    ) -> Result<Self, FsError> {
        let display = change_directory(cwd, relative);
        let absolute_path = DirectoryView::new(root)
            .resolve(&display)
            .map_err(|_| FsError::FileNotFound(display.clone()))?;

        let meta = fs::metadata(&absolute_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => FsError::FileNotFound(display.clone()),
                _ => FsError::io(&display, e),
            })?;
        if meta.is_dir() {
            return Err(FsError::NotAFile(display));
        }

        let text = fs::read_to_string(&absolute_path)
            .await
            .map_err(|e| FsError::io(&display, e))?;
        debug!("Opened '{}' ({} bytes)", absolute_path.display(), text.len());

        Ok(Self::from_text(absolute_path, &text, page_size))
    }

    /// Build a session over already-loaded text.
    pub fn from_text(absolute_path: impl Into<PathBuf>, text: &str, page_size: usize) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            lines: text.split('\n').map(str::to_string).collect(),
            cursor: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Number of `\n`-separated segments. A trailing newline yields a final
    /// empty line that is counted.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn full_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Highest cursor position that still shows a full page.
    fn max_cursor(&self) -> usize {
        self.line_count().saturating_sub(self.page_size)
    }

    /// Digit width of the line count, shared by every page of the file.
    fn number_width(&self) -> usize {
        self.line_count().to_string().len()
    }

    /// Render the lines `cursor..cursor + page_size`, each prefixed with its
    /// absolute line number. A cursor past the end renders an empty page.
    pub fn render_page(&self) -> Vec<String> {
        let width = self.number_width();
        self.lines
            .iter()
            .enumerate()
            .skip(self.cursor)
            .take(self.page_size)
            .map(|(index, line)| format!("{index:>width$} : {line}"))
            .collect()
    }

    /// [`render_page`](Self::render_page) joined into a single screen.
    pub fn screen(&self) -> String {
        self.render_page().join("\n")
    }

    /// Advance one page, clamped so the last page stays full.
    pub fn page_down(&mut self) -> Vec<String> {
        self.cursor = (self.cursor + self.page_size).min(self.max_cursor());
        self.render_page()
    }

    /// Go back one page, floored at the first line.
    pub fn page_up(&mut self) -> Vec<String> {
        self.cursor = self.cursor.saturating_sub(self.page_size);
        self.render_page()
    }

    /// The first `max_lines` raw lines, used as the opening chunk of a file.
    pub fn first_chunk(&self, max_lines: usize) -> String {
        self.lines
            .iter()
            .take(max_lines)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace lines `[start, end)` with `replacement` and write the file.
    ///
    /// `replacement` is inserted as one element even when it contains
    /// newlines. Out-of-range bounds are clamped the way an array splice
    /// clamps them. On a write failure the session is left untouched. The
    /// cursor is never moved.
    pub async fn edit(&mut self, start: usize, end: usize, replacement: &str) -> Result<(), FsError> {
        let start = start.min(self.lines.len());
        let end = end.max(start).min(self.lines.len());

        let mut lines = self.lines.clone();
        lines.splice(start..end, std::iter::once(replacement.to_string()));
        let text = lines.join("\n");

        write_atomic(&self.absolute_path, &text).await?;

        info!(
            "Edited '{}': replaced lines {start}..{end} ({} -> {} lines)",
            self.absolute_path.display(),
            self.lines.len(),
            lines.len()
        );
        self.lines = lines;
        Ok(())
    }
}

/// Write `content` to a sibling temp file and rename it over `path`.
async fn write_atomic(path: &Path, content: &str) -> Result<(), FsError> {
    let display = path.display().to_string();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.wayfarer.tmp"));

    fs::write(&tmp_path, content)
        .await
        .map_err(|e| FsError::io(&display, e))?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(FsError::io(&display, e));
    }
    Ok(())
}
