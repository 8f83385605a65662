//! An environment backed by a directory on the local filesystem.
//!
//! Dispatches are executed immediately against a [`DirectoryView`] and at
//! most one open [`FileSession`]; their outcomes are queued as perceptions.
//! When the queue is empty the environment re-emits what the agent is
//! looking at (the editor screen, or the current listing) so a state that
//! chose not to act still gets invoked again.

use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::environment::{EnvFuture, Environment};
use crate::error::FsError;
use crate::fs::{DirectoryView, FileSession, change_directory, join_path};
use crate::perception::{
    Action, Dispatch, EditParams, Perception, PerceptionMetadata, actions,
};
use crate::tools::TicketArgs;

/// The file currently open in the editor.
#[derive(Debug)]
struct OpenFile {
    cwd: String,
    file_name: String,
    session: FileSession,
}

impl OpenFile {
    fn metadata(&self) -> PerceptionMetadata {
        PerceptionMetadata {
            cwd: Some(self.cwd.clone()),
            file_name: Some(self.file_name.clone()),
            screen: Some(self.session.screen()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
struct State {
    cwd: String,
    open: Option<OpenFile>,
    queue: VecDeque<Perception>,
    stopped: bool,
    transcript: Vec<String>,
}

/// Settings for [`LocalEnvironment`].
#[derive(Debug, Clone)]
pub struct LocalConfig {
    pub page_size: usize,
    pub first_chunk_lines: usize,
    pub tickets_dir: PathBuf,
    /// Print spoken chunks to stdout as they arrive.
    pub echo_speech: bool,
}

impl From<&AgentConfig> for LocalConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            page_size: config.page_size,
            first_chunk_lines: config.first_chunk_lines,
            tickets_dir: config.tickets_dir.clone(),
            echo_speech: true,
        }
    }
}

pub struct LocalEnvironment {
    view: DirectoryView,
    config: LocalConfig,
    state: Mutex<State>,
}

impl LocalEnvironment {
    pub fn new(root: impl Into<PathBuf>, config: LocalConfig) -> Self {
        Self {
            view: DirectoryView::new(root),
            config,
            state: Mutex::new(State::default()),
        }
    }

    pub fn root(&self) -> &Path {
        self.view.root()
    }

    pub async fn cwd(&self) -> String {
        self.state.lock().await.cwd.clone()
    }

    /// Everything spoken so far, one entry per utterance.
    pub async fn transcript(&self) -> Vec<String> {
        self.state.lock().await.transcript.clone()
    }

    pub async fn is_stopped(&self) -> bool {
        self.state.lock().await.stopped
    }

    /// Queue a perception from outside (e.g. a user message).
    pub async fn push(&self, perception: Perception) {
        self.state.lock().await.queue.push_back(perception);
    }

    async fn execute(&self, state: &mut State, dispatch: Dispatch) {
        let perception = match dispatch.action {
            Action::Ls => self.list(&state.cwd).await.unwrap_or_else(|p| p),
            Action::Cd => {
                let target = change_directory(&state.cwd, &dispatch.content);
                match self.list(&target).await {
                    Ok(listed) => {
                        info!("cd '{}' -> '{target}'", state.cwd);
                        state.cwd = target;
                        listed
                    }
                    Err(failed) => failed,
                }
            }
            Action::OpenInEditor => self.open(state, &dispatch.content).await,
            Action::PageUp | Action::PageDown => match state.open.as_mut() {
                Some(open) => {
                    if dispatch.action == Action::PageUp {
                        open.session.page_up();
                    } else {
                        open.session.page_down();
                    }
                    Perception::new(actions::PAGE).with_metadata(open.metadata())
                }
                None => Perception::file_missing(state.cwd.clone(), ""),
            },
            Action::Edit => self.edit(state, &dispatch).await,
            Action::Exit => match state.open.take() {
                Some(open) => Perception::new(actions::CLOSED)
                    .with_content(join_path(&open.cwd, &open.file_name)),
                None => Perception::new(actions::CLOSED),
            },
            Action::FileATicket => self.file_ticket(state, &dispatch).await,
            Action::Stop => {
                info!("Agent stopped exploring");
                state.stopped = true;
                return;
            }
        };
        state.queue.push_back(perception);
    }

    async fn list(&self, cwd: &str) -> Result<Perception, Perception> {
        match self.view.list(cwd).await {
            Ok(entries) => Ok(Perception::listed(cwd, entries)),
            Err(e) => {
                warn!("Listing '{cwd}' failed: {e}");
                Err(failure(actions::FAILED_TO_LIST, &e).with_metadata(PerceptionMetadata {
                    cwd: Some(cwd.to_string()),
                    error: Some(e.to_string()),
                    ..Default::default()
                }))
            }
        }
    }

    async fn open(&self, state: &mut State, file_name: &str) -> Perception {
        match FileSession::open(self.view.root(), &state.cwd, file_name, self.config.page_size).await
        {
            Ok(session) => {
                let open = OpenFile {
                    cwd: state.cwd.clone(),
                    file_name: file_name.to_string(),
                    session,
                };
                let mut meta = open.metadata();
                meta.large_chunk = Some(open.session.first_chunk(self.config.first_chunk_lines));
                let perception = Perception::new(actions::READ_FILE)
                    .with_content(open.session.full_text())
                    .with_metadata(meta);
                state.open = Some(open);
                perception
            }
            Err(e) => {
                debug!("Cannot open '{file_name}': {e}");
                let mut perception = Perception::file_missing(state.cwd.clone(), file_name);
                if let Some(meta) = perception.metadata.as_mut() {
                    meta.error = Some(e.to_string());
                }
                perception
            }
        }
    }

    async fn edit(&self, state: &mut State, dispatch: &Dispatch) -> Perception {
        let Some(open) = state.open.as_mut() else {
            return Perception::file_missing(state.cwd.clone(), "");
        };
        let Some(params) = dispatch.params_as::<EditParams>() else {
            let mut meta = open.metadata();
            meta.error = Some("edit dispatched without start/end/replacement".into());
            return Perception::new(actions::FAILED_TO_EDIT).with_metadata(meta);
        };
        match open
            .session
            .edit(params.start, params.end, &params.replacement)
            .await
        {
            Ok(()) => Perception::new(actions::EDITED)
                .with_content(params.commentary.unwrap_or_default())
                .with_metadata(open.metadata()),
            Err(e) => {
                warn!("Edit failed: {e}");
                let mut meta = open.metadata();
                meta.error = Some(e.to_string());
                failure(actions::FAILED_TO_EDIT, &e).with_metadata(meta)
            }
        }
    }

    async fn file_ticket(&self, state: &mut State, dispatch: &Dispatch) -> Perception {
        let ticket = dispatch.params_as::<TicketArgs>().unwrap_or(TicketArgs {
            subject: dispatch.content.clone(),
            content: String::new(),
        });
        let context = match state.open.as_ref() {
            Some(open) => join_path(&open.cwd, &open.file_name),
            None => join_path(&state.cwd, ""),
        };
        let meta = match state.open.as_ref() {
            Some(open) => open.metadata(),
            None => PerceptionMetadata {
                cwd: Some(state.cwd.clone()),
                ..Default::default()
            },
        };

        match write_ticket(&self.config.tickets_dir, &ticket, &context).await {
            Ok(path) => {
                info!("Filed ticket '{}' at {}", ticket.subject, path.display());
                Perception::new(actions::TICKET_FILED)
                    .with_content(ticket.subject)
                    .with_metadata(meta)
            }
            Err(e) => {
                warn!("Filing ticket failed: {e}");
                Perception::new(actions::FAILED_TO_FILE_TICKET)
                    .with_content(e.to_string())
                    .with_metadata(PerceptionMetadata {
                        error: Some(e.to_string()),
                        ..meta
                    })
            }
        }
    }
}

fn failure(action: &str, error: &FsError) -> Perception {
    Perception::new(action).with_content(error.to_string())
}

/// Write a ticket as Markdown under `dir`, returning its path.
async fn write_ticket(dir: &Path, ticket: &TicketArgs, context: &str) -> Result<PathBuf, FsError> {
    let now = Local::now();
    let display = dir.display().to_string();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| FsError::io(&display, e))?;

    let path = dir.join(format!("{}-{}.md", now.format("%Y%m%d-%H%M%S"), slug(&ticket.subject)));
    let body = format!(
        "# {}\n\n- Filed: {}\n- Context: `{}`\n\n{}\n",
        ticket.subject.trim(),
        now.to_rfc3339(),
        if context.is_empty() { "/" } else { context },
        ticket.content.trim()
    );
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| FsError::io(path.display().to_string(), e))?;
    Ok(path)
}

/// Lowercase ASCII alphanumerics joined by single dashes, at most 48 chars.
fn slug(subject: &str) -> String {
    let mut slug = String::new();
    for c in subject.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= 48 {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "ticket".to_string()
    } else {
        slug.to_string()
    }
}

impl Environment for LocalEnvironment {
    fn dispatch<'a>(&'a self, dispatch: Dispatch) -> EnvFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.stopped {
                debug!("Ignoring {} after stop", dispatch.action);
                return;
            }
            self.execute(&mut state, dispatch).await;
        })
    }

    fn speak<'a>(&'a self, mut chunks: mpsc::Receiver<String>) -> EnvFuture<'a, ()> {
        Box::pin(async move {
            let mut utterance = String::new();
            while let Some(chunk) = chunks.recv().await {
                if self.config.echo_speech {
                    print!("{chunk}");
                    let _ = std::io::stdout().flush();
                }
                utterance.push_str(&chunk);
            }
            if utterance.is_empty() {
                return;
            }
            if self.config.echo_speech {
                println!();
            }
            self.state.lock().await.transcript.push(utterance);
        })
    }

    fn next_perception<'a>(&'a self) -> EnvFuture<'a, Option<Perception>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.stopped {
                return None;
            }
            if let Some(perception) = state.queue.pop_front() {
                return Some(perception);
            }
            // Idle: show the agent what it is looking at again.
            let perception = match state.open.as_ref() {
                Some(open) => Perception::new(actions::PAGE).with_metadata(open.metadata()),
                None => self.list(&state.cwd).await.unwrap_or_else(|p| p),
            };
            Some(perception)
        })
    }
}
