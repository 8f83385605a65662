//! The orchestrator states.
//!
//! Each state takes the current working memory and the perception that
//! invoked it, may dispatch actions, and returns a [`Transition`]: the
//! outgoing memory, the next state, and whether that state should run
//! immediately on the same perception.
//!
//! | State | Module |
//! |-------|--------|
//! | [`Process::Explore`] | [`explore`] |
//! | [`Process::ReadFile`] | [`read_file`] |
//! | [`Process::EditFile`] | [`edit_file`] |
//! | [`Process::Chat`] | terminal, handled by the runner |

pub mod deliberation;
pub mod edit_file;
pub mod explore;
pub mod read_file;

use tracing::debug;

use crate::config::AgentConfig;
use crate::environment::Environment;
use crate::error::TransitionError;
use crate::events::{AgentEvent, EventHandler};
use crate::memory::{Compactor, TakeawayStore, WorkingMemory};
use crate::perception::{Dispatch, FileRef, Perception};
use crate::reasoning::Reasoning;

/// A line range the agent decided to edit, carried into [`Process::EditFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub file: FileRef,
    pub start: usize,
    pub end: usize,
    pub commentary: Option<String>,
    /// Editor screen at the time of the decision.
    pub screen: String,
}

/// The current state of the agent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Process {
    #[default]
    Explore,
    /// Reading a file. `file` is the last file the environment reported.
    ReadFile { file: FileRef },
    EditFile(EditRequest),
    /// Exploration is over; the conversation continues elsewhere.
    Chat,
}

impl Process {
    pub fn name(&self) -> &'static str {
        match self {
            Process::Explore => "explore",
            Process::ReadFile { .. } => "read_file",
            Process::EditFile(_) => "edit_file",
            Process::Chat => "chat",
        }
    }

    /// Whether `other` is the same state, ignoring the data it carries.
    pub fn same_state(&self, other: &Process) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Process::Chat)
    }

    /// Run this state for one perception.
    ///
    /// `invocation` counts how many times the state has run since it was
    /// entered, starting at 0.
    pub async fn invoke(
        &self,
        ctx: &mut ProcessContext<'_>,
        memory: WorkingMemory,
        perception: &Perception,
        invocation: usize,
    ) -> Result<Transition, TransitionError> {
        debug!("[{}] invocation {invocation}: {}", self.name(), perception.action);
        match self {
            Process::Explore => explore::invoke(ctx, memory, perception, invocation).await,
            Process::ReadFile { file } => {
                read_file::invoke(ctx, memory, perception, file.clone()).await
            }
            Process::EditFile(request) => {
                edit_file::invoke(ctx, memory, perception, request.clone(), invocation).await
            }
            Process::Chat => Ok(Transition::stay(memory, Process::Chat)),
        }
    }
}

/// Result of running a state.
#[derive(Debug, Clone)]
pub struct Transition {
    pub memory: WorkingMemory,
    pub next: Process,
    /// Run `next` right away on the same perception.
    pub execute_now: bool,
}

impl Transition {
    pub fn stay(memory: WorkingMemory, current: Process) -> Self {
        Self {
            memory,
            next: current,
            execute_now: false,
        }
    }

    pub fn to(memory: WorkingMemory, next: Process) -> Self {
        Self {
            memory,
            next,
            execute_now: false,
        }
    }

    pub fn now(memory: WorkingMemory, next: Process) -> Self {
        Self {
            memory,
            next,
            execute_now: true,
        }
    }
}

/// Everything a state may touch while it runs.
pub struct ProcessContext<'a> {
    pub reasoning: &'a dyn Reasoning,
    pub environment: &'a dyn Environment,
    pub store: &'a dyn TakeawayStore,
    pub compactor: &'a mut Compactor,
    pub events: &'a dyn EventHandler,
    pub config: &'a AgentConfig,
}

impl ProcessContext<'_> {
    /// Send `dispatch` to the environment.
    pub async fn dispatch(&self, dispatch: Dispatch) {
        self.events.on_event(&AgentEvent::Dispatched(&dispatch));
        self.environment.dispatch(dispatch).await;
    }

    /// Run the compactor, returning `memory` unchanged when under threshold.
    pub async fn compact(&mut self, memory: WorkingMemory) -> Result<WorkingMemory, TransitionError> {
        match self.compactor.maybe_compact(&memory, self.reasoning).await? {
            Some(compacted) => {
                self.events.on_event(&AgentEvent::Compacted {
                    before: memory.len(),
                    after: compacted.len(),
                });
                Ok(compacted)
            }
            None => Ok(memory),
        }
    }
}
