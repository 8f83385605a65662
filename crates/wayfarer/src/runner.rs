//! The event loop: feeds perceptions to the current state and applies the
//! transitions it returns.
//!
//! [`Agent::handle`] takes `&mut self`, so one perception is fully handled
//! (including any `execute_now` chain) before the next can enter. A failed
//! transition leaves memory, state, invocation count and the conversation
//! note as they were.
//!
//! ```ignore
//! let mut agent = Agent::new(&reasoning, &environment, &store, config)
//!     .with_event_handler(&LoggingHandler);
//! match agent.run().await? {
//!     RunOutcome::HandedOff { note } => println!("{note}"),
//!     other => println!("{other:?}"),
//! }
//! ```

use tracing::{debug, info};

use crate::config::AgentConfig;
use crate::environment::Environment;
use crate::error::TransitionError;
use crate::events::{AgentEvent, EventHandler, NoopHandler};
use crate::memory::{Compactor, MemoryEntry, TakeawayStore, WorkingMemory};
use crate::perception::Perception;
use crate::process::{Process, ProcessContext};
use crate::reasoning::Reasoning;

/// Result of handling one perception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The agent is still exploring.
    Continue,
    /// The agent reached the terminal chat handoff.
    HandedOff,
}

/// Why [`Agent::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The agent chose to stop; `note` is the final conversation note.
    HandedOff { note: String },
    /// The environment had no more perceptions.
    EnvironmentClosed,
    /// `max_steps` perceptions were handled without a handoff.
    StepLimitReached { steps: usize },
}

/// An agent session over borrowed collaborators.
pub struct Agent<'a> {
    reasoning: &'a dyn Reasoning,
    environment: &'a dyn Environment,
    store: &'a dyn TakeawayStore,
    events: &'a dyn EventHandler,
    config: AgentConfig,
    compactor: Compactor,
    memory: WorkingMemory,
    process: Process,
    invocations: usize,
    steps: usize,
}

impl<'a> Agent<'a> {
    pub fn new(
        reasoning: &'a dyn Reasoning,
        environment: &'a dyn Environment,
        store: &'a dyn TakeawayStore,
        config: AgentConfig,
    ) -> Self {
        let memory = WorkingMemory::new(config.agent_name.clone())
            .append([MemoryEntry::system(blueprint(&config))]);
        Self {
            reasoning,
            environment,
            store,
            events: &NoopHandler,
            compactor: Compactor::new(config.compactor_config(), config.initial_note.clone()),
            config,
            memory,
            process: Process::default(),
            invocations: 0,
            steps: 0,
        }
    }

    pub fn with_event_handler(mut self, events: &'a dyn EventHandler) -> Self {
        self.events = events;
        self
    }

    /// Replace the starting memory (the first entry is the compaction anchor).
    pub fn with_memory(mut self, memory: WorkingMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn memory(&self) -> &WorkingMemory {
        &self.memory
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    /// Times the current state has run since it was entered.
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// The persistent conversation note.
    pub fn note(&self) -> &str {
        self.compactor.note()
    }

    /// Handle one perception.
    ///
    /// The perception is appended to memory as a user entry, then the
    /// current state runs. While it asks to `execute_now`, the next state
    /// runs on the same perception.
    pub async fn handle(&mut self, perception: &Perception) -> Result<Step, TransitionError> {
        if self.process.is_terminal() {
            return Ok(Step::HandedOff);
        }
        self.events.on_event(&AgentEvent::PerceptionReceived {
            state: self.process.name(),
            action: &perception.action,
        });

        let mut memory = self.memory.with_user(perception.to_memory_text());
        let mut process = self.process.clone();
        let mut invocations = self.invocations;
        let mut compactor = self.compactor.clone();

        loop {
            let mut ctx = ProcessContext {
                reasoning: self.reasoning,
                environment: self.environment,
                store: self.store,
                compactor: &mut compactor,
                events: self.events,
                config: &self.config,
            };
            let transition = match process
                .invoke(&mut ctx, memory, perception, invocations)
                .await
            {
                Ok(transition) => transition,
                Err(e) => {
                    self.events.on_event(&AgentEvent::TransitionFailed {
                        state: process.name(),
                        error: &e.to_string(),
                    });
                    return Err(e);
                }
            };

            let changed = !transition.next.same_state(&process);
            if changed || transition.execute_now {
                self.events.on_event(&AgentEvent::Transitioned {
                    from: process.name(),
                    to: transition.next.name(),
                    execute_now: transition.execute_now,
                });
            }
            invocations = if changed { 0 } else { invocations + 1 };
            memory = transition.memory;
            process = transition.next;

            if process.is_terminal() || !transition.execute_now {
                break;
            }
            debug!("Executing {} now", process.name());
        }

        self.memory = memory;
        self.process = process;
        self.invocations = invocations;
        self.compactor = compactor;

        if self.process.is_terminal() {
            self.events.on_event(&AgentEvent::HandedOff {
                note: self.compactor.note(),
            });
            return Ok(Step::HandedOff);
        }
        Ok(Step::Continue)
    }

    /// Pull perceptions from the environment until the agent hands off, the
    /// environment closes, or `max_steps` is reached.
    pub async fn run(&mut self) -> Result<RunOutcome, TransitionError> {
        info!(
            "{} starts exploring (max {} steps)",
            self.config.agent_name, self.config.max_steps
        );
        while self.steps < self.config.max_steps {
            let Some(perception) = self.environment.next_perception().await else {
                info!("Environment closed after {} steps", self.steps);
                return Ok(RunOutcome::EnvironmentClosed);
            };
            self.steps += 1;
            if self.handle(&perception).await? == Step::HandedOff {
                return Ok(RunOutcome::HandedOff {
                    note: self.compactor.note().to_string(),
                });
            }
        }
        info!("Step limit of {} reached", self.config.max_steps);
        Ok(RunOutcome::StepLimitReached { steps: self.steps })
    }
}

/// The anchor entry every session starts from.
fn blueprint(config: &AgentConfig) -> String {
    let name = &config.agent_name;
    format!(
        "You are modeling the mind of {name}.\n\n\
         ## Background\n{}\n\n\
         ## What {name} can do\n\
         {name} explores the codebase they live in: listing directories, reading files \
         page by page, editing what they want to change, and filing tickets for anything \
         too broad to change directly.",
        config.initial_note
    )
}
