//! Observability for the agent loop.
//!
//! The runner and the states emit [`AgentEvent`]s through an
//! [`EventHandler`]. Handlers only observe; they cannot steer the agent.
//!
//! ```ignore
//! let handler = CompositeEventHandler::new()
//!     .with(LoggingHandler)
//!     .with(FnEventHandler::new(|event| {
//!         if let AgentEvent::HandedOff { .. } = event {
//!             println!("done exploring");
//!         }
//!     }));
//! ```

use tracing::{debug, info, warn};

use crate::perception::Dispatch;

/// Events emitted while the agent runs.
#[derive(Debug)]
pub enum AgentEvent<'a> {
    /// A perception is about to be handled by `state`.
    PerceptionReceived { state: &'a str, action: &'a str },
    /// Working memory was compacted.
    Compacted { before: usize, after: usize },
    /// The tool chooser picked `tool` (before registry validation).
    ToolChosen {
        state: &'a str,
        tool: &'a str,
        arguments: &'a serde_json::Value,
    },
    /// An action was sent to the environment.
    Dispatched(&'a Dispatch),
    /// The current state changed, or re-entered with `execute_now`.
    Transitioned {
        from: &'a str,
        to: &'a str,
        execute_now: bool,
    },
    /// A transition failed; the previous memory and state were kept.
    TransitionFailed { state: &'a str, error: &'a str },
    /// The agent stopped exploring and handed off to chat.
    HandedOff { note: &'a str },
}

/// Receives [`AgentEvent`]s. The default implementation ignores them.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &AgentEvent<'_>) {
        let _ = event;
    }
}

/// Ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
pub struct FnEventHandler<F>
where
    F: Fn(&AgentEvent<'_>) + Send + Sync,
{
    f: F,
}

impl<F> FnEventHandler<F>
where
    F: Fn(&AgentEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&AgentEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &AgentEvent<'_>) {
        (self.f)(event)
    }
}

/// Fans events out to several handlers in registration order.
#[derive(Default)]
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Add `handler` only when `condition` holds.
    pub fn with_if(self, condition: bool, handler: impl EventHandler + 'static) -> Self {
        if condition { self.with(handler) } else { self }
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &AgentEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

/// Logs every event through `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &AgentEvent<'_>) {
        match event {
            AgentEvent::PerceptionReceived { state, action } => {
                debug!("[{state}] perception: {action}");
            }
            AgentEvent::Compacted { before, after } => {
                info!("Compacted working memory: {before} -> {after} entries");
            }
            AgentEvent::ToolChosen {
                state,
                tool,
                arguments,
            } => {
                info!("[{state}] chose {tool} {arguments}");
            }
            AgentEvent::Dispatched(dispatch) => {
                let preview: String = dispatch.content.chars().take(80).collect();
                debug!("Dispatch: {} {preview}", dispatch.action);
            }
            AgentEvent::Transitioned {
                from,
                to,
                execute_now,
            } => {
                if *execute_now {
                    info!("{from} -> {to} (execute now)");
                } else {
                    info!("{from} -> {to}");
                }
            }
            AgentEvent::TransitionFailed { state, error } => {
                warn!("[{state}] transition failed: {error}");
            }
            AgentEvent::HandedOff { note } => {
                info!("Handing off to chat. Notes: {note}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn composite_calls_every_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&count);
        let b = Arc::clone(&count);
        let handler = CompositeEventHandler::new()
            .with(FnEventHandler::new(move |_| {
                a.fetch_add(1, Ordering::SeqCst);
            }))
            .with(LoggingHandler)
            .with_if(false, NoopHandler)
            .with(FnEventHandler::new(move |_| {
                b.fetch_add(10, Ordering::SeqCst);
            }));

        handler.on_event(&AgentEvent::Compacted {
            before: 11,
            after: 7,
        });
        handler.on_event(&AgentEvent::Dispatched(&Dispatch::ls()));
        assert_eq!(count.load(Ordering::SeqCst), 22);
    }
}
