//! Reasoning collaborators: the language-generation steps the orchestrator
//! calls but does not own.
//!
//! The core only depends on the [`Reasoning`] trait. Each method takes a
//! memory snapshot and returns text, a tool choice, or a derived memory.
//! Failures are fatal to the transition that made the call.
//!
//! - [`openrouter`]: implementation backed by the OpenRouter chat API.
//! - [`SpeechStream`]: the producer/consumer channel for spoken commentary.

pub mod openrouter;

use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, oneshot};

use crate::error::ReasoningError;
use crate::memory::WorkingMemory;
use crate::tools::ToolRegistry;

/// Boxed future returned by [`Reasoning`] methods, keeping the trait
/// dyn-compatible.
pub type ReasoningFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ReasoningError>> + Send + 'a>>;

/// Capacity of the spoken chunk channel.
const SPEECH_CHANNEL_CAPACITY: usize = 64;

/// A tool choice as returned by the chooser, before registry validation.
#[derive(Debug, Clone)]
pub struct RawToolChoice {
    pub memory: WorkingMemory,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The reasoning steps used by every state.
pub trait Reasoning: Send + Sync {
    /// Think privately about `instructions`; returns the memory with the
    /// thought appended and the thought text.
    fn monologue<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        instructions: &'a str,
    ) -> ReasoningFuture<'a, (WorkingMemory, String)>;

    /// Speak out loud. The returned stream yields chunks as they are
    /// produced and resolves to the full text.
    fn spoken_dialog<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        prompt: &'a str,
    ) -> ReasoningFuture<'a, (WorkingMemory, SpeechStream)>;

    /// Pick one tool from `registry`.
    fn choose_tool<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        registry: &'a ToolRegistry,
    ) -> ReasoningFuture<'a, RawToolChoice>;

    /// Refresh auxiliary notes from the memory.
    fn update_notes<'a>(&'a self, memory: &'a WorkingMemory) -> ReasoningFuture<'a, WorkingMemory>;

    /// Answer a one-shot instruction.
    fn instruction<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        prompt: &'a str,
    ) -> ReasoningFuture<'a, (WorkingMemory, String)>;
}

// ── Speech channel ─────────────────────────────────────────────────

/// Consumer side of a spoken-dialog stream.
#[derive(Debug)]
pub struct SpeechStream {
    chunks: mpsc::Receiver<String>,
    text: oneshot::Receiver<Result<String, ReasoningError>>,
}

/// Producer side of a spoken-dialog stream.
#[derive(Debug)]
pub struct SpeechSender {
    chunks: mpsc::Sender<String>,
    text: oneshot::Sender<Result<String, ReasoningError>>,
    buffer: String,
}

/// The final text of a spoken dialog, awaited after the live chunks.
#[derive(Debug)]
pub struct SpokenText(oneshot::Receiver<Result<String, ReasoningError>>);

impl SpeechStream {
    /// Create a connected producer/consumer pair.
    pub fn channel() -> (SpeechSender, SpeechStream) {
        let (chunk_tx, chunk_rx) = mpsc::channel(SPEECH_CHANNEL_CAPACITY);
        let (text_tx, text_rx) = oneshot::channel();
        (
            SpeechSender {
                chunks: chunk_tx,
                text: text_tx,
                buffer: String::new(),
            },
            SpeechStream {
                chunks: chunk_rx,
                text: text_rx,
            },
        )
    }

    /// A stream that already holds its whole text as a single chunk.
    pub fn ready(text: impl Into<String>) -> Self {
        let text = text.into();
        let (chunk_tx, chunk_rx) = mpsc::channel(1);
        let (text_tx, text_rx) = oneshot::channel();
        if !text.is_empty() {
            let _ = chunk_tx.try_send(text.clone());
        }
        let _ = text_tx.send(Ok(text));
        SpeechStream {
            chunks: chunk_rx,
            text: text_rx,
        }
    }

    /// Split into the live chunk receiver and the final-text handle.
    pub fn split(self) -> (mpsc::Receiver<String>, SpokenText) {
        (self.chunks, SpokenText(self.text))
    }
}

impl SpeechSender {
    /// Forward one chunk. A consumer that stopped listening does not stop
    /// the producer; the text still accumulates.
    pub async fn send(&mut self, chunk: impl Into<String>) {
        let chunk = chunk.into();
        self.buffer.push_str(&chunk);
        let _ = self.chunks.send(chunk).await;
    }

    /// Close the stream and resolve the final text.
    pub fn finish(self) {
        let _ = self.text.send(Ok(self.buffer));
    }

    /// Close the stream with an error.
    pub fn fail(self, error: ReasoningError) {
        let _ = self.text.send(Err(error));
    }
}

impl SpokenText {
    pub async fn resolve(self) -> Result<String, ReasoningError> {
        self.0
            .await
            .map_err(|_| ReasoningError::Stream("speech producer dropped".into()))?
    }
}
