//! Lossy compaction of working memory.
//!
//! When the history grows past a threshold, the agent reflects on what it
//! has learned, folds that into the persistent conversation note, and keeps
//! only the anchor entry plus the most recent tail. Everything in between
//! survives only through the note.

use tracing::{debug, info};

use crate::error::ReasoningError;
use crate::memory::WorkingMemory;
use crate::reasoning::Reasoning;

/// Entry count above which compaction runs.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 10;

/// Entries kept from the end of the history after compaction.
pub const DEFAULT_COMPACTION_TAIL: usize = 6;

/// Instruction for the reflection step.
const REFLECTION_INSTRUCTIONS: &str = "What have I learned?";

/// Configuration for compaction.
#[derive(Debug, Clone)]
pub struct CompactorConfig {
    /// Compaction runs when the memory holds more entries than this.
    pub threshold: usize,
    /// Number of trailing entries kept next to the anchor.
    pub tail: usize,
}

impl Default for CompactorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COMPACTION_THRESHOLD,
            tail: DEFAULT_COMPACTION_TAIL,
        }
    }
}

/// Owns the persistent conversation note and compacts memory against it.
///
/// Cloning snapshots the note, so a caller can compact against a copy and
/// keep it only once the surrounding transition succeeds.
#[derive(Debug, Clone)]
pub struct Compactor {
    config: CompactorConfig,
    note: String,
    compactions: usize,
}

impl Compactor {
    pub fn new(config: CompactorConfig, initial_note: impl Into<String>) -> Self {
        Self {
            config,
            note: initial_note.into(),
            compactions: 0,
        }
    }

    /// The current conversation note.
    pub fn note(&self) -> &str {
        &self.note
    }

    /// How many times compaction has run this session.
    pub fn compactions(&self) -> usize {
        self.compactions
    }

    pub fn needs_compaction(&self, memory: &WorkingMemory) -> bool {
        memory.len() > self.config.threshold
    }

    /// Compact `memory` if it is over the threshold.
    ///
    /// Returns `Ok(None)` without calling any collaborator when the memory is
    /// at or under the threshold.
    pub async fn maybe_compact(
        &mut self,
        memory: &WorkingMemory,
        reasoning: &dyn Reasoning,
    ) -> Result<Option<WorkingMemory>, ReasoningError> {
        if !self.needs_compaction(memory) {
            return Ok(None);
        }
        info!(
            "Updating conversation notes and compacting memory ({} entries)",
            memory.len()
        );

        let (reflected, learned) = reasoning.monologue(memory, REFLECTION_INSTRUCTIONS).await?;
        debug!("Reflection before compaction: {learned}");

        let prompt = note_update_prompt(&self.note, reflected.agent_name());
        let (_, updated) = reasoning.instruction(&reflected, &prompt).await?;
        self.note = updated;
        self.compactions += 1;

        let compacted = reflected
            .slice(..1)
            .concat(reflected.last_n(self.config.tail).entries().iter().cloned());
        debug!(
            "Compacted memory {} -> {} entries",
            reflected.len(),
            compacted.len()
        );
        Ok(Some(compacted))
    }
}

fn note_update_prompt(existing: &str, name: &str) -> String {
    format!(
        "## Existing notes\n\
         {existing}\n\n\
         ## Description\n\
         Rewrite the notes as one clear paragraph describing the conversation so far, \
         keeping every detail {name} would want to remember.\n\n\
         ## Rules\n\
         * Write a single paragraph\n\
         * Carry forward what still matters from the existing notes\n\
         * Abbreviate to keep the notes short\n\
         * State what {name} is trying to accomplish and what they have done so far\n\n\
         Reply with the updated notes only."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEntry;
    use crate::reasoning::{RawToolChoice, ReasoningFuture, SpeechStream};
    use crate::tools::ToolRegistry;
    use std::sync::Mutex;

    /// Records calls and answers with fixed text.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Reasoning for Recorder {
        fn monologue<'a>(
            &'a self,
            memory: &'a WorkingMemory,
            instructions: &'a str,
        ) -> ReasoningFuture<'a, (WorkingMemory, String)> {
            self.calls.lock().unwrap().push(format!("monologue:{instructions}"));
            Box::pin(async move {
                Ok((memory.with_monologue("I learned things"), "I learned things".into()))
            })
        }

        fn spoken_dialog<'a>(
            &'a self,
            memory: &'a WorkingMemory,
            _prompt: &'a str,
        ) -> ReasoningFuture<'a, (WorkingMemory, SpeechStream)> {
            Box::pin(async move { Ok((memory.clone(), SpeechStream::ready(""))) })
        }

        fn choose_tool<'a>(
            &'a self,
            memory: &'a WorkingMemory,
            _registry: &'a ToolRegistry,
        ) -> ReasoningFuture<'a, RawToolChoice> {
            Box::pin(async move {
                Ok(RawToolChoice {
                    memory: memory.clone(),
                    name: "none".into(),
                    arguments: serde_json::Value::Null,
                })
            })
        }

        fn update_notes<'a>(
            &'a self,
            memory: &'a WorkingMemory,
        ) -> ReasoningFuture<'a, WorkingMemory> {
            Box::pin(async move { Ok(memory.clone()) })
        }

        fn instruction<'a>(
            &'a self,
            memory: &'a WorkingMemory,
            prompt: &'a str,
        ) -> ReasoningFuture<'a, (WorkingMemory, String)> {
            self.calls.lock().unwrap().push(format!("instruction:{prompt}"));
            Box::pin(async move { Ok((memory.clone(), "updated note".into())) })
        }
    }

    fn memory(n: usize) -> WorkingMemory {
        WorkingMemory::new("Philip").append(
            std::iter::once(MemoryEntry::system("anchor"))
                .chain((1..n).map(|i| MemoryEntry::user(format!("m{i}")))),
        )
    }

    #[tokio::test]
    async fn at_or_under_threshold_is_noop() {
        let reasoning = Recorder::default();
        let mut compactor = Compactor::new(CompactorConfig::default(), "seed");
        for n in [0, 1, 5, 10] {
            let result = compactor.maybe_compact(&memory(n), &reasoning).await.unwrap();
            assert!(result.is_none());
        }
        assert!(reasoning.calls.lock().unwrap().is_empty());
        assert_eq!(compactor.note(), "seed");
    }

    #[tokio::test]
    async fn over_threshold_keeps_anchor_and_tail() {
        for n in [11, 12, 40] {
            let reasoning = Recorder::default();
            let mut compactor = Compactor::new(CompactorConfig::default(), "seed");
            let compacted = compactor
                .maybe_compact(&memory(n), &reasoning)
                .await
                .unwrap()
                .unwrap();

            assert_eq!(compacted.len(), 7, "n={n}");
            assert_eq!(compacted.entries()[0].content, "anchor");
            assert_eq!(compacted.last().unwrap().content, "I learned things");
            assert_eq!(
                compacted.entries()[1].content,
                format!("m{}", n - 5),
                "tail starts five entries before the reflection"
            );
            assert_eq!(compactor.note(), "updated note");
            assert_eq!(compactor.compactions(), 1);
        }
    }

    #[tokio::test]
    async fn note_update_sees_existing_note() {
        let reasoning = Recorder::default();
        let mut compactor = Compactor::new(CompactorConfig::default(), "Philip was granted access");
        compactor.maybe_compact(&memory(11), &reasoning).await.unwrap();

        let calls = reasoning.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], "monologue:What have I learned?");
        assert!(calls[1].contains("Philip was granted access"));
    }

    #[tokio::test]
    async fn custom_threshold_and_tail() {
        let reasoning = Recorder::default();
        let mut compactor = Compactor::new(CompactorConfig { threshold: 3, tail: 2 }, "");
        let compacted = compactor
            .maybe_compact(&memory(4), &reasoning)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(compacted.len(), 3);
    }
}
