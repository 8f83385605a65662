//! Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;
use wayfarer::ReasoningError;
use wayfarer::environment::{EnvFuture, Environment};
use wayfarer::fs::DirectoryEntry;
use wayfarer::memory::store::StoreFuture;
use wayfarer::memory::{InMemoryStore, TakeawayStore, WorkingMemory};
use wayfarer::perception::{Dispatch, Perception, PerceptionMetadata, actions};
use wayfarer::reasoning::{RawToolChoice, Reasoning, ReasoningFuture, SpeechStream};
use wayfarer::tools::ToolRegistry;

pub const THOUGHT: &str = "I should keep looking around.";
pub const SPOKEN: &str = "Interesting.";
pub const ANSWER: &str = "A short answer.";
/// What the scripted agent says when asked to reflect before compaction.
pub const REFLECTION: &str = "I learned where the notes live.";

/// Reasoning that answers with fixed text and pops tool choices from a script.
#[derive(Default)]
pub struct ScriptedReasoning {
    choices: Mutex<VecDeque<(String, Value)>>,
    calls: Mutex<Vec<String>>,
    fail_monologue: AtomicBool,
    tool_calls: AtomicUsize,
}

impl ScriptedReasoning {
    pub fn new(choices: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Self {
            choices: Mutex::new(
                choices
                    .into_iter()
                    .map(|(name, args)| (name.to_string(), args))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    /// Make every following monologue fail.
    pub fn fail_monologues(&self) {
        self.fail_monologue.store(true, Ordering::SeqCst);
    }

    /// Every call, as `step:prompt`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, step: &str) -> Vec<String> {
        let prefix = format!("{step}:");
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn remaining_choices(&self) -> usize {
        self.choices.lock().unwrap().len()
    }

    fn record(&self, step: &str, prompt: &str) {
        self.calls.lock().unwrap().push(format!("{step}:{prompt}"));
    }
}

impl Reasoning for ScriptedReasoning {
    fn monologue<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        instructions: &'a str,
    ) -> ReasoningFuture<'a, (WorkingMemory, String)> {
        self.record("monologue", instructions);
        let fail = self.fail_monologue.load(Ordering::SeqCst);
        Box::pin(async move {
            if fail {
                return Err(ReasoningError::Request("scripted failure".into()));
            }
            let thought = if instructions == "What have I learned?" {
                REFLECTION
            } else {
                THOUGHT
            };
            Ok((memory.with_monologue(thought), thought.to_string()))
        })
    }

    fn spoken_dialog<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        prompt: &'a str,
    ) -> ReasoningFuture<'a, (WorkingMemory, SpeechStream)> {
        self.record("spoken", prompt);
        Box::pin(async move { Ok((memory.clone(), SpeechStream::ready(SPOKEN))) })
    }

    fn choose_tool<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        registry: &'a ToolRegistry,
    ) -> ReasoningFuture<'a, RawToolChoice> {
        self.record("choose_tool", registry.state());
        self.tool_calls.fetch_add(1, Ordering::SeqCst);
        let (name, arguments) = self
            .choices
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ("none".to_string(), Value::Null));
        Box::pin(async move {
            Ok(RawToolChoice {
                memory: memory.clone(),
                name,
                arguments,
            })
        })
    }

    fn update_notes<'a>(&'a self, memory: &'a WorkingMemory) -> ReasoningFuture<'a, WorkingMemory> {
        self.record("update_notes", "");
        Box::pin(async move { Ok(memory.clone()) })
    }

    fn instruction<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        prompt: &'a str,
    ) -> ReasoningFuture<'a, (WorkingMemory, String)> {
        self.record("instruction", prompt);
        Box::pin(async move { Ok((memory.with_monologue(ANSWER), ANSWER.to_string())) })
    }
}

/// Environment that records dispatches and replays queued perceptions.
#[derive(Default)]
pub struct RecordingEnvironment {
    dispatched: Mutex<Vec<Dispatch>>,
    queue: Mutex<VecDeque<Perception>>,
    spoken: Mutex<Vec<String>>,
}

impl RecordingEnvironment {
    pub fn with_perceptions(perceptions: impl IntoIterator<Item = Perception>) -> Self {
        Self {
            queue: Mutex::new(perceptions.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn dispatched(&self) -> Vec<Dispatch> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.dispatched()
            .iter()
            .map(|d| d.action.to_string())
            .collect()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl Environment for RecordingEnvironment {
    fn dispatch<'a>(&'a self, dispatch: Dispatch) -> EnvFuture<'a, ()> {
        self.dispatched.lock().unwrap().push(dispatch);
        Box::pin(async {})
    }

    fn speak<'a>(&'a self, mut chunks: mpsc::Receiver<String>) -> EnvFuture<'a, ()> {
        Box::pin(async move {
            let mut text = String::new();
            while let Some(chunk) = chunks.recv().await {
                text.push_str(&chunk);
            }
            self.spoken.lock().unwrap().push(text);
        })
    }

    fn next_perception<'a>(&'a self) -> EnvFuture<'a, Option<Perception>> {
        let next = self.queue.lock().unwrap().pop_front();
        Box::pin(async move { next })
    }
}

/// Store wrapper counting `set` calls.
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryStore,
    sets: AtomicUsize,
}

impl CountingStore {
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        Self {
            inner: InMemoryStore::with_entries(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            ),
            sets: AtomicUsize::new(0),
        }
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

impl TakeawayStore for CountingStore {
    fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        self.inner.fetch(key)
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }
}

// ── Perception builders ────────────────────────────────────────────

pub fn start() -> Perception {
    Perception::new("start")
}

pub fn listed(cwd: &str, names: &[(&str, bool)]) -> Perception {
    let mut list: Vec<DirectoryEntry> = names
        .iter()
        .map(|(name, is_dir)| {
            if *is_dir {
                DirectoryEntry::directory(*name)
            } else {
                DirectoryEntry::file(*name)
            }
        })
        .collect();
    list.push(DirectoryEntry::directory(".."));
    Perception::listed(cwd, list)
}

pub fn read_file(cwd: &str, file_name: &str, text: &str) -> Perception {
    Perception::new(actions::READ_FILE)
        .with_content(text)
        .with_metadata(PerceptionMetadata {
            cwd: Some(cwd.into()),
            file_name: Some(file_name.into()),
            large_chunk: Some(text.into()),
            screen: Some(format!("0 : {}", text.lines().next().unwrap_or(""))),
            ..Default::default()
        })
}

pub fn edited(cwd: &str, file_name: &str, ok: bool) -> Perception {
    let action = if ok {
        actions::EDITED
    } else {
        actions::FAILED_TO_EDIT
    };
    Perception::new(action).with_metadata(PerceptionMetadata {
        cwd: Some(cwd.into()),
        file_name: Some(file_name.into()),
        screen: Some("0 : edited".into()),
        error: (!ok).then(|| "permission denied".to_string()),
        ..Default::default()
    })
}

pub fn page(cwd: &str, file_name: &str, screen: &str) -> Perception {
    Perception::new(actions::PAGE).with_metadata(PerceptionMetadata {
        cwd: Some(cwd.into()),
        file_name: Some(file_name.into()),
        screen: Some(screen.into()),
        ..Default::default()
    })
}
