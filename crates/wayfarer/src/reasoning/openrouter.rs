//! [`Reasoning`] backed by the OpenRouter chat API.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::error::ReasoningError;
use crate::llm::{ChatRequest, Message, OpenRouterClient};
use crate::memory::{Role, WorkingMemory};
use crate::reasoning::{RawToolChoice, Reasoning, ReasoningFuture, SpeechStream};
use crate::tools::ToolRegistry;

/// Tool name reported when the model answers without calling a tool.
pub const NO_TOOL: &str = "none";

/// Reasoning steps implemented as chat completions over the working memory.
pub struct OpenRouterReasoning {
    client: Arc<OpenRouterClient>,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    streaming: bool,
    notes: Mutex<String>,
}

impl OpenRouterReasoning {
    pub fn new(client: OpenRouterClient, config: &AgentConfig) -> Self {
        Self {
            client: Arc::new(client),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            streaming: config.streaming,
            notes: Mutex::new(String::new()),
        }
    }

    /// Current auxiliary notes maintained by [`Reasoning::update_notes`].
    pub async fn notes(&self) -> String {
        self.notes.lock().await.clone()
    }

    async fn request(&self, memory: &WorkingMemory, prompt: String) -> ChatRequest {
        let mut messages = Vec::with_capacity(memory.len() + 2);
        messages.extend(memory.entries().iter().map(|e| match e.role {
            Role::System => Message::system(e.content.clone()),
            Role::User => Message::user(e.content.clone()),
            Role::Assistant => Message::assistant(e.content.clone()),
        }));
        let notes = self.notes.lock().await;
        if !notes.is_empty() {
            messages.push(Message::system(format!("## Notes\n{notes}")));
        }
        messages.push(Message::user(prompt));
        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            ..Default::default()
        }
    }

    async fn complete(
        &self,
        memory: &WorkingMemory,
        prompt: String,
        step: &'static str,
    ) -> Result<String, ReasoningError> {
        let body = self.request(memory, prompt).await;
        let completion = self.client.chat(&body).await?;
        completion
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(ReasoningError::EmptyResponse(step))
    }
}

impl Reasoning for OpenRouterReasoning {
    fn monologue<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        instructions: &'a str,
    ) -> ReasoningFuture<'a, (WorkingMemory, String)> {
        Box::pin(async move {
            let name = memory.agent_name();
            let prompt = format!(
                "Model the mind of {name}.\n\n\
                 ## Instructions\n{instructions}\n\n\
                 Reply with the next thought {name} has, in their own words, \
                 without quotes or preamble."
            );
            let thought = self.complete(memory, prompt, "monologue").await?;
            debug!("{name} thought: {thought}");
            let memory = memory.with_monologue(format!("{name} thought: \"{thought}\""));
            Ok((memory, thought))
        })
    }

    fn spoken_dialog<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        prompt: &'a str,
    ) -> ReasoningFuture<'a, (WorkingMemory, SpeechStream)> {
        Box::pin(async move {
            let name = memory.agent_name();
            let prompt = format!(
                "{prompt}\n\nReply with exactly what {name} says out loud, \
                 without quotes or stage directions."
            );

            if !self.streaming {
                let said = self.complete(memory, prompt, "spoken dialog").await?;
                let memory = memory.with_monologue(format!("{name} said: {said}"));
                return Ok((memory, SpeechStream::ready(said)));
            }

            let body = self.request(memory, prompt).await;
            let (sender, stream) = SpeechStream::channel();
            let client = Arc::clone(&self.client);
            tokio::spawn(async move {
                if let Err(e) = client.chat_stream_into(&body, sender).await {
                    warn!("Spoken dialog stream failed: {e}");
                }
            });
            // The spoken text lands in memory once the caller has resolved it.
            Ok((memory.clone(), stream))
        })
    }

    fn choose_tool<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        registry: &'a ToolRegistry,
    ) -> ReasoningFuture<'a, RawToolChoice> {
        Box::pin(async move {
            let name = memory.agent_name();
            let prompt = format!(
                "{name} decides what to do next. Call exactly one of the available tools."
            );
            let mut body = self.request(memory, prompt).await;
            body.tools = Some(registry.definitions());
            body.tool_choice = Some("required".into());

            let completion = self.client.chat(&body).await?;
            let (tool, arguments) = match completion.tool_calls.into_iter().next() {
                Some(call) => {
                    let arguments = call.function.parsed_arguments();
                    (call.function.name, arguments)
                }
                None => {
                    debug!("No tool call in response; treating as '{NO_TOOL}'");
                    (NO_TOOL.to_string(), serde_json::Value::Null)
                }
            };
            let memory = memory.with_monologue(format!(
                "{name} chose the tool: {tool} with the argument {arguments}"
            ));
            Ok(RawToolChoice {
                memory,
                name: tool,
                arguments,
            })
        })
    }

    fn update_notes<'a>(&'a self, memory: &'a WorkingMemory) -> ReasoningFuture<'a, WorkingMemory> {
        Box::pin(async move {
            let name = memory.agent_name();
            let existing = self.notes().await;
            let prompt = format!(
                "## Existing notes\n{existing}\n\n\
                 Update the notes {name} keeps while working: what they are looking for, \
                 what they found, and what they plan next. Use short bullet points. \
                 Reply with the notes only."
            );
            let updated = self.complete(memory, prompt, "notes").await?;
            *self.notes.lock().await = updated;
            Ok(memory.clone())
        })
    }

    fn instruction<'a>(
        &'a self,
        memory: &'a WorkingMemory,
        prompt: &'a str,
    ) -> ReasoningFuture<'a, (WorkingMemory, String)> {
        Box::pin(async move {
            let answer = self
                .complete(memory, prompt.to_string(), "instruction")
                .await?;
            Ok((memory.with_monologue(answer.clone()), answer))
        })
    }
}
