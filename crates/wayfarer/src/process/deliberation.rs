//! The think, speak, decide cycle shared by every state.
//!
//! 1. a private monologue on a state-specific question;
//! 2. spoken commentary, streamed to the environment while step 3 runs;
//! 3. note update and tool choice, run concurrently and both awaited;
//! 4. the spoken text is awaited;
//! 5. the outgoing memory is the incoming one plus what was said and what
//!    was decided.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ToolError, TransitionError};
use crate::events::AgentEvent;
use crate::memory::{MemoryEntry, WorkingMemory};
use crate::process::ProcessContext;
use crate::tools::ToolChoice;

/// Prompts for one deliberation.
pub struct Prompts<'a> {
    /// Question for the private monologue.
    pub question: &'a str,
    /// Instructions for the spoken commentary.
    pub speech: &'a str,
    /// What the agent was doing, quoted in the decision record.
    pub activity: &'a str,
}

/// Outcome of a deliberation.
#[derive(Debug)]
pub struct Deliberation<T> {
    /// Incoming memory plus the "said" and decision entries.
    pub memory: WorkingMemory,
    /// Memory as returned by the tool chooser.
    pub chooser_memory: WorkingMemory,
    /// `None` when the chooser named a tool outside the registry.
    pub choice: Option<T>,
    pub monologue: String,
    pub said: String,
}

pub async fn deliberate<T: ToolChoice>(
    ctx: &ProcessContext<'_>,
    state: &str,
    memory: &WorkingMemory,
    prompts: Prompts<'_>,
) -> Result<Deliberation<T>, TransitionError> {
    let reasoning = ctx.reasoning;
    let name = memory.agent_name();

    let (with_monologue, monologue) = reasoning.monologue(memory, prompts.question).await?;
    debug!("[{state}] monologue: {monologue}");

    let (with_dialog, speech) = reasoning
        .spoken_dialog(&with_monologue, prompts.speech)
        .await?;
    let (chunks, spoken) = speech.split();

    let registry = T::registry();
    let ((), notes, chosen) = tokio::join!(
        ctx.environment.speak(chunks),
        reasoning.update_notes(&with_dialog),
        reasoning.choose_tool(&with_dialog, &registry),
    );
    notes?;
    let raw = chosen?;
    let said = spoken.resolve().await?;

    ctx.events.on_event(&AgentEvent::ToolChosen {
        state,
        tool: &raw.name,
        arguments: &raw.arguments,
    });

    let choice = match registry.resolve::<T>(&raw.name, raw.arguments.clone()) {
        Ok(choice) => Some(choice),
        Err(ToolError::UnknownTool(tool)) => {
            warn!("[{state}] ignoring unknown tool '{tool}'");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let outgoing = memory.concat([
        MemoryEntry::assistant(format!("{name} said: {said}")),
        MemoryEntry::assistant(decision_record(
            name,
            prompts.activity,
            &monologue,
            &raw.name,
            &raw.arguments,
        )),
    ]);

    Ok(Deliberation {
        memory: outgoing,
        chooser_memory: raw.memory,
        choice,
        monologue,
        said,
    })
}

fn decision_record(name: &str, activity: &str, monologue: &str, tool: &str, arguments: &Value) -> String {
    let arguments = match arguments {
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    };
    format!(
        "After {activity} and thinking\n\
         > {monologue}\n\
         {name} decided to call the tool: {tool} with the argument {arguments}."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decision_record_quotes_monologue_and_arguments() {
        let record = decision_record(
            "Philip",
            "looking at the list of files",
            "src looks interesting",
            "cd",
            &json!({"directory": "src"}),
        );
        assert_eq!(
            record,
            "After looking at the list of files and thinking\n\
             > src looks interesting\n\
             Philip decided to call the tool: cd with the argument {\"directory\":\"src\"}."
        );
    }

    #[test]
    fn missing_arguments_render_as_empty_object() {
        let record = decision_record("Philip", "reading", "done", "exit", &Value::Null);
        assert!(record.ends_with("with the argument {}."));
    }
}
