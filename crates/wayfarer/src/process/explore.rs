//! Explore: walk the directory tree and decide where to look next.

use futures::future::join_all;
use tracing::{debug, info};

use crate::error::TransitionError;
use crate::fs::{DirectoryEntry, join_path};
use crate::memory::WorkingMemory;
use crate::perception::{Dispatch, FileRef, Perceived, Perception};
use crate::process::deliberation::{Prompts, deliberate};
use crate::process::{Process, ProcessContext, Transition};
use crate::tools::ExploreTool;

pub async fn invoke(
    ctx: &mut ProcessContext<'_>,
    memory: WorkingMemory,
    perception: &Perception,
    invocation: usize,
) -> Result<Transition, TransitionError> {
    let name = memory.agent_name().to_string();

    // A vanished target restarts exploration from a fresh listing.
    if invocation == 0 || perception.decode() == Perceived::FileMissing {
        ctx.dispatch(Dispatch::ls()).await;
        let memory = memory.with_monologue(format!(
            "{name} lists the files in the current working directory."
        ));
        return Ok(Transition::stay(memory, Process::Explore));
    }

    let mut memory = ctx.compact(memory).await?;

    let mut cwd = perception.metadata().cwd.unwrap_or_default();
    if let Perceived::ListingReceived { cwd: listed, list } = perception.decode() {
        memory = recall_listing(ctx, memory, &listed, &list).await?;
        cwd = listed;
    }

    let question = format!("What does {name} want to do after seeing this list of files?");
    let speech =
        format!("{name} thinks out loud about what they are seeing, and what they are feeling.");
    let deliberation = deliberate::<ExploreTool>(
        ctx,
        Process::Explore.name(),
        &memory,
        Prompts {
            question: &question,
            speech: &speech,
            activity: "looking at the list of files",
        },
    )
    .await?;

    let Some(choice) = deliberation.choice else {
        return Ok(Transition::stay(deliberation.memory, Process::Explore));
    };
    match choice {
        ExploreTool::Cd(args) => {
            ctx.dispatch(Dispatch::cd(args.directory)).await;
            Ok(Transition::stay(deliberation.memory, Process::Explore))
        }
        ExploreTool::Ls => {
            ctx.dispatch(Dispatch::ls()).await;
            Ok(Transition::stay(deliberation.memory, Process::Explore))
        }
        ExploreTool::OpenInEditor(args) => {
            let file = FileRef {
                cwd,
                file_name: args.file.clone(),
            };
            ctx.dispatch(Dispatch::open_in_editor(args.file)).await;
            Ok(Transition::to(
                deliberation.chooser_memory,
                Process::ReadFile { file },
            ))
        }
        ExploreTool::FileATicket(ticket) => {
            ctx.dispatch(Dispatch::ticket(&ticket)).await;
            Ok(Transition::stay(deliberation.memory, Process::Explore))
        }
        ExploreTool::Stop => {
            ctx.dispatch(Dispatch::stop()).await;
            Ok(Transition::now(deliberation.memory, Process::Chat))
        }
    }
}

/// Look up takeaways for every listed entry and, when any exist, fold them
/// into memory and store a takeaway for the directory itself.
async fn recall_listing(
    ctx: &ProcessContext<'_>,
    memory: WorkingMemory,
    cwd: &str,
    list: &[DirectoryEntry],
) -> Result<WorkingMemory, TransitionError> {
    let keys: Vec<String> = list.iter().map(|e| join_path(cwd, &e.name)).collect();
    let fetched = join_all(keys.iter().map(|key| ctx.store.fetch(key))).await;

    let mut remembered = Vec::new();
    for (entry, result) in list.iter().zip(fetched) {
        if let Some(takeaway) = result? {
            remembered.push(render_takeaway(entry, &takeaway));
        }
    }
    debug!("Listing of '{cwd}': {} remembered entries", remembered.len());
    if remembered.is_empty() {
        return Ok(memory);
    }

    let name = memory.agent_name().to_string();
    let memory = memory.with_monologue(format!(
        "## {name} remembers looking at the following files/directories in the current working directory:\n{}",
        remembered.join("\n\n")
    ));
    let (_, takeaway) = ctx
        .reasoning
        .monologue(
            &memory,
            &format!(
                "Given what {name} remembers about the files in the directory, \
                 what is their 1-4 sentence takeaway on the directory itself?"
            ),
        )
        .await?;
    info!("Directory takeaway for '{cwd}': {takeaway}");
    ctx.store.set(cwd, &takeaway).await?;
    Ok(memory)
}

fn render_takeaway(entry: &DirectoryEntry, takeaway: &str) -> String {
    let tag = if entry.is_directory { "directory" } else { "file" };
    format!("<{tag} name='{}'>\n  {takeaway}\n</{tag}>", entry.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takeaway_tags_follow_entry_kind() {
        assert_eq!(
            render_takeaway(&DirectoryEntry::directory("src"), "code"),
            "<directory name='src'>\n  code\n</directory>"
        );
        assert_eq!(
            render_takeaway(&DirectoryEntry::file("a.rs"), "entry"),
            "<file name='a.rs'>\n  entry\n</file>"
        );
    }
}
