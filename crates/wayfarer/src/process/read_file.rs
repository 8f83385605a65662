//! ReadFile: page through an open file, edit it, or leave it.

use tracing::{debug, info};

use crate::error::TransitionError;
use crate::memory::WorkingMemory;
use crate::perception::{Dispatch, FileRef, Perceived, Perception};
use crate::process::deliberation::{Prompts, deliberate};
use crate::process::{EditRequest, Process, ProcessContext, Transition};
use crate::tools::ReadFileTool;

pub async fn invoke(
    ctx: &mut ProcessContext<'_>,
    memory: WorkingMemory,
    perception: &Perception,
    file: FileRef,
) -> Result<Transition, TransitionError> {
    let perceived = perception.decode();
    if perceived == Perceived::FileMissing {
        info!("File '{}' is missing, back to exploring", file.path());
        return Ok(Transition::now(memory, Process::Explore));
    }

    let name = memory.agent_name().to_string();
    let file = match &perceived {
        Perceived::FileOpened { file: reported, .. }
        | Perceived::EditResult { file: reported, .. }
        | Perceived::ScreenUpdated { file: reported, .. }
            if !reported.file_name.is_empty() =>
        {
            reported.clone()
        }
        _ => file,
    };
    let path = file.path();

    // Raw file content is dropped before compaction; only the first
    // impression stays in memory.
    let memory = match perceived {
        Perceived::FileOpened { .. } => memory.without_last(),
        _ => memory,
    };
    let mut memory = ctx.compact(memory).await?;
    let mut screen = None;

    match perceived {
        Perceived::FileOpened {
            content,
            screen: opened_screen,
            ..
        } => {
            let prompt = format!(
                "{name} just opened the file.\n\n\
                 ## File '{path}' (max first {} lines)\n{content}\n\n\
                 Please return a 1-3 sentence version of what {name} would notice first \
                 about the file when skimming it.",
                ctx.config.first_chunk_lines
            );
            let (_, impression) = ctx.reasoning.instruction(&memory, &prompt).await?;
            memory = memory.with_monologue(format!(
                "{name} just opened the file '{path}' in their editor.\n\n\
                 Here's what they noticed first about the file:\n{impression}"
            ));
            screen = Some(opened_screen).filter(|s| !s.is_empty());
        }
        Perceived::EditResult {
            ok,
            screen: edited_screen,
            error,
            ..
        } => {
            if !ok {
                let prompt = format!(
                    "The edit failed: {}\n\n\
                     Please write a 1-3 sentence description of what {name} would do to get \
                     around this error. Sometimes {name} would prefer to just file a ticket, \
                     sometimes they'd like to make a smaller change, or maybe just fix what \
                     they wrote.",
                    error.as_deref().unwrap_or("unknown error")
                );
                let (with_fix, fix) = ctx.reasoning.instruction(&memory, &prompt).await?;
                debug!("Potential fix: {fix}");
                memory = with_fix;
            }
            memory = ctx.compact(memory).await?;
            screen = edited_screen;
        }
        Perceived::ScreenUpdated {
            screen: updated, ..
        } => screen = Some(updated),
        Perceived::FileMissing | Perceived::ListingReceived { .. } | Perceived::Other => {}
    }

    if let Some(ref screen) = screen {
        memory = memory.with_monologue(format!(
            "{name} has '{path}' open in their editor.\n\n## Editor Screen\n{screen}"
        ));
    }

    let question = format!("What does {name} want to do?");
    let speech = format!(
        "{name} thinks out loud (under their breath) about what they are reading \
         and how they feel about it."
    );
    let activity = format!("reading '{path}'");
    let deliberation = deliberate::<ReadFileTool>(
        ctx,
        "read_file",
        &memory,
        Prompts {
            question: &question,
            speech: &speech,
            activity: &activity,
        },
    )
    .await?;

    let memory = deliberation.memory;
    let Some(choice) = deliberation.choice else {
        return Ok(Transition::stay(memory, Process::ReadFile { file }));
    };
    match choice {
        ReadFileTool::Edit(args) => {
            info!("Editing {path} [{}, {})", args.start, args.end);
            let request = EditRequest {
                file,
                start: args.start,
                end: args.end,
                commentary: args.commentary,
                screen: screen.unwrap_or_default(),
            };
            Ok(Transition::now(memory, Process::EditFile(request)))
        }
        ReadFileTool::PageUp => {
            ctx.dispatch(Dispatch::page_up()).await;
            Ok(Transition::stay(memory, Process::ReadFile { file }))
        }
        ReadFileTool::PageDown => {
            ctx.dispatch(Dispatch::page_down()).await;
            Ok(Transition::stay(memory, Process::ReadFile { file }))
        }
        ReadFileTool::Exit => {
            let prompt = format!(
                "{name} just decided to stop reading the file: {path}.\n\n\
                 Write a 2-4 sentence takeaway on what {name} learned from the file, related \
                 to their goal. Especially keep details they would want to remember when \
                 scanning the file system again."
            );
            let (_, takeaway) = ctx.reasoning.instruction(&memory, &prompt).await?;
            info!("Takeaway for '{path}': {takeaway}");
            ctx.store.set(&path, &takeaway).await?;
            ctx.dispatch(Dispatch::exit()).await;
            Ok(Transition::now(memory, Process::Explore))
        }
        ReadFileTool::FileATicket(ticket) => {
            ctx.dispatch(Dispatch::ticket(&ticket)).await;
            Ok(Transition::stay(memory, Process::ReadFile { file }))
        }
    }
}
