//! EditFile: write the replacement for a line range chosen while reading.

use tracing::info;

use crate::error::TransitionError;
use crate::memory::WorkingMemory;
use crate::perception::{Dispatch, EditParams, Perceived, Perception};
use crate::process::deliberation::{Prompts, deliberate};
use crate::process::{EditRequest, Process, ProcessContext, Transition};
use crate::tools::{EditArgs, EditFileTool};

pub async fn invoke(
    ctx: &mut ProcessContext<'_>,
    memory: WorkingMemory,
    perception: &Perception,
    request: EditRequest,
    invocation: usize,
) -> Result<Transition, TransitionError> {
    if perception.decode() == Perceived::FileMissing {
        return Ok(Transition::now(memory, Process::Explore));
    }

    let name = memory.agent_name().to_string();
    let path = request.file.path();

    let memory = if invocation == 0 {
        memory.with_monologue(edit_plan(&name, &path, &request))
    } else {
        ctx.compact(memory).await?
    };

    let question = format!(
        "What exactly should {name} write in place of lines {} to {}?",
        request.start, request.end
    );
    let speech = format!("{name} mutters about the change they are about to make.");
    let activity = format!("planning an edit to '{path}'");
    let deliberation = deliberate::<EditFileTool>(
        ctx,
        "edit_file",
        &memory,
        Prompts {
            question: &question,
            speech: &speech,
            activity: &activity,
        },
    )
    .await?;

    let back_to_reading = Process::ReadFile {
        file: request.file.clone(),
    };
    match deliberation.choice {
        None => Ok(Transition::stay(
            deliberation.memory,
            Process::EditFile(request),
        )),
        Some(EditFileTool::Edit(args)) => {
            let params = EditParams::new(
                &EditArgs {
                    start: request.start,
                    end: request.end,
                    commentary: request.commentary.clone(),
                },
                args.replacement,
            );
            info!("Submitting edit to {path} [{}, {})", params.start, params.end);
            ctx.dispatch(Dispatch::edit(&params)).await;
            Ok(Transition::to(deliberation.memory, back_to_reading))
        }
        Some(EditFileTool::Cancel) => {
            info!("Edit to {path} cancelled");
            Ok(Transition::to(deliberation.memory, back_to_reading))
        }
    }
}

fn edit_plan(name: &str, path: &str, request: &EditRequest) -> String {
    let mut plan = format!(
        "{name} decided to edit lines {} to {} of '{path}'.",
        request.start, request.end
    );
    if let Some(ref commentary) = request.commentary {
        plan.push_str(&format!("\nWhy: {commentary}"));
    }
    plan.push_str(&format!("\n\n## Editor Screen\n{}", request.screen));
    plan
}
