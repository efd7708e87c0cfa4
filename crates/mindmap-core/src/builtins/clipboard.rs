//! Clipboard and history commands.

use super::{node_id_arg, resolve_target};
use crate::context::{CommandContext, CommandResult};
use crate::parser::ArgMap;
use crate::registry::{Command, CommandOutcome};
use crate::validator::{ArgSpec, ArgType};

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new("copy", copy)
            .with_alias("yy")
            .with_description("Copy a node and its subtree")
            .in_category("clipboard")
            .with_arg(node_id_arg("Node to copy")),
        Command::new("paste", paste)
            .with_alias("p")
            .with_description("Paste the clipboard as a child")
            .in_category("clipboard")
            .with_arg(
                ArgSpec::optional("parentId", ArgType::NodeId)
                    .describe("Parent for the pasted subtree (defaults to the selection)"),
            ),
        Command::new("undo", |context, _| {
            context.handlers.undo()?;
            Ok(CommandResult::ok("Undone"))
        })
        .with_alias("u")
        .with_description("Undo the last change")
        .in_category("history"),
        Command::new("redo", |context, _| {
            context.handlers.redo()?;
            Ok(CommandResult::ok("Redone"))
        })
        .with_alias("U")
        .with_description("Redo the last undone change")
        .in_category("history"),
    ]
}

fn copy(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let target = resolve_target(context, args, "nodeId")?;
    context.handlers.copy_node(&target.id)?;
    Ok(CommandResult::ok(format!("Copied \"{}\"", target.text)))
}

fn paste(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let parent = resolve_target(context, args, "parentId")?;
    context.handlers.paste_node(&parent.id)?;
    Ok(CommandResult::ok(format!("Pasted into \"{}\"", parent.text)))
}
