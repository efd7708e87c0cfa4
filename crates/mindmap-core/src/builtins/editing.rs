//! Structural and text editing commands.

use super::{node_id_arg, resolve_target};
use crate::context::{CommandContext, CommandError, CommandResult};
use crate::parser::ArgMap;
use crate::registry::{Command, CommandOutcome};
use crate::tree::{DropPosition, NodeUpdate};
use crate::validator::{ArgSpec, ArgType};

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new("delete", delete)
            .with_alias("dd")
            .with_alias("del")
            .with_description("Delete a node and its subtree")
            .in_category("editing")
            .with_arg(node_id_arg("Node to delete"))
            .with_arg(
                ArgSpec::optional("confirm", ArgType::Boolean)
                    .with_default(false)
                    .describe("Required to delete a node with children"),
            )
            .with_example("delete --confirm"),
        Command::new("toggle", toggle)
            .with_alias("za")
            .with_description("Collapse or expand a node")
            .in_category("editing")
            .with_arg(node_id_arg("Node to toggle")),
        Command::new("add-child", |context, args| add(context, args, Placement::Child))
            .with_alias("a")
            .with_alias("child")
            .with_description("Add a child node")
            .in_category("editing")
            .with_arg(node_id_arg("Parent node"))
            .with_arg(ArgSpec::optional("text", ArgType::String).describe("Initial text"))
            .with_arg(edit_arg())
            .with_example("add-child --text 'New idea'"),
        Command::new("add-sibling", |context, args| add(context, args, Placement::Sibling))
            .with_alias("o")
            .with_alias("sibling")
            .with_description("Add a sibling after a node")
            .in_category("editing")
            .with_arg(node_id_arg("Node to add after"))
            .with_arg(ArgSpec::optional("text", ArgType::String).describe("Initial text"))
            .with_arg(edit_arg()),
        Command::new("edit", |context, args| start_edit(context, args, Cursor::Start))
            .with_alias("i")
            .with_description("Edit a node's text with the cursor at the start")
            .in_category("editing")
            .with_arg(node_id_arg("Node to edit")),
        Command::new("append", |context, args| start_edit(context, args, Cursor::End))
            .with_alias("A")
            .with_description("Edit a node's text with the cursor at the end")
            .in_category("editing")
            .with_arg(node_id_arg("Node to edit")),
        Command::new("rename", rename)
            .with_alias("cw")
            .with_description("Replace a node's text")
            .in_category("editing")
            .with_arg(ArgSpec::required("text", ArgType::String).describe("New text"))
            .with_arg(node_id_arg("Node to rename"))
            .with_example("rename --text 'Better title'"),
        Command::new("note", note)
            .with_description("Set or clear a node's note")
            .in_category("editing")
            .with_arg(ArgSpec::required("text", ArgType::String).describe("Note text, '' clears"))
            .with_arg(node_id_arg("Node to annotate")),
        Command::new("move", move_node)
            .with_alias("mv")
            .with_description("Move a node relative to another node")
            .in_category("editing")
            .with_arg(node_id_arg("Node to move"))
            .with_arg(ArgSpec::required("target", ArgType::NodeId).describe("Drop target"))
            .with_arg(
                ArgSpec::optional("position", ArgType::String)
                    .with_default("child")
                    .describe("before, after or child"),
            )
            .with_example("move --target node-2 --position after"),
    ]
}

fn edit_arg() -> ArgSpec {
    ArgSpec::optional("edit", ArgType::Boolean)
        .with_default(true)
        .describe("Start editing the new node")
}

fn delete(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let target = resolve_target(context, args, "nodeId")?;
    if target.is_root {
        return Ok(CommandResult::failure(format!(
            "Cannot delete root node \"{}\"",
            target.text
        )));
    }
    if target.child_count > 0 && !args.get_bool("confirm").unwrap_or(false) {
        return Ok(CommandResult::failure(format!(
            "Node \"{}\" has {} children; use --confirm to delete it",
            target.text, target.child_count
        )));
    }

    context.handlers.delete_node(&target.id)?;
    Ok(CommandResult::ok(format!("Deleted node \"{}\"", target.text)))
}

fn toggle(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let target = resolve_target(context, args, "nodeId")?;
    if target.child_count == 0 {
        return Ok(CommandResult::failure(format!(
            "Node \"{}\" has no children to toggle",
            target.text
        )));
    }

    let collapsed = !target.collapsed;
    match context.handlers.toggle_collapse(&target.id) {
        Err(CommandError::Unsupported(_)) => context
            .handlers
            .update_node(&target.id, NodeUpdate::collapsed(collapsed))?,
        other => other?,
    }
    let verb = if collapsed { "Collapsed" } else { "Expanded" };
    Ok(CommandResult::ok(format!("{verb} \"{}\"", target.text)))
}

#[derive(Debug, Clone, Copy)]
enum Placement {
    Child,
    Sibling,
}

fn add(context: &mut CommandContext<'_>, args: &ArgMap, placement: Placement) -> CommandOutcome {
    let anchor = resolve_target(context, args, "nodeId")?;
    let text = args.get_str("text");
    let start_editing = args.get_bool("edit").unwrap_or(true);

    let created = match placement {
        Placement::Child => context
            .handlers
            .add_child_node(&anchor.id, text, start_editing)?,
        Placement::Sibling => context
            .handlers
            .add_sibling_node(&anchor.id, text, start_editing)?,
    };
    let Some(id) = created else {
        return Ok(CommandResult::failure(format!(
            "Could not add a node next to \"{}\"",
            anchor.text
        )));
    };
    let relation = match placement {
        Placement::Child => "child of",
        Placement::Sibling => "sibling of",
    };
    Ok(CommandResult::ok(format!(
        "Added {id} as {relation} \"{}\"",
        anchor.text
    )))
}

#[derive(Debug, Clone, Copy)]
enum Cursor {
    Start,
    End,
}

fn start_edit(context: &mut CommandContext<'_>, args: &ArgMap, cursor: Cursor) -> CommandOutcome {
    let target = resolve_target(context, args, "nodeId")?;
    match cursor {
        Cursor::Start => context.handlers.start_edit_with_cursor_at_start(&target.id)?,
        Cursor::End => context.handlers.start_edit_with_cursor_at_end(&target.id)?,
    }
    Ok(CommandResult::ok_silent())
}

fn rename(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let text = required_text(args)?;
    let target = resolve_target(context, args, "nodeId")?;
    context
        .handlers
        .update_node(&target.id, NodeUpdate::text(text.clone()))?;
    Ok(CommandResult::ok(format!(
        "Renamed \"{}\" to \"{text}\"",
        target.text
    )))
}

fn note(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let text = required_text(args)?;
    let target = resolve_target(context, args, "nodeId")?;
    let cleared = text.trim().is_empty();
    let note = (!cleared).then_some(text);
    context
        .handlers
        .update_node(&target.id, NodeUpdate::note(note))?;
    let message = if cleared {
        format!("Cleared note on \"{}\"", target.text)
    } else {
        format!("Updated note on \"{}\"", target.text)
    };
    Ok(CommandResult::ok(message))
}

fn required_text(args: &ArgMap) -> Result<String, CommandError> {
    args.get_str("text")
        .map(str::to_string)
        .ok_or_else(|| CommandError::InvalidArgument {
            name: "text".to_string(),
            reason: "expected a string".to_string(),
        })
}

fn move_node(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let node = resolve_target(context, args, "nodeId")?;
    let target_id = args
        .get_node_id("target")
        .ok_or_else(|| CommandError::InvalidArgument {
            name: "target".to_string(),
            reason: "expected a node id".to_string(),
        })?;
    let target = context.node(target_id)?.text.clone();
    let position: DropPosition = args
        .get_str("position")
        .unwrap_or("child")
        .parse()
        .map_err(|err: crate::tree::TreeError| CommandError::InvalidArgument {
            name: "position".to_string(),
            reason: err.to_string(),
        })?;

    if node.id == target_id {
        return Ok(CommandResult::failure(format!(
            "Cannot move \"{}\" relative to itself",
            node.text
        )));
    }
    context.handlers.move_node(&node.id, target_id, position)?;
    let relation = match position {
        DropPosition::Before => "before",
        DropPosition::After => "after",
        DropPosition::Child => "under",
    };
    Ok(CommandResult::ok(format!(
        "Moved \"{}\" {relation} \"{target}\"",
        node.text
    )))
}
