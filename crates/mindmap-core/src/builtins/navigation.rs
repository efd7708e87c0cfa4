//! Motion and selection commands.

use super::{node_id_arg, resolve_target};
use crate::context::{CommandContext, CommandError, CommandResult};
use crate::navigation::{Direction, navigate_with};
use crate::parser::ArgMap;
use crate::registry::{Command, CommandOutcome};
use crate::tree::NodeUpdate;
use crate::validator::{ArgSpec, ArgType};

pub(super) fn commands() -> Vec<Command> {
    vec![
        motion(Direction::Left, "h", "Select the parent node"),
        motion(Direction::Right, "l", "Select the closest child, expanding if collapsed"),
        motion(Direction::Up, "k", "Select the previous sibling"),
        motion(Direction::Down, "j", "Select the next sibling"),
        Command::new("select", select)
            .with_alias("sel")
            .with_description("Select a node by id")
            .in_category("navigation")
            .with_arg(node_id_arg("Node to select"))
            .with_example("select node-3"),
        Command::new("center", center)
            .with_alias("zz")
            .with_description("Center the view on a node")
            .in_category("view")
            .with_arg(node_id_arg("Node to center on (defaults to the selection)")),
    ]
}

fn motion(direction: Direction, alias: &str, description: &str) -> Command {
    Command::new(direction.as_str(), move |context, args| {
        run_motion(context, args, direction)
    })
    .with_alias(alias)
    .with_description(description)
    .in_category("navigation")
    .with_arg(
        ArgSpec::optional("count", ArgType::Number)
            .with_default(1i64)
            .describe("Number of steps"),
    )
    .with_example(format!("{direction} --count 3"))
    .with_example(format!("{alias} 3"))
}

fn run_motion(
    context: &mut CommandContext<'_>,
    args: &ArgMap,
    direction: Direction,
) -> CommandOutcome {
    let count = motion_count(args)?;
    let Some(current) = context.selected_node_id.clone() else {
        context.handlers.navigate_to_direction(direction)?;
        return Ok(CommandResult::ok_silent());
    };

    let current_text = context.node(&current)?.text.clone();
    let config = context.handlers.spatial_config();
    let Some(outcome) = navigate_with(context.handlers.roots(), &current, direction, count, &config)
    else {
        return Ok(CommandResult::ok(format!(
            "No node {} \"{current_text}\"",
            direction.relation()
        )));
    };

    for id in &outcome.expand {
        expand(context, id)?;
    }
    context.handlers.select_node(Some(&outcome.target))?;
    Ok(CommandResult::ok_silent())
}

/// Positional count wins over `--count`; fractional counts are truncated.
fn motion_count(args: &ArgMap) -> Result<usize, CommandError> {
    let value = match args.positional(0) {
        Some(value) => value.as_f64().ok_or_else(|| CommandError::InvalidArgument {
            name: "count".to_string(),
            reason: format!("expected a number, got '{value}'"),
        })?,
        None => args.get_f64("count").unwrap_or(1.0),
    };
    if !value.is_finite() || value < 0.0 {
        return Err(CommandError::InvalidArgument {
            name: "count".to_string(),
            reason: "must be a positive number".to_string(),
        });
    }
    Ok((value as usize).max(1))
}

fn expand(context: &mut CommandContext<'_>, id: &str) -> Result<(), CommandError> {
    match context.handlers.toggle_collapse(id) {
        Err(CommandError::Unsupported(_)) => context
            .handlers
            .update_node(id, NodeUpdate::collapsed(false)),
        other => other,
    }
}

fn select(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let target = resolve_target(context, args, "nodeId")?;
    context.handlers.select_node(Some(&target.id))?;
    Ok(CommandResult::ok(format!("Selected \"{}\"", target.text)))
}

fn center(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let target = resolve_target(context, args, "nodeId")?;
    context.handlers.center_on_node(&target.id)?;
    Ok(CommandResult::ok(format!("Centered on \"{}\"", target.text)))
}
