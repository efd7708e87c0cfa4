//! Help and command palette.

use crate::context::{CommandContext, CommandResult};
use crate::parser::{ArgMap, ArgValue};
use crate::registry::{Command, CommandOutcome};

/// Palette entries listed by `commands`.
const PALETTE_LIMIT: usize = 10;

pub(super) fn commands() -> Vec<Command> {
    vec![
        Command::new("help", help)
            .with_alias("?")
            .with_description("Show help for all commands or one command")
            .with_example("help")
            .with_example("help delete"),
        Command::new("commands", palette)
            .with_alias("palette")
            .with_description("Search commands by name, alias or description")
            .with_example("commands node"),
    ]
}

fn help(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let topic = args.positional(0).map(ArgValue::to_string);
    match context.registry.help(topic.as_deref()) {
        Some(text) => Ok(CommandResult::ok(text)),
        None => Ok(CommandResult::failure(format!(
            "Unknown command: {}",
            topic.unwrap_or_default()
        ))),
    }
}

fn palette(context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
    let query = args
        .positionals()
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let hits = context.registry.search(&query);
    if hits.is_empty() {
        return Ok(CommandResult::ok(format!("No commands match \"{query}\"")));
    }

    let lines: Vec<String> = hits
        .iter()
        .take(PALETTE_LIMIT)
        .map(|command| {
            if command.description.is_empty() {
                command.name.clone()
            } else {
                format!("{} - {}", command.name, command.description)
            }
        })
        .collect();
    Ok(CommandResult::ok(lines.join("\n")))
}
