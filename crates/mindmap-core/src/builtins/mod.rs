//! Built-in command set.
//!
//! [`builtin_commands`] builds every stock command; [`register_builtin_commands`] loads them
//! into a registry, skipping any that collide with commands already present.

use crate::context::{CommandContext, CommandError};
use crate::parser::ArgMap;
use crate::registry::{Command, CommandRegistry, RegistrationError};
use crate::validator::{ArgSpec, ArgType};
use tracing::{debug, warn};

mod clipboard;
mod editing;
mod general;
mod navigation;

/// Every built-in command, in registration order.
pub fn builtin_commands() -> Vec<Command> {
    let mut commands = navigation::commands();
    commands.extend(editing::commands());
    commands.extend(clipboard::commands());
    commands.extend(general::commands());
    commands
}

/// Register the built-in commands, returning the errors for those that were skipped.
///
/// # Example
///
/// ```rust
/// use mindmap_core::{CommandRegistry, register_builtin_commands};
///
/// let mut registry = CommandRegistry::new();
/// assert!(register_builtin_commands(&mut registry).is_empty());
/// assert_eq!(registry.get("j").map(|c| c.name.as_str()), Some("down"));
///
/// // Loading twice skips every command.
/// assert_eq!(register_builtin_commands(&mut registry).len(), registry.len());
/// ```
pub fn register_builtin_commands(registry: &mut CommandRegistry) -> Vec<RegistrationError> {
    let mut skipped = Vec::new();
    for command in builtin_commands() {
        let name = command.name.clone();
        if let Err(err) = registry.register(command) {
            warn!(command = %name, error = %err, "skipping built-in command");
            skipped.push(err);
        }
    }
    debug!(
        registered = registry.len(),
        skipped = skipped.len(),
        "loaded built-in commands"
    );
    skipped
}

/// The `nodeId` argument shared by most commands.
fn node_id_arg(description: &str) -> ArgSpec {
    ArgSpec::optional("nodeId", ArgType::NodeId).describe(description)
}

/// Summary of the node a command operates on.
#[derive(Debug, Clone)]
struct Target {
    id: String,
    text: String,
    child_count: usize,
    collapsed: bool,
    is_root: bool,
}

/// Resolve the node named by `key` (or the first positional, or the selection).
fn resolve_target(
    context: &CommandContext<'_>,
    args: &ArgMap,
    key: &str,
) -> Result<Target, CommandError> {
    let id = context.resolve_node_id(args, key)?;
    let node = context.node(&id)?;
    Ok(Target {
        text: node.text.clone(),
        child_count: node.children.len(),
        collapsed: node.collapsed,
        is_root: context.handlers.roots().iter().any(|root| root.id == id),
        id,
    })
}
