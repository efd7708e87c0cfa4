//! Command-line execution.
//!
//! [`execute_line`] runs the full pipeline for a typed line: parse, resolve against the
//! registry, validate, execute. Every failure along the way becomes a failed
//! [`CommandResult`]; nothing here panics or returns `Err`.

use crate::context::{CommandContext, CommandResult, EditorHandlers};
use crate::parser::{ParsedCommand, parse_command};
use crate::registry::CommandRegistry;
use crate::validator::validate;
use tracing::{debug, warn};

/// Parse and execute one command line.
///
/// # Example
///
/// ```rust
/// use mindmap_core::{CommandRegistry, EditorSession, Node, execute_line, register_builtin_commands};
///
/// let mut registry = CommandRegistry::new();
/// register_builtin_commands(&mut registry);
/// let mut session = EditorSession::new(vec![Node::new("root", "Root")]).unwrap();
///
/// let result = execute_line(&registry, &mut session, "add-child root --text Idea --edit false");
/// assert!(result.success);
/// assert_eq!(session.map().len(), 2);
///
/// let result = execute_line(&registry, &mut session, "frobnicate");
/// assert_eq!(result.error.as_deref(), Some("Unknown command: frobnicate"));
/// ```
pub fn execute_line(
    registry: &CommandRegistry,
    handlers: &mut dyn EditorHandlers,
    input: &str,
) -> CommandResult {
    match parse_command(input) {
        Ok(parsed) => execute_parsed(registry, handlers, &parsed),
        Err(err) => {
            debug!(input, error = %err, "command line rejected");
            CommandResult::failure(err.to_string())
        }
    }
}

/// Execute an already-parsed command.
///
/// Used directly by UI code that builds commands from events rather than text.
pub fn execute_parsed(
    registry: &CommandRegistry,
    handlers: &mut dyn EditorHandlers,
    parsed: &ParsedCommand,
) -> CommandResult {
    let Some(command) = registry.get(&parsed.name) else {
        debug!(command = %parsed.name, "unknown command");
        return unknown_command(registry, &parsed.name);
    };

    let validated = match validate(parsed, &command.args) {
        Ok(validated) => validated,
        Err(err) => {
            debug!(command = %command.name, error = %err, "validation failed");
            return CommandResult::failure(err.to_string());
        }
    };

    let mut context = CommandContext::new(registry, handlers);
    debug!(
        command = %command.name,
        mode = %context.mode,
        selected = ?context.selected_node_id,
        "executing command"
    );
    match command.execute(&mut context, &validated.args) {
        Ok(result) => result,
        Err(err) => {
            warn!(command = %command.name, error = %err, "command failed");
            err.into()
        }
    }
}

fn unknown_command(registry: &CommandRegistry, name: &str) -> CommandResult {
    let mut error = format!("Unknown command: {name}");
    if let Some(best) = registry.search(name).first() {
        error.push_str(&format!(" (did you mean '{}'?)", best.name));
    }
    CommandResult::failure(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CommandError;
    use crate::registry::Command;
    use crate::tree::Node;
    use crate::validator::{ArgSpec, ArgType};

    struct Host {
        roots: Vec<Node>,
        selected: Option<String>,
    }

    impl EditorHandlers for Host {
        fn roots(&self) -> &[Node] {
            &self.roots
        }

        fn selected_node_id(&self) -> Option<String> {
            self.selected.clone()
        }
    }

    fn host() -> Host {
        Host {
            roots: vec![Node::new("root", "Root")],
            selected: Some("root".to_string()),
        }
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                Command::new("echo", |_, args| {
                    Ok(CommandResult::ok(args.get_str("text").unwrap_or_default()))
                })
                .with_arg(ArgSpec::required("text", ArgType::String)),
            )
            .unwrap();
        registry
            .register(Command::new("whoami", |ctx, args| {
                let id = ctx.resolve_node_id(args, "nodeId")?;
                Ok(CommandResult::ok(ctx.node(&id)?.text.clone()))
            }))
            .unwrap();
        registry
            .register(Command::new("center", |ctx, _| {
                ctx.handlers.center_on_node("root")?;
                Ok(CommandResult::ok_silent())
            }))
            .unwrap();
        registry
    }

    #[test]
    fn test_successful_execution() {
        let result = execute_line(&registry(), &mut host(), "echo --text 'hi there'");
        assert_eq!(result, CommandResult::ok("hi there"));
    }

    #[test]
    fn test_parse_failures_become_results() {
        let result = execute_line(&registry(), &mut host(), "");
        assert_eq!(result.error.as_deref(), Some("No command provided"));
        let result = execute_line(&registry(), &mut host(), "echo --text 'open");
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Unclosed quote"));
    }

    #[test]
    fn test_validation_failure_does_not_execute() {
        let result = execute_line(&registry(), &mut host(), "echo");
        assert_eq!(
            result.error.as_deref(),
            Some("Required argument 'text' is missing")
        );
    }

    #[test]
    fn test_unknown_command_suggests() {
        let result = execute_line(&registry(), &mut host(), "who");
        assert_eq!(
            result.error.as_deref(),
            Some("Unknown command: who (did you mean 'whoami'?)")
        );
        let result = execute_line(&registry(), &mut host(), "zzz");
        assert_eq!(result.error.as_deref(), Some("Unknown command: zzz"));
    }

    #[test]
    fn test_command_errors_become_failures() {
        let registry = registry();
        let mut host = host();
        assert_eq!(execute_line(&registry, &mut host, "whoami").message.as_deref(), Some("Root"));

        let result = execute_line(&registry, &mut host, "whoami missing");
        assert_eq!(result, CommandError::NodeNotFound("missing".into()).into());

        host.selected = None;
        let result = execute_line(&registry, &mut host, "whoami");
        assert_eq!(result.error.as_deref(), Some("No node selected"));

        let result = execute_line(&registry, &mut host, "center");
        assert_eq!(
            result.error.as_deref(),
            Some("Handler 'centerOnNode' is not available")
        );
    }
}
