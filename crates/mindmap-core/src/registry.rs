//! Command registry.
//!
//! Stores [`Command`] definitions by name, resolves aliases, ranks commands for a palette
//! query, completes partially typed names, and renders help text.
//!
//! The registry is an ordinary value: construct one at startup, load commands into it, and
//! pass it by reference to the interpreter and the dispatcher.
//!
//! # Example
//!
//! ```rust
//! use mindmap_core::{Command, CommandRegistry, CommandResult};
//!
//! let mut registry = CommandRegistry::new();
//! registry
//!     .register(
//!         Command::new("center", |_, _| Ok(CommandResult::ok("centered")))
//!             .with_alias("zz")
//!             .with_description("Center the view on a node")
//!             .in_category("view"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(registry.get("zz").map(|c| c.name.as_str()), Some("center"));
//! assert_eq!(registry.search("cen")[0].name, "center");
//! ```

use crate::context::{CommandContext, CommandError, CommandResult};
use crate::parser::ArgMap;
use crate::validator::ArgSpec;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;
use unicode_width::UnicodeWidthStr;

/// Category used for commands that do not declare one.
pub const DEFAULT_CATEGORY: &str = "general";

/// What a command executor returns. `Err` values are converted into failed results by the
/// interpreter.
pub type CommandOutcome = Result<CommandResult, CommandError>;

type Executor = dyn Fn(&mut CommandContext<'_>, &ArgMap) -> CommandOutcome;

/// A named, aliasable operation with an argument schema.
pub struct Command {
    /// Unique name.
    pub name: String,
    /// Alternative names, unique across the registry.
    pub aliases: Vec<String>,
    /// One-line description.
    pub description: String,
    /// Help grouping; [`DEFAULT_CATEGORY`] when `None`.
    pub category: Option<String>,
    /// Declared arguments, in help order.
    pub args: Vec<ArgSpec>,
    /// Example invocations shown in help.
    pub examples: Vec<String>,
    execute: Box<Executor>,
}

impl Command {
    /// Create a command with no aliases, arguments or metadata.
    pub fn new<F>(name: impl Into<String>, execute: F) -> Self
    where
        F: Fn(&mut CommandContext<'_>, &ArgMap) -> CommandOutcome + 'static,
    {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            category: None,
            args: Vec::new(),
            examples: Vec::new(),
            execute: Box::new(execute),
        }
    }

    /// Add an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the help category.
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Declare an argument.
    pub fn with_arg(mut self, spec: ArgSpec) -> Self {
        self.args.push(spec);
        self
    }

    /// Add a help example.
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Effective category name.
    pub fn category_name(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    /// Run the executor with already-validated arguments.
    pub fn execute(&self, context: &mut CommandContext<'_>, args: &ArgMap) -> CommandOutcome {
        (self.execute)(context, args)
    }

    fn label(&self) -> String {
        if self.aliases.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.aliases.join(", "))
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("category", &self.category_name())
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Registration failures. Nothing is inserted when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The command name is empty.
    #[error("Command name must not be empty")]
    EmptyName,
    /// A command with this name already exists.
    #[error("Command '{0}' is already registered")]
    DuplicateName(String),
    /// The command's name is already used as an alias of another command.
    #[error("Command name '{name}' is already an alias of '{existing}'")]
    NameTakenByAlias {
        /// Rejected command name.
        name: String,
        /// Command owning the alias.
        existing: String,
    },
    /// One of the aliases is already a command name or alias.
    #[error("Alias '{alias}' of '{command}' conflicts with '{existing}'")]
    AliasConflict {
        /// Conflicting alias.
        alias: String,
        /// Command being registered.
        command: String,
        /// Command already using the name.
        existing: String,
    },
}

/// Lookup, search and help over a set of commands.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
    aliases: BTreeMap<String, String>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// All commands, ordered by name.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Register a command and its aliases atomically.
    pub fn register(&mut self, command: Command) -> Result<(), RegistrationError> {
        if command.name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if self.commands.contains_key(&command.name) {
            return Err(RegistrationError::DuplicateName(command.name));
        }
        if let Some(existing) = self.aliases.get(&command.name) {
            return Err(RegistrationError::NameTakenByAlias {
                name: command.name.clone(),
                existing: existing.clone(),
            });
        }

        for (index, alias) in command.aliases.iter().enumerate() {
            let existing = if self.commands.contains_key(alias) {
                Some(alias.clone())
            } else if let Some(owner) = self.aliases.get(alias) {
                Some(owner.clone())
            } else if *alias == command.name || command.aliases[..index].contains(alias) {
                Some(command.name.clone())
            } else {
                None
            };
            if let Some(existing) = existing {
                return Err(RegistrationError::AliasConflict {
                    alias: alias.clone(),
                    command: command.name.clone(),
                    existing,
                });
            }
        }

        debug!(command = %command.name, aliases = ?command.aliases, "registered command");
        for alias in &command.aliases {
            self.aliases.insert(alias.clone(), command.name.clone());
        }
        self.commands.insert(command.name.clone(), command);
        Ok(())
    }

    /// Remove a command and its aliases. Returns the removed command, if any.
    pub fn unregister(&mut self, name: &str) -> Option<Command> {
        let command = self.commands.remove(name)?;
        for alias in &command.aliases {
            self.aliases.remove(alias);
        }
        debug!(command = %name, "unregistered command");
        Some(command)
    }

    /// Resolve a name, then an alias.
    pub fn get(&self, name_or_alias: &str) -> Option<&Command> {
        self.commands.get(name_or_alias).or_else(|| {
            self.aliases
                .get(name_or_alias)
                .and_then(|name| self.commands.get(name))
        })
    }

    /// Returns `true` if `name_or_alias` resolves.
    pub fn contains(&self, name_or_alias: &str) -> bool {
        self.get(name_or_alias).is_some()
    }

    /// Commands matching `query`, best first. An empty query returns every command.
    pub fn search(&self, query: &str) -> Vec<&Command> {
        self.search_scored(query)
            .into_iter()
            .map(|(command, _)| command)
            .collect()
    }

    /// [`search`](Self::search) with the score of each hit.
    ///
    /// Scores add up across fields: name (exact 100, prefix 80, substring 60), best alias
    /// (exact 90, prefix 70, substring 50), description substring 30, category substring 20.
    /// Matching is case-insensitive; ties are ordered by name.
    pub fn search_scored(&self, query: &str) -> Vec<(&Command, u32)> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.commands.values().map(|command| (command, 0)).collect();
        }

        let mut hits: Vec<(&Command, u32)> = self
            .commands
            .values()
            .map(|command| (command, score_command(command, &query)))
            .filter(|(_, score)| *score > 0)
            .collect();
        // Stable sort keeps name order among equal scores.
        hits.sort_by(|a, b| b.1.cmp(&a.1));
        hits
    }

    /// Complete the command word of a partially typed line.
    ///
    /// Returns the longest common extension of matching names and aliases, with a trailing
    /// space when it is unique, or `None` when no progress is possible.
    pub fn complete(&self, input: &str) -> Option<String> {
        let current = input.trim_start();
        if current.is_empty() || current.contains(char::is_whitespace) {
            return None;
        }

        let mut candidates: Vec<&str> = self
            .commands
            .keys()
            .chain(self.aliases.keys())
            .map(String::as_str)
            .filter(|name| name.starts_with(current))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let common = longest_common_prefix(&candidates)?;
        if common == current {
            return None;
        }
        if candidates.len() == 1 {
            Some(format!("{common} "))
        } else {
            Some(common)
        }
    }

    /// Help text for one command, or the full listing when `name_or_alias` is `None`.
    ///
    /// Unknown names yield `None`.
    pub fn help(&self, name_or_alias: Option<&str>) -> Option<String> {
        match name_or_alias {
            Some(name) => self.get(name).map(render_command_help),
            None => Some(self.render_listing()),
        }
    }

    fn render_listing(&self) -> String {
        let mut by_category: BTreeMap<&str, Vec<&Command>> = BTreeMap::new();
        for command in self.commands.values() {
            by_category
                .entry(command.category_name())
                .or_default()
                .push(command);
        }

        let labels: BTreeMap<&str, String> = self
            .commands
            .values()
            .map(|command| (command.name.as_str(), command.label()))
            .collect();
        let column = labels.values().map(|label| label.width()).max().unwrap_or(0) + 2;

        let mut out = String::from("Available commands:\n");
        for (category, commands) in &by_category {
            out.push('\n');
            out.push_str(category);
            out.push_str(":\n");
            // Already name-ordered: BTreeMap iteration.
            for command in commands {
                let label = &labels[command.name.as_str()];
                out.push_str("  ");
                out.push_str(label);
                if !command.description.is_empty() {
                    out.push_str(&" ".repeat(column - label.width()));
                    out.push_str(&command.description);
                }
                out.push('\n');
            }
        }
        out.push_str("\nType 'help <command>' for details on a command.\n");
        out
    }
}

fn score_command(command: &Command, query: &str) -> u32 {
    let name = command.name.to_lowercase();
    let mut score = if name == query {
        100
    } else if name.starts_with(query) {
        80
    } else if name.contains(query) {
        60
    } else {
        0
    };

    score += command
        .aliases
        .iter()
        .map(|alias| {
            let alias = alias.to_lowercase();
            if alias == query {
                90
            } else if alias.starts_with(query) {
                70
            } else if alias.contains(query) {
                50
            } else {
                0
            }
        })
        .max()
        .unwrap_or(0);

    if command.description.to_lowercase().contains(query) {
        score += 30;
    }
    if command.category_name().to_lowercase().contains(query) {
        score += 20;
    }
    score
}

fn render_command_help(command: &Command) -> String {
    let mut out = String::new();
    out.push_str(&command.name);
    if !command.description.is_empty() {
        out.push_str(" - ");
        out.push_str(&command.description);
    }
    out.push('\n');
    out.push_str(&format!("Category: {}\n", command.category_name()));

    if !command.aliases.is_empty() {
        out.push_str(&format!("Aliases: {}\n", command.aliases.join(", ")));
    }

    if !command.args.is_empty() {
        out.push_str("Arguments:\n");
        for spec in &command.args {
            out.push_str(&format!("  --{} <{}>", spec.name, spec.arg_type));
            if spec.required {
                out.push_str(" (required)");
            }
            if let Some(default) = &spec.default {
                out.push_str(&format!(" [default: {default}]"));
            }
            if !spec.description.is_empty() {
                out.push_str(" - ");
                out.push_str(&spec.description);
            }
            out.push('\n');
        }
    }

    if !command.examples.is_empty() {
        out.push_str("Examples:\n");
        for example in &command.examples {
            out.push_str("  ");
            out.push_str(example);
            out.push('\n');
        }
    }
    out
}

fn longest_common_prefix(items: &[&str]) -> Option<String> {
    let (first, rest) = items.split_first()?;
    let mut prefix: &str = first;
    for item in rest {
        let shared = prefix
            .char_indices()
            .zip(item.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map(|((index, ch), _)| index + ch.len_utf8())
            .unwrap_or(0);
        prefix = &prefix[..shared];
    }
    Some(prefix.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ArgType;

    fn noop(name: &str) -> Command {
        Command::new(name, |_, _| Ok(CommandResult::ok_silent()))
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("delete").with_alias("dd")).unwrap();
        assert_eq!(registry.get("delete").unwrap().name, "delete");
        assert_eq!(registry.get("dd").unwrap().name, "delete");
        assert!(registry.get("d").is_none());
    }

    #[test]
    fn test_rejects_empty_and_duplicate_names() {
        let mut registry = CommandRegistry::new();
        assert_eq!(registry.register(noop("  ")), Err(RegistrationError::EmptyName));
        registry.register(noop("undo")).unwrap();
        assert_eq!(
            registry.register(noop("undo")),
            Err(RegistrationError::DuplicateName("undo".to_string()))
        );
    }

    #[test]
    fn test_alias_conflicts_are_atomic() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("center").with_alias("zz")).unwrap();

        // Second alias collides with an existing name: the first alias must not leak in.
        let err = registry
            .register(noop("focus").with_alias("f").with_alias("center"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::AliasConflict { .. }));
        assert!(registry.get("focus").is_none());
        assert!(registry.get("f").is_none());
        assert_eq!(registry.len(), 1);

        // A new name equal to an existing alias is rejected too.
        assert!(matches!(
            registry.register(noop("zz")),
            Err(RegistrationError::NameTakenByAlias { .. })
        ));

        // Aliases must be unique within the command itself.
        assert!(registry.register(noop("x").with_alias("y").with_alias("y")).is_err());
        assert!(registry.register(noop("self").with_alias("self")).is_err());
    }

    #[test]
    fn test_unregister_removes_aliases() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("copy").with_alias("yy")).unwrap();
        assert!(registry.unregister("copy").is_some());
        assert!(registry.get("yy").is_none());
        assert!(registry.unregister("copy").is_none());
        registry.register(noop("yank").with_alias("yy")).unwrap();
    }

    #[test]
    fn test_search_scores_are_additive() {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                noop("toggle")
                    .with_alias("za")
                    .with_description("Toggle collapse")
                    .in_category("editing"),
            )
            .unwrap();
        let hits = registry.search_scored("toggle");
        // exact name + description substring
        assert_eq!(hits[0].1, 130);
        assert_eq!(registry.search_scored("za")[0].1, 90);
        assert_eq!(registry.search_scored("edit")[0].1, 20);
        assert!(registry.search_scored("zzz").is_empty());
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("b")).unwrap();
        registry.register(noop("a")).unwrap();
        assert_eq!(registry.search("  ").len(), 2);
    }

    #[test]
    fn test_complete() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("add-child").with_alias("child")).unwrap();
        registry.register(noop("add-sibling")).unwrap();
        registry.register(noop("center")).unwrap();

        assert_eq!(registry.complete("ad").as_deref(), Some("add-"));
        assert_eq!(registry.complete("add-c").as_deref(), Some("add-child "));
        assert_eq!(registry.complete("ce").as_deref(), Some("center "));
        assert_eq!(registry.complete("add-"), None);
        assert_eq!(registry.complete("x"), None);
        assert_eq!(registry.complete("center --x"), None);
    }

    #[test]
    fn test_single_command_help() {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                noop("down")
                    .with_alias("j")
                    .with_description("Select the next sibling")
                    .in_category("navigation")
                    .with_arg(
                        ArgSpec::optional("count", ArgType::Number)
                            .with_default(1i64)
                            .describe("Repeat count"),
                    )
                    .with_example("down --count 3"),
            )
            .unwrap();

        let help = registry.help(Some("j")).unwrap();
        assert_eq!(
            help,
            "down - Select the next sibling\n\
             Category: navigation\n\
             Aliases: j\n\
             Arguments:\n  --count <number> [default: 1] - Repeat count\n\
             Examples:\n  down --count 3\n"
        );
        assert!(registry.help(Some("nope")).is_none());
    }
}
