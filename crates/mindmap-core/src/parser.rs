//! Command-line argument parsing.
//!
//! A command line has the shape:
//!
//! ```text
//! <command-name> [<positional> ...] [--<flag> [<value>]] ...
//! ```
//!
//! [`parse_command`] tokenizes the line (see [`tokenize`](crate::tokenize)), takes the first
//! token as the command name and turns the rest into an [`ArgMap`]. Values are coerced by
//! [`parse_value`] using purely syntactic rules, so an id such as `node-42` stays a string.

use crate::tokenizer::tokenize;
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static INTEGER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("valid integer pattern"));
static FLOAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d*\.\d+$").expect("valid float pattern"));

/// Malformed command-line input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A quote was opened and never closed.
    #[error("Unclosed quote ({quote}) starting at position {position}")]
    UnclosedQuote {
        /// The quote character.
        quote: char,
        /// Byte offset of the opening quote.
        position: usize,
    },
    /// The input contained no tokens.
    #[error("No command provided")]
    EmptyInput,
}

/// A typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Plain string.
    Str(String),
    /// Integer literal (`^-?\d+$`).
    Int(i64),
    /// Float literal (`^-?\d*\.\d+$`).
    Float(f64),
    /// `true` / `false`, or a bare `--flag`.
    Bool(bool),
    /// A string checked against a `node-id` argument spec.
    NodeId(String),
}

impl ArgValue {
    /// The schema type name this value satisfies.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) | Self::Float(_) => "number",
            Self::Bool(_) => "boolean",
            Self::NodeId(_) => "node-id",
        }
    }

    /// String payload of `Str` and `NodeId` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::NodeId(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payload of `Int` and `Float` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) | Self::NodeId(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Arguments keyed by name.
///
/// Named arguments use the flag name without the leading `--`; positional arguments use their
/// ordinal among positionals (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgMap {
    values: BTreeMap<String, ArgValue>,
    /// Source token of each value read from a command line, before coercion.
    tokens: BTreeMap<String, String>,
}

impl ArgMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ArgValue>) {
        let key = key.into();
        self.tokens.remove(&key);
        self.values.insert(key, value.into());
    }

    /// Insert the coerced value of a command-line token, remembering the token itself.
    pub fn insert_token(&mut self, key: impl Into<String>, token: &str) {
        let key = key.into();
        self.values.insert(key.clone(), parse_value(token));
        self.tokens.insert(key, strip_matching_quotes(token).to_string());
    }

    /// The token a value was read from, if it came from a command line.
    ///
    /// `42`, `007` and `1.50` coerce to numbers; this keeps their exact spelling so they can
    /// still be used as node ids.
    pub fn token(&self, key: &str) -> Option<&str> {
        self.tokens.get(key).map(String::as_str)
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.values.get(key)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate arguments in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// String (or node id) argument.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ArgValue::as_str)
    }

    /// Integer argument.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ArgValue::as_i64)
    }

    /// Numeric argument.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ArgValue::as_f64)
    }

    /// Boolean argument.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ArgValue::as_bool)
    }

    /// Node-id argument. Plain strings are accepted for keys without a `node-id` spec, and
    /// numeric values resolve to the token they were typed as.
    pub fn get_node_id(&self, key: &str) -> Option<&str> {
        let id = match self.get(key)? {
            ArgValue::Str(id) | ArgValue::NodeId(id) => id.as_str(),
            ArgValue::Int(_) | ArgValue::Float(_) => self.token(key)?,
            ArgValue::Bool(_) => return None,
        };
        Some(id).filter(|id| !id.trim().is_empty())
    }

    /// The `index`-th positional argument.
    pub fn positional(&self, index: usize) -> Option<&ArgValue> {
        self.get(&positional_key(index))
    }

    /// All positional arguments in order.
    pub fn positionals(&self) -> Vec<&ArgValue> {
        (0..)
            .map_while(|index| self.positional(index))
            .collect()
    }
}

/// Key under which the `index`-th positional argument is stored.
pub fn positional_key(index: usize) -> String {
    index.to_string()
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    /// Command name or alias as typed.
    pub name: String,
    /// Parsed arguments.
    pub args: ArgMap,
    /// The original input line.
    pub raw_input: String,
}

impl ParsedCommand {
    /// Build a command programmatically (e.g. from a UI event).
    pub fn new(name: impl Into<String>, args: ArgMap) -> Self {
        let name = name.into();
        let mut raw_input = name.clone();
        for (key, value) in args.iter() {
            raw_input.push_str(&format!(" --{key} {}", quote_token(&value.to_string())));
        }
        Self {
            name,
            args,
            raw_input,
        }
    }
}

/// Render `value` as a single command-line token, single-quoting it when it is empty or
/// contains whitespace, quotes or backslashes.
fn quote_token(value: &str) -> Cow<'_, str> {
    let plain = !value.is_empty()
        && !value
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '\'' | '"' | '\\'));
    if plain {
        return Cow::Borrowed(value);
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if matches!(ch, '\'' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    Cow::Owned(quoted)
}

/// Result of parsing a command line.
pub type ParseResult = Result<ParsedCommand, ParseError>;

/// Coerce a raw token into a typed value.
///
/// # Example
///
/// ```rust
/// use mindmap_core::{ArgValue, parse_value};
///
/// assert_eq!(parse_value("true"), ArgValue::Bool(true));
/// assert_eq!(parse_value("42"), ArgValue::Int(42));
/// assert_eq!(parse_value("3.14"), ArgValue::Float(3.14));
/// assert_eq!(parse_value("'x y'"), ArgValue::Str("x y".to_string()));
/// assert_eq!(parse_value("node-42"), ArgValue::Str("node-42".to_string()));
/// ```
pub fn parse_value(token: &str) -> ArgValue {
    match token {
        "true" => return ArgValue::Bool(true),
        "false" => return ArgValue::Bool(false),
        _ => {}
    }
    if INTEGER_PATTERN.is_match(token) {
        // Out-of-range integers stay strings rather than losing precision.
        return token
            .parse::<i64>()
            .map(ArgValue::Int)
            .unwrap_or_else(|_| ArgValue::Str(token.to_string()));
    }
    if FLOAT_PATTERN.is_match(token) {
        if let Ok(value) = token.parse::<f64>() {
            return ArgValue::Float(value);
        }
    }
    ArgValue::Str(strip_matching_quotes(token).to_string())
}

fn strip_matching_quotes(token: &str) -> &str {
    for quote in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return &token[1..token.len() - 1];
        }
    }
    token
}

/// Parse the tokens following the command name.
///
/// `--flag value` consumes the next token unless it is itself a flag, in which case the flag is
/// `true`. Every other token is positional.
///
/// Tokens arrive with their quotes already removed, so a quoted value that starts with `--`
/// (`rename --text "--draft"`) is still read as a flag.
pub fn parse_arguments<S: AsRef<str>>(tokens: &[S]) -> ArgMap {
    let mut args = ArgMap::new();
    let mut positional = 0;
    let mut index = 0;

    while index < tokens.len() {
        let token: &str = tokens[index].as_ref();
        if let Some(flag) = token.strip_prefix("--") {
            let next: Option<&str> = tokens.get(index + 1).map(|next| next.as_ref());
            match next {
                Some(next) if !next.starts_with("--") => {
                    args.insert_token(flag, next);
                    index += 2;
                }
                _ => {
                    args.insert(flag, ArgValue::Bool(true));
                    index += 1;
                }
            }
        } else {
            args.insert_token(positional_key(positional), token);
            positional += 1;
            index += 1;
        }
    }

    args
}

/// Parse a full command line into a [`ParsedCommand`].
///
/// # Example
///
/// ```rust
/// use mindmap_core::{ArgValue, parse_command};
///
/// let parsed = parse_command("down --count 3").unwrap();
/// assert_eq!(parsed.name, "down");
/// assert_eq!(parsed.args.get("count"), Some(&ArgValue::Int(3)));
/// ```
pub fn parse_command(input: &str) -> ParseResult {
    let tokens = tokenize(input)?;
    let Some((name, rest)) = tokens.split_first() else {
        return Err(ParseError::EmptyInput);
    };

    Ok(ParsedCommand {
        name: name.clone(),
        args: parse_arguments(rest),
        raw_input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_parse_value_coercion() {
        assert_eq!(parse_value("true"), ArgValue::Bool(true));
        assert_eq!(parse_value("false"), ArgValue::Bool(false));
        assert_eq!(parse_value("42"), ArgValue::Int(42));
        assert_eq!(parse_value("-7"), ArgValue::Int(-7));
        assert_eq!(parse_value("3.14"), ArgValue::Float(3.14));
        assert_eq!(parse_value(".5"), ArgValue::Float(0.5));
        assert_eq!(parse_value("'x y'"), ArgValue::Str("x y".to_string()));
        assert_eq!(parse_value("\"quoted\""), ArgValue::Str("quoted".to_string()));
    }

    #[test]
    fn test_parse_value_keeps_id_like_strings() {
        assert_eq!(parse_value("node-123"), ArgValue::Str("node-123".to_string()));
        assert_eq!(parse_value("1e5"), ArgValue::Str("1e5".to_string()));
        assert_eq!(parse_value("3."), ArgValue::Str("3.".to_string()));
        assert_eq!(parse_value("True"), ArgValue::Str("True".to_string()));
        assert_eq!(parse_value("'unbalanced"), ArgValue::Str("'unbalanced".to_string()));
        assert_eq!(
            parse_value("99999999999999999999"),
            ArgValue::Str("99999999999999999999".to_string())
        );
    }

    #[test]
    fn test_parse_arguments_flags_and_positionals() {
        let args = parse_arguments(&["node-123", "--confirm", "--count", "5", "extra"]);
        assert_eq!(args.positional(0), Some(&ArgValue::Str("node-123".to_string())));
        assert_eq!(args.positional(1), Some(&ArgValue::Str("extra".to_string())));
        assert_eq!(args.get_bool("confirm"), Some(true));
        assert_eq!(args.get_i64("count"), Some(5));
        assert_eq!(args.positionals().len(), 2);
    }

    #[test]
    fn test_trailing_flag_is_true() {
        let args = parse_arguments(&["--confirm"]);
        assert_eq!(args.get_bool("confirm"), Some(true));
    }

    #[test]
    fn test_parse_command() {
        let parsed = parse_command("center node-123").unwrap();
        assert_eq!(parsed.name, "center");
        assert_eq!(parsed.args.positional(0).and_then(ArgValue::as_str), Some("node-123"));
        assert_eq!(parsed.raw_input, "center node-123");

        assert_eq!(parse_command("   ").unwrap_err(), ParseError::EmptyInput);
        assert!(matches!(
            parse_command("rename --text 'oops").unwrap_err(),
            ParseError::UnclosedQuote { .. }
        ));
    }

    #[test]
    fn test_parsed_command_new_renders_raw_input() {
        let parsed = ParsedCommand::new(
            "move",
            ArgMap::new().with("nodeId", "a").with("position", "child"),
        );
        assert_eq!(parsed.raw_input, "move --nodeId a --position child");
    }

    #[test]
    fn test_parsed_command_new_quotes_values() {
        let parsed = ParsedCommand::new(
            "rename",
            ArgMap::new()
                .with("nodeId", "a")
                .with("text", r"Ferry 'fast' times \ tides"),
        );
        assert_eq!(
            parsed.raw_input,
            r"rename --nodeId a --text 'Ferry \'fast\' times \\ tides'"
        );

        let reparsed = parse_command(&parsed.raw_input).unwrap();
        assert_eq!(reparsed.args.get_str("text"), Some(r"Ferry 'fast' times \ tides"));
        assert_eq!(reparsed.args.get_str("nodeId"), Some("a"));

        let empty = ParsedCommand::new("note", ArgMap::new().with("text", ""));
        assert_eq!(empty.raw_input, "note --text ''");
        assert_eq!(parse_command(&empty.raw_input).unwrap().args.get_str("text"), Some(""));
    }

    #[test]
    fn test_flag_like_values_are_flags() {
        let parsed = parse_command(r#"rename --text "--draft""#).unwrap();
        assert_eq!(parsed.args.get_bool("text"), Some(true));
        assert_eq!(parsed.args.get_bool("draft"), Some(true));
    }

    #[test]
    fn test_numeric_tokens_are_remembered() {
        let args = parse_arguments(&["007", "--target", "1.50", "--confirm"]);
        assert_eq!(args.positional(0), Some(&ArgValue::Int(7)));
        assert_eq!(args.get_node_id("0"), Some("007"));
        assert_eq!(args.get_node_id("target"), Some("1.50"));
        assert_eq!(args.get_node_id("confirm"), None);

        let mut args = args;
        args.insert("target", 2i64);
        assert_eq!(args.token("target"), None);
    }
}
