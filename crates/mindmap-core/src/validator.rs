//! Argument schemas and validation.
//!
//! Each [`Command`](crate::Command) declares an ordered list of [`ArgSpec`]s. [`validate`]
//! checks a [`ParsedCommand`] against them, fills in defaults, promotes `node-id` arguments to
//! [`ArgValue::NodeId`], and reports every violation at once.

use crate::parser::{ArgValue, ParsedCommand};
use std::fmt;
use thiserror::Error;

/// Declared type of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// Any string.
    String,
    /// Integer or finite float.
    Number,
    /// `true` / `false`.
    Boolean,
    /// Non-blank node identifier.
    NodeId,
}

impl ArgType {
    /// Schema name (`string`, `number`, `boolean`, `node-id`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::NodeId => "node-id",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of one command argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    /// Argument name (the flag without `--`).
    pub name: String,
    /// Expected type.
    pub arg_type: ArgType,
    /// Whether the argument must be supplied.
    pub required: bool,
    /// Value used when the argument is absent.
    pub default: Option<ArgValue>,
    /// One-line description shown in help.
    pub description: String,
}

impl ArgSpec {
    /// An optional argument without a default.
    pub fn optional(name: impl Into<String>, arg_type: ArgType) -> Self {
        Self {
            name: name.into(),
            arg_type,
            required: false,
            default: None,
            description: String::new(),
        }
    }

    /// A required argument.
    pub fn required(name: impl Into<String>, arg_type: ArgType) -> Self {
        Self {
            required: true,
            ..Self::optional(name, arg_type)
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the help description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// One or more argument violations.
///
/// Displays as the comma-joined list of individual messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .errors.join(", "))]
pub struct ValidationError {
    /// Individual violation messages, in declaration order.
    pub errors: Vec<String>,
}

/// Validate `parsed` against `specs`.
///
/// Returns a new [`ParsedCommand`] with defaults filled in; the input is left untouched.
/// Arguments not declared in `specs` (including positionals) pass through unchanged.
///
/// # Example
///
/// ```rust
/// use mindmap_core::{ArgSpec, ArgType, ArgValue, parse_command, validate};
///
/// let specs = [ArgSpec::optional("count", ArgType::Number).with_default(1i64)];
/// let parsed = parse_command("down").unwrap();
/// let validated = validate(&parsed, &specs).unwrap();
/// assert_eq!(validated.args.get("count"), Some(&ArgValue::Int(1)));
/// ```
pub fn validate(parsed: &ParsedCommand, specs: &[ArgSpec]) -> Result<ParsedCommand, ValidationError> {
    let mut validated = parsed.clone();
    let mut errors = Vec::new();

    for spec in specs {
        match parsed.args.get(&spec.name) {
            None if spec.required => {
                errors.push(format!("Required argument '{}' is missing", spec.name));
            }
            None => {
                if let Some(default) = &spec.default {
                    validated.args.insert(spec.name.clone(), default.clone());
                }
            }
            Some(value) => {
                let token = parsed.args.token(&spec.name);
                match check_type(value, token, spec.arg_type) {
                    Some(checked) => validated.args.insert(spec.name.clone(), checked),
                    None => errors.push(format!(
                        "Argument '{}' must be of type {}",
                        spec.name, spec.arg_type
                    )),
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(ValidationError { errors })
    }
}

/// `token` is the typed spelling of `value`, used when a numeric-looking id meets a
/// `node-id` spec.
fn check_type(value: &ArgValue, token: Option<&str>, arg_type: ArgType) -> Option<ArgValue> {
    match (arg_type, value) {
        (ArgType::String, ArgValue::Str(_) | ArgValue::NodeId(_)) => Some(value.clone()),
        (ArgType::Number, ArgValue::Int(_)) => Some(value.clone()),
        (ArgType::Number, ArgValue::Float(v)) if !v.is_nan() => Some(value.clone()),
        (ArgType::Boolean, ArgValue::Bool(_)) => Some(value.clone()),
        (ArgType::NodeId, ArgValue::Str(id) | ArgValue::NodeId(id)) if !id.trim().is_empty() => {
            Some(ArgValue::NodeId(id.clone()))
        }
        (ArgType::NodeId, ArgValue::Int(_) | ArgValue::Float(_)) => Some(ArgValue::NodeId(
            token.map_or_else(|| value.to_string(), str::to_string),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_command;

    #[test]
    fn test_default_filled_when_absent() {
        let specs = [ArgSpec::optional("count", ArgType::Number).with_default(1i64)];
        let parsed = parse_command("down").unwrap();
        let validated = validate(&parsed, &specs).unwrap();
        assert_eq!(validated.args.get_i64("count"), Some(1));
        // The input is not mutated.
        assert!(parsed.args.get("count").is_none());
    }

    #[test]
    fn test_supplied_value_wins_over_default() {
        let specs = [ArgSpec::optional("count", ArgType::Number).with_default(1i64)];
        let parsed = parse_command("down --count 4").unwrap();
        assert_eq!(validate(&parsed, &specs).unwrap().args.get_i64("count"), Some(4));
    }

    #[test]
    fn test_missing_required_argument() {
        let specs = [ArgSpec::required("target", ArgType::NodeId)];
        let parsed = parse_command("move").unwrap();
        let err = validate(&parsed, &specs).unwrap_err();
        assert_eq!(err.to_string(), "Required argument 'target' is missing");
    }

    #[test]
    fn test_errors_accumulate() {
        let specs = [
            ArgSpec::required("target", ArgType::NodeId),
            ArgSpec::optional("count", ArgType::Number),
            ArgSpec::optional("confirm", ArgType::Boolean),
        ];
        let parsed = parse_command("move --count many --confirm yes").unwrap();
        let err = validate(&parsed, &specs).unwrap_err();
        assert_eq!(err.errors.len(), 3);
        assert_eq!(
            err.to_string(),
            "Required argument 'target' is missing, \
             Argument 'count' must be of type number, \
             Argument 'confirm' must be of type boolean"
        );
    }

    #[test]
    fn test_node_id_checks() {
        let specs = [ArgSpec::required("nodeId", ArgType::NodeId)];

        let ok = validate(&parse_command("select --nodeId n1").unwrap(), &specs).unwrap();
        assert_eq!(ok.args.get("nodeId"), Some(&ArgValue::NodeId("n1".to_string())));

        let blank = validate(&parse_command("select --nodeId '  '").unwrap(), &specs);
        assert!(blank.is_err());

        // Numeric-looking ids keep the spelling they were typed with.
        let numeric = validate(&parse_command("select --nodeId 007").unwrap(), &specs).unwrap();
        assert_eq!(numeric.args.get("nodeId"), Some(&ArgValue::NodeId("007".to_string())));

        let flag = validate(&parse_command("select --nodeId").unwrap(), &specs);
        assert!(flag.is_err());
    }

    #[test]
    fn test_bare_flag_is_not_a_string() {
        let specs = [ArgSpec::optional("text", ArgType::String)];
        let err = validate(&parse_command("rename --text").unwrap(), &specs).unwrap_err();
        assert_eq!(err.to_string(), "Argument 'text' must be of type string");
    }
}
