#![warn(missing_docs)]
//! Mindmap Core - Modal Command Interpreter for Mind-Map Editors
//!
//! # Overview
//!
//! `mindmap-core` is a headless command layer for tree-structured mind-map documents.
//! It does not render anything: the host application owns the document and the canvas and
//! exposes its side effects through the [`EditorHandlers`] trait. The crate turns typed
//! command lines, key sequences and canvas events into calls on that trait.
//!
//! # Core Features
//!
//! - **Command Language**: `name [positional ...] [--flag [value]] ...` with quoting and escapes
//! - **Typed Arguments**: per-command schemas with defaults and accumulated validation errors
//! - **Command Registry**: aliases, ranked search, completion and generated help
//! - **Tree Navigation**: parent/child/sibling motions with counts and a spatial fallback
//! - **Mode Dispatch**: normal / insert / visual strategies for raw canvas events
//! - **Key Sequences**: Vim-style `5j`, `dd`, `za` normal-mode bindings
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  KeySequence / Dispatcher / execute_line    │  ← Input surfaces
//! ├─────────────────────────────────────────────┤
//! │  Built-in commands                          │  ← Command bodies
//! ├─────────────────────────────────────────────┤
//! │  Registry + Validator                       │  ← Lookup & schemas
//! ├─────────────────────────────────────────────┤
//! │  Tokenizer + Parser                         │  ← Command language
//! ├─────────────────────────────────────────────┤
//! │  Navigation Engine                          │  ← Pure tree motions
//! ├─────────────────────────────────────────────┤
//! │  Tree Model (MindMap / Node)                │  ← Document
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use mindmap_core::{
//!     CommandRegistry, EditorHandlers, EditorSession, Node, execute_line,
//!     register_builtin_commands,
//! };
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! let mut session = EditorSession::new(vec![
//!     Node::new("root", "Project")
//!         .with_child(Node::new("a", "Design").at(200.0, 0.0))
//!         .with_child(Node::new("b", "Build").at(200.0, 60.0)),
//! ])
//! .unwrap();
//!
//! execute_line(&registry, &mut session, "select a");
//! execute_line(&registry, &mut session, "j");
//! assert_eq!(session.selected_node_id().as_deref(), Some("b"));
//!
//! let result = execute_line(&registry, &mut session, "rename --text 'Ship it'");
//! assert!(result.success);
//! assert_eq!(session.map().find("b").unwrap().text, "Ship it");
//! ```
//!
//! # Module Description
//!
//! - [`tree`] - Node forest, lookups and atomic structural edits
//! - [`tokenizer`] / [`parser`] - Command-line tokens and typed arguments
//! - [`validator`] - Argument schemas
//! - [`registry`] - Command storage, search, completion and help
//! - [`navigation`] - Directional motion engine
//! - [`context`] - Handler contract and per-invocation context
//! - [`interpreter`] - Parse-validate-execute pipeline
//! - [`dispatcher`] - Mode strategies for canvas events
//! - [`keymap`] - Normal-mode key sequences
//! - [`session`] - In-memory reference host

mod builtins;
pub mod context;
pub mod dispatcher;
pub mod interpreter;
pub mod keymap;
pub mod navigation;
pub mod parser;
pub mod registry;
pub mod session;
pub mod tokenizer;
pub mod tree;
pub mod validator;

pub use builtins::{builtin_commands, register_builtin_commands};
pub use context::{
    CommandContext, CommandError, CommandResult, EditorHandlers, HandlerResult, Mode, UnknownMode,
};
pub use dispatcher::{
    CanvasEvent, DispatchHost, ModeStrategy, StrategyFn, dispatch, strategy_for, strategy_for_name,
};
pub use interpreter::{execute_line, execute_parsed};
pub use keymap::{Binding, COMMAND_LINE_KEY, KeyOutcome, KeySequence, Keymap};
pub use navigation::{
    Direction, NavigationOutcome, SPATIAL_CROSS_AXIS_WEIGHT, SPATIAL_MIN_DISTANCE, SpatialConfig,
    closest_child, navigate, navigate_with, spatial_score,
};
pub use parser::{
    ArgMap, ArgValue, ParseError, ParseResult, ParsedCommand, parse_arguments, parse_command,
    parse_value, positional_key,
};
pub use registry::{
    Command, CommandOutcome, CommandRegistry, DEFAULT_CATEGORY, RegistrationError,
};
pub use session::{
    ContextMenu, CursorPlacement, EditingState, EditorSession, SessionChange,
    SessionChangeCallback, SessionChangeType,
};
pub use tokenizer::tokenize;
pub use tree::{
    DropPosition, MarkdownKind, MarkdownMeta, MindMap, Node, NodeUpdate, TreeError, find_node,
    find_parent, iter_nodes, root_index, sibling_list, visible_nodes,
};
pub use validator::{ArgSpec, ArgType, ValidationError, validate};
