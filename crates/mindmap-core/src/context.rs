//! Command execution context.
//!
//! The interpreter never owns the document. Every side effect is requested through the
//! [`EditorHandlers`] trait implemented by the host application; commands receive a
//! [`CommandContext`] built fresh for each invocation, holding the handlers, the registry, and
//! the selection and mode read from the host at that moment.
//!
//! All operational handler methods have default implementations returning
//! [`CommandError::Unsupported`], so a host implements only the capabilities it has and
//! commands degrade to a failed [`CommandResult`] instead of panicking.

use crate::navigation::{Direction, SpatialConfig};
use crate::parser::{ArgMap, positional_key};
use crate::registry::CommandRegistry;
use crate::tree::{DropPosition, Node, NodeUpdate, TreeError, find_node};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Modal editing state, owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Navigation and structural commands.
    #[default]
    Normal,
    /// Text entry into a node.
    Insert,
    /// Range selection (reserved).
    Visual,
    /// A menu or palette owns the keyboard.
    Menu,
}

impl Mode {
    /// Lowercase mode name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Insert => "insert",
            Self::Visual => "visual",
            Self::Menu => "menu",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized mode name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "insert" => Ok(Self::Insert),
            "visual" => Ok(Self::Visual),
            "menu" => Ok(Self::Menu),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Outcome of a command. Failures are values, never panics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,
    /// Human-readable message on success.
    pub message: Option<String>,
    /// Error description on failure.
    pub error: Option<String>,
}

impl CommandResult {
    /// Success with a message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    /// Success without a message.
    pub fn ok_silent() -> Self {
        Self {
            success: true,
            message: None,
            error: None,
        }
    }

    /// Failure with an error description.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }

    /// Returns `true` on success.
    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl From<CommandError> for CommandResult {
    fn from(err: CommandError) -> Self {
        Self::failure(err.to_string())
    }
}

/// Errors raised while executing a command or calling a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The host does not provide the named handler.
    #[error("Handler '{0}' is not available")]
    Unsupported(&'static str),
    /// The command needs a node but none was given or selected.
    #[error("No node selected")]
    NoSelection,
    /// The referenced node does not exist.
    #[error("Node '{0}' not found")]
    NodeNotFound(String),
    /// An argument was well-typed but semantically invalid.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Argument name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Any other failure reported by a handler.
    #[error("{0}")]
    Failed(String),
}

impl From<TreeError> for CommandError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::NodeNotFound(id) => Self::NodeNotFound(id),
            other => Self::Failed(other.to_string()),
        }
    }
}

/// Result type returned by handlers.
pub type HandlerResult<T = ()> = Result<T, CommandError>;

/// Side-effect surface supplied by the host application.
///
/// Only [`roots`](Self::roots) and [`selected_node_id`](Self::selected_node_id) are required.
pub trait EditorHandlers {
    /// Document-level roots of the current tree.
    fn roots(&self) -> &[Node];

    /// Currently selected node, read at call time.
    fn selected_node_id(&self) -> Option<String>;

    /// Current editing mode, read at call time.
    fn mode(&self) -> Mode {
        Mode::Normal
    }

    /// Spatial fallback tuning used by navigation commands.
    fn spatial_config(&self) -> SpatialConfig {
        SpatialConfig::default()
    }

    /// Look up a node by id.
    fn find_node_by_id(&self, id: &str) -> Option<&Node> {
        find_node(self.roots(), id)
    }

    /// Apply a partial update to a node.
    fn update_node(&mut self, id: &str, update: NodeUpdate) -> HandlerResult {
        let _ = (id, update);
        Err(CommandError::Unsupported("updateNode"))
    }

    /// Delete a node and its subtree.
    fn delete_node(&mut self, id: &str) -> HandlerResult {
        let _ = id;
        Err(CommandError::Unsupported("deleteNode"))
    }

    /// Host-driven directional move, used when nothing is selected.
    fn navigate_to_direction(&mut self, direction: Direction) -> HandlerResult {
        let _ = direction;
        Err(CommandError::Unsupported("navigateToDirection"))
    }

    /// Create a child under `parent_id`; returns the new id, or `None` if nothing was created.
    fn add_child_node(
        &mut self,
        parent_id: &str,
        text: Option<&str>,
        start_editing: bool,
    ) -> HandlerResult<Option<String>> {
        let _ = (parent_id, text, start_editing);
        Err(CommandError::Unsupported("addChildNode"))
    }

    /// Create a sibling after `node_id`; returns the new id, or `None` if nothing was created.
    fn add_sibling_node(
        &mut self,
        node_id: &str,
        text: Option<&str>,
        start_editing: bool,
    ) -> HandlerResult<Option<String>> {
        let _ = (node_id, text, start_editing);
        Err(CommandError::Unsupported("addSiblingNode"))
    }

    /// Copy a subtree to the host clipboard.
    fn copy_node(&mut self, id: &str) -> HandlerResult {
        let _ = id;
        Err(CommandError::Unsupported("copyNode"))
    }

    /// Paste the clipboard as a child of `parent_id`.
    fn paste_node(&mut self, parent_id: &str) -> HandlerResult {
        let _ = parent_id;
        Err(CommandError::Unsupported("pasteNode"))
    }

    /// Undo the last document change.
    fn undo(&mut self) -> HandlerResult {
        Err(CommandError::Unsupported("undo"))
    }

    /// Redo the last undone change.
    fn redo(&mut self) -> HandlerResult {
        Err(CommandError::Unsupported("redo"))
    }

    /// Begin text editing with the cursor at the start.
    fn start_edit_with_cursor_at_start(&mut self, id: &str) -> HandlerResult {
        let _ = id;
        Err(CommandError::Unsupported("startEditWithCursorAtStart"))
    }

    /// Begin text editing with the cursor at the end.
    fn start_edit_with_cursor_at_end(&mut self, id: &str) -> HandlerResult {
        let _ = id;
        Err(CommandError::Unsupported("startEditWithCursorAtEnd"))
    }

    /// Change (or clear) the selection.
    fn select_node(&mut self, id: Option<&str>) -> HandlerResult {
        let _ = id;
        Err(CommandError::Unsupported("selectNode"))
    }

    /// Close the attachment and link side panels.
    fn close_attachment_and_link_lists(&mut self) -> HandlerResult {
        Err(CommandError::Unsupported("closeAttachmentAndLinkLists"))
    }

    /// Flip a node's collapse state. Navigation falls back to `update_node` without it.
    fn toggle_collapse(&mut self, id: &str) -> HandlerResult {
        let _ = id;
        Err(CommandError::Unsupported("toggleCollapse"))
    }

    /// Move a subtree relative to `target_id`.
    fn move_node(&mut self, id: &str, target_id: &str, position: DropPosition) -> HandlerResult {
        let _ = (id, target_id, position);
        Err(CommandError::Unsupported("moveNode"))
    }

    /// Scroll the view so `id` is centered.
    fn center_on_node(&mut self, id: &str) -> HandlerResult {
        let _ = id;
        Err(CommandError::Unsupported("centerOnNode"))
    }
}

/// Per-invocation state handed to a command's executor.
pub struct CommandContext<'a> {
    /// Host side effects.
    pub handlers: &'a mut dyn EditorHandlers,
    /// The registry the command was resolved from.
    pub registry: &'a CommandRegistry,
    /// Selection at the start of the invocation.
    pub selected_node_id: Option<String>,
    /// Mode at the start of the invocation.
    pub mode: Mode,
}

impl<'a> CommandContext<'a> {
    /// Build a context, reading selection and mode from the host now.
    pub fn new(registry: &'a CommandRegistry, handlers: &'a mut dyn EditorHandlers) -> Self {
        let selected_node_id = handlers.selected_node_id();
        let mode = handlers.mode();
        Self {
            handlers,
            registry,
            selected_node_id,
            mode,
        }
    }

    /// Resolve the node a command targets: the `key` flag, then the first positional, then the
    /// selection.
    ///
    /// A first positional always names the target; one that is not a usable id is an error,
    /// never a fallback to the selection.
    pub fn resolve_node_id(&self, args: &ArgMap, key: &str) -> Result<String, CommandError> {
        if let Some(id) = args.get_node_id(key) {
            return Ok(id.to_string());
        }
        if args.positional(0).is_some() {
            return args
                .get_node_id(&positional_key(0))
                .map(str::to_string)
                .ok_or_else(|| CommandError::InvalidArgument {
                    name: key.to_string(),
                    reason: "expected a node id".to_string(),
                });
        }
        self.selected_node_id.clone().ok_or(CommandError::NoSelection)
    }

    /// Look up a node, failing with [`CommandError::NodeNotFound`].
    pub fn node(&self, id: &str) -> Result<&Node, CommandError> {
        self.handlers
            .find_node_by_id(id)
            .ok_or_else(|| CommandError::NodeNotFound(id.to_string()))
    }
}

impl fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("selected_node_id", &self.selected_node_id)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
