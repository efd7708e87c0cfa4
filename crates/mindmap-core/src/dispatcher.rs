//! Mode-sensitive canvas event dispatch.
//!
//! Raw UI events are routed through a [`ModeStrategy`] chosen from the host's current
//! [`Mode`]. Strategies are plain functions in a static table; the mode and the selection are
//! read from the host on every event, never cached.

use crate::context::{CommandResult, EditorHandlers, HandlerResult, Mode};
use crate::interpreter::execute_parsed;
use crate::parser::{ArgMap, ParsedCommand};
use crate::registry::CommandRegistry;
use crate::tree::DropPosition;
use tracing::{debug, trace};

/// A low-level event from the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// Click on empty canvas.
    BgClick {
        /// Canvas x.
        x: f64,
        /// Canvas y.
        y: f64,
    },
    /// Context menu request on empty canvas.
    ContextMenu {
        /// Canvas x.
        x: f64,
        /// Canvas y.
        y: f64,
    },
    /// Click on a node.
    NodeClick {
        /// Canvas x.
        x: f64,
        /// Canvas y.
        y: f64,
        /// Clicked node.
        node_id: String,
    },
    /// Double click on a node.
    NodeDoubleClick {
        /// Canvas x.
        x: f64,
        /// Canvas y.
        y: f64,
        /// Clicked node.
        node_id: String,
    },
    /// Context menu request on a node.
    NodeContextMenu {
        /// Canvas x.
        x: f64,
        /// Canvas y.
        y: f64,
        /// Node under the pointer.
        node_id: String,
    },
    /// A node drag finished over a drop target.
    NodeDragEnd {
        /// Canvas x.
        x: f64,
        /// Canvas y.
        y: f64,
        /// Node being dragged.
        dragged_node_id: String,
        /// Node it was dropped on.
        target_node_id: String,
        /// Placement relative to the target.
        drop_position: DropPosition,
    },
    /// Pointer pressed.
    MouseDown {
        /// Canvas x.
        x: f64,
        /// Canvas y.
        y: f64,
    },
    /// Pointer released.
    MouseUp {
        /// Canvas x.
        x: f64,
        /// Canvas y.
        y: f64,
    },
    /// Scroll or zoom gesture.
    Wheel {
        /// Canvas x.
        x: f64,
        /// Canvas y.
        y: f64,
        /// Horizontal delta.
        delta_x: f64,
        /// Vertical delta.
        delta_y: f64,
    },
}

impl CanvasEvent {
    /// Short event name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BgClick { .. } => "bgClick",
            Self::ContextMenu { .. } => "contextMenu",
            Self::NodeClick { .. } => "nodeClick",
            Self::NodeDoubleClick { .. } => "nodeDoubleClick",
            Self::NodeContextMenu { .. } => "nodeContextMenu",
            Self::NodeDragEnd { .. } => "nodeDragEnd",
            Self::MouseDown { .. } => "mouseDown",
            Self::MouseUp { .. } => "mouseUp",
            Self::Wheel { .. } => "wheel",
        }
    }

    /// Canvas coordinates of the event.
    pub fn position(&self) -> (f64, f64) {
        match self {
            Self::BgClick { x, y }
            | Self::ContextMenu { x, y }
            | Self::NodeClick { x, y, .. }
            | Self::NodeDoubleClick { x, y, .. }
            | Self::NodeContextMenu { x, y, .. }
            | Self::NodeDragEnd { x, y, .. }
            | Self::MouseDown { x, y }
            | Self::MouseUp { x, y }
            | Self::Wheel { x, y, .. } => (*x, *y),
        }
    }
}

/// Host capabilities needed by the dispatcher on top of [`EditorHandlers`].
pub trait DispatchHost: EditorHandlers {
    /// Whether the link list panel is open. Context menus stay closed while it is.
    fn is_link_list_open(&self) -> bool {
        false
    }

    /// Open the context menu at canvas coordinates, optionally for a node.
    fn open_context_menu(&mut self, x: f64, y: f64, node_id: Option<&str>) -> HandlerResult {
        let _ = (x, y, node_id);
        Err(crate::context::CommandError::Unsupported("openContextMenu"))
    }

    /// Close the context menu if it is open.
    fn close_context_menu(&mut self) -> HandlerResult {
        Ok(())
    }
}

/// Event handler for one mode. Returns `None` when the event is ignored.
pub type StrategyFn =
    fn(&CommandRegistry, &mut dyn DispatchHost, &CanvasEvent) -> Option<CommandResult>;

/// A named event-handling strategy.
#[derive(Debug, Clone, Copy)]
pub struct ModeStrategy {
    /// Strategy name, matching [`Mode::as_str`].
    pub name: &'static str,
    /// Event handler.
    pub handle: StrategyFn,
}

static STRATEGIES: [ModeStrategy; 3] = [
    ModeStrategy {
        name: "normal",
        handle: normal_mode,
    },
    ModeStrategy {
        name: "insert",
        handle: insert_mode,
    },
    ModeStrategy {
        name: "visual",
        handle: visual_mode,
    },
];

/// Strategy for `mode`. Modes without their own strategy use normal mode.
pub fn strategy_for(mode: Mode) -> &'static ModeStrategy {
    STRATEGIES
        .iter()
        .find(|strategy| strategy.name == mode.as_str())
        .unwrap_or(&STRATEGIES[0])
}

/// Strategy by mode name, falling back to normal mode for unknown names.
pub fn strategy_for_name(name: &str) -> &'static ModeStrategy {
    name.parse::<Mode>().map_or(&STRATEGIES[0], strategy_for)
}

/// Route `event` through the strategy for the host's current mode.
pub fn dispatch(
    registry: &CommandRegistry,
    host: &mut dyn DispatchHost,
    event: &CanvasEvent,
) -> Option<CommandResult> {
    let mode = host.mode();
    let strategy = strategy_for(mode);
    trace!(event = event.kind(), %mode, strategy = strategy.name, "dispatching canvas event");
    (strategy.handle)(registry, host, event)
}

fn normal_mode(
    registry: &CommandRegistry,
    host: &mut dyn DispatchHost,
    event: &CanvasEvent,
) -> Option<CommandResult> {
    match event {
        CanvasEvent::BgClick { .. } => Some(collect([
            host.select_node(None),
            host.close_context_menu(),
        ])),
        CanvasEvent::ContextMenu { x, y } => open_menu(host, *x, *y, None),
        CanvasEvent::NodeContextMenu { x, y, node_id } => {
            open_menu(host, *x, *y, Some(node_id.as_str()))
        }
        CanvasEvent::NodeClick { node_id, .. } => {
            Some(collect([host.select_node(Some(node_id.as_str()))]))
        }
        CanvasEvent::NodeDoubleClick { node_id, .. } => Some(begin_edit(host, node_id)),
        CanvasEvent::NodeDragEnd {
            dragged_node_id,
            target_node_id,
            drop_position,
            ..
        } => Some(commit_drop(
            registry,
            host,
            dragged_node_id,
            target_node_id,
            *drop_position,
        )),
        other => trace_ignored(other),
    }
}

fn insert_mode(
    _registry: &CommandRegistry,
    host: &mut dyn DispatchHost,
    event: &CanvasEvent,
) -> Option<CommandResult> {
    match event {
        // Keep the node being edited selected.
        CanvasEvent::BgClick { .. } => Some(collect([
            host.close_context_menu(),
            host.close_attachment_and_link_lists(),
        ])),
        CanvasEvent::ContextMenu { .. } | CanvasEvent::NodeContextMenu { .. } => None,
        CanvasEvent::NodeClick { node_id, .. } => {
            Some(collect([host.select_node(Some(node_id.as_str()))]))
        }
        other => trace_ignored(other),
    }
}

fn visual_mode(
    registry: &CommandRegistry,
    host: &mut dyn DispatchHost,
    event: &CanvasEvent,
) -> Option<CommandResult> {
    match event {
        CanvasEvent::BgClick { .. } | CanvasEvent::NodeClick { .. } => {
            normal_mode(registry, host, event)
        }
        other => trace_ignored(other),
    }
}

fn open_menu(
    host: &mut dyn DispatchHost,
    x: f64,
    y: f64,
    node_id: Option<&str>,
) -> Option<CommandResult> {
    if host.is_link_list_open() {
        debug!("context menu suppressed while the link list is open");
        return None;
    }
    Some(collect([host.open_context_menu(x, y, node_id)]))
}

fn begin_edit(host: &mut dyn DispatchHost, node_id: &str) -> CommandResult {
    let Some(node) = host.find_node_by_id(node_id) else {
        return CommandResult::failure(format!("Node '{node_id}' not found"));
    };
    if !node.is_text_node() {
        return CommandResult::ok_silent();
    }
    collect([
        host.select_node(Some(node_id)),
        host.start_edit_with_cursor_at_end(node_id),
    ])
}

fn commit_drop(
    registry: &CommandRegistry,
    host: &mut dyn DispatchHost,
    dragged: &str,
    target: &str,
    position: DropPosition,
) -> CommandResult {
    if registry.contains("move") {
        let parsed = ParsedCommand::new(
            "move",
            ArgMap::new()
                .with("nodeId", dragged)
                .with("target", target)
                .with("position", position.as_str()),
        );
        return execute_parsed(registry, host, &parsed);
    }
    collect([host.move_node(dragged, target, position)])
}

fn trace_ignored(event: &CanvasEvent) -> Option<CommandResult> {
    let (x, y) = event.position();
    trace!(event = event.kind(), x, y, "event ignored");
    None
}

/// Fold handler results, stopping at the first error.
fn collect<const N: usize>(results: [HandlerResult; N]) -> CommandResult {
    match results.into_iter().find_map(Result::err) {
        Some(err) => err.into(),
        None => CommandResult::ok_silent(),
    }
}
