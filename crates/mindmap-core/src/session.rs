//! In-memory editor session.
//!
//! [`EditorSession`] owns a [`MindMap`] together with the UI state the interpreter reads and
//! writes: selection, mode, panels, text editing, clipboard and a snapshot history. It
//! implements [`EditorHandlers`] and [`DispatchHost`], so it can be handed straight to
//! [`execute_line`](crate::execute_line) and [`dispatch`](crate::dispatch).
//!
//! # Change notifications
//!
//! Every state change increments a version counter and notifies subscribers:
//!
//! ```rust
//! use mindmap_core::{EditorSession, EditorHandlers, Node, SessionChangeType};
//! use std::sync::{Arc, Mutex};
//!
//! let mut session = EditorSession::new(vec![Node::new("root", "Root")]).unwrap();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! session.subscribe(move |change| sink.lock().unwrap().push(change.change_type));
//!
//! session.select_node(Some("root")).unwrap();
//! assert_eq!(session.version(), 1);
//! assert_eq!(*seen.lock().unwrap(), [SessionChangeType::SelectionChanged]);
//! ```

use crate::context::{CommandError, EditorHandlers, HandlerResult, Mode};
use crate::dispatcher::DispatchHost;
use crate::navigation::{Direction, SpatialConfig};
use crate::tree::{DropPosition, MindMap, Node, NodeUpdate, TreeError};
use tracing::debug;

/// Horizontal distance between a parent and a newly placed child.
pub const CHILD_OFFSET_X: f64 = 200.0;
/// Vertical distance between newly placed siblings.
pub const SIBLING_SPACING_Y: f64 = 60.0;
/// Text given to nodes created without text and without starting an edit.
pub const DEFAULT_NODE_TEXT: &str = "New node";
/// Maximum number of undo snapshots kept.
pub const MAX_HISTORY: usize = 100;

/// Kind of session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChangeType {
    /// The tree changed.
    DocumentModified,
    /// The selection changed.
    SelectionChanged,
    /// The mode or editing target changed.
    ModeChanged,
    /// A menu or side panel opened or closed.
    PanelsChanged,
    /// The view was centered on a node.
    ViewCentered,
}

/// Session change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    /// Change type
    pub change_type: SessionChangeType,
    /// Old version number
    pub old_version: u64,
    /// New version number
    pub new_version: u64,
}

/// Session change callback function type
pub type SessionChangeCallback = Box<dyn FnMut(&SessionChange) + Send>;

/// Where the text cursor starts when editing begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPlacement {
    /// Before the first character.
    Start,
    /// After the last character.
    End,
}

/// The node currently being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingState {
    /// Node being edited.
    pub node_id: String,
    /// Initial cursor placement.
    pub cursor: CursorPlacement,
}

/// An open context menu.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    /// Canvas x.
    pub x: f64,
    /// Canvas y.
    pub y: f64,
    /// Node the menu was opened on, if any.
    pub node_id: Option<String>,
}

/// In-memory host for the command interpreter.
pub struct EditorSession {
    map: MindMap,
    selected: Option<String>,
    mode: Mode,
    context_menu: Option<ContextMenu>,
    link_list_open: bool,
    attachment_list_open: bool,
    editing: Option<EditingState>,
    clipboard: Option<Node>,
    undo_stack: Vec<Vec<Node>>,
    redo_stack: Vec<Vec<Node>>,
    centered_on: Option<String>,
    spatial: SpatialConfig,
    next_id: u64,
    version: u64,
    is_modified: bool,
    callbacks: Vec<SessionChangeCallback>,
}

impl EditorSession {
    /// Create a session over `roots`, rejecting duplicate ids.
    pub fn new(roots: Vec<Node>) -> Result<Self, TreeError> {
        Ok(Self::from_map(MindMap::new(roots)?))
    }

    /// Create a session over an existing document.
    pub fn from_map(map: MindMap) -> Self {
        Self {
            map,
            selected: None,
            mode: Mode::Normal,
            context_menu: None,
            link_list_open: false,
            attachment_list_open: false,
            editing: None,
            clipboard: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            centered_on: None,
            spatial: SpatialConfig::default(),
            next_id: 1,
            version: 0,
            is_modified: false,
            callbacks: Vec::new(),
        }
    }

    /// The document.
    pub fn map(&self) -> &MindMap {
        &self.map
    }

    /// Current selection.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Open context menu, if any.
    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.context_menu.as_ref()
    }

    /// Node being edited, if any.
    pub fn editing(&self) -> Option<&EditingState> {
        self.editing.as_ref()
    }

    /// Copied subtree, if any.
    pub fn clipboard(&self) -> Option<&Node> {
        self.clipboard.as_ref()
    }

    /// Node the view was last centered on.
    pub fn centered_on(&self) -> Option<&str> {
        self.centered_on.as_deref()
    }

    /// Whether the attachment list panel is open.
    pub fn is_attachment_list_open(&self) -> bool {
        self.attachment_list_open
    }

    /// Open or close the link list panel.
    pub fn set_link_list_open(&mut self, open: bool) {
        if self.link_list_open != open {
            self.link_list_open = open;
            self.mark(SessionChangeType::PanelsChanged);
        }
    }

    /// Open or close the attachment list panel.
    pub fn set_attachment_list_open(&mut self, open: bool) {
        if self.attachment_list_open != open {
            self.attachment_list_open = open;
            self.mark(SessionChangeType::PanelsChanged);
        }
    }

    /// Switch mode. Leaving insert mode ends any edit without committing it.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != Mode::Insert {
            self.editing = None;
        }
        if self.mode != mode {
            debug!(from = %self.mode, to = %mode, "mode change");
            self.mode = mode;
            self.mark(SessionChangeType::ModeChanged);
        }
    }

    /// End the current edit, writing `text` to the node when given, and return to normal mode.
    pub fn finish_edit(&mut self, text: Option<String>) -> HandlerResult {
        let Some(editing) = self.editing.take() else {
            return Ok(());
        };
        if let Some(text) = text {
            let unchanged = self
                .map
                .find(&editing.node_id)
                .is_some_and(|node| node.text == text);
            if !unchanged {
                self.update_node(&editing.node_id, NodeUpdate::text(text))?;
            }
        }
        self.set_mode(Mode::Normal);
        Ok(())
    }

    /// Override the spatial navigation tuning.
    pub fn set_spatial_config(&mut self, config: SpatialConfig) {
        self.spatial = config;
    }

    /// Returns `true` if an undo snapshot is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if a redo snapshot is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get current version number
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check if state has changed since a version
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.version > version
    }

    /// Whether the document changed since creation or the last [`mark_saved`](Self::mark_saved).
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Mark document as unmodified (e.g., after saving)
    pub fn mark_saved(&mut self) {
        self.is_modified = false;
    }

    /// Subscribe to state change notifications
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&SessionChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    fn mark(&mut self, change_type: SessionChangeType) {
        let old_version = self.version;
        self.version += 1;
        if change_type == SessionChangeType::DocumentModified {
            self.is_modified = true;
        }
        let change = SessionChange {
            change_type,
            old_version,
            new_version: self.version,
        };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }

    /// Run a document mutation, recording an undo snapshot when it succeeds.
    fn mutate<T>(
        &mut self,
        apply: impl FnOnce(&mut MindMap) -> Result<T, TreeError>,
    ) -> HandlerResult<T> {
        let snapshot = self.map.roots().to_vec();
        let value = apply(&mut self.map)?;
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
        self.mark(SessionChangeType::DocumentModified);
        Ok(value)
    }

    fn set_selection(&mut self, id: Option<String>) {
        if self.selected != id {
            self.selected = id;
            self.mark(SessionChangeType::SelectionChanged);
        }
    }

    fn begin_edit(&mut self, id: &str, cursor: CursorPlacement) -> HandlerResult {
        if !self.map.contains(id) {
            return Err(CommandError::NodeNotFound(id.to_string()));
        }
        self.set_selection(Some(id.to_string()));
        self.editing = Some(EditingState {
            node_id: id.to_string(),
            cursor,
        });
        self.mode = Mode::Insert;
        self.mark(SessionChangeType::ModeChanged);
        Ok(())
    }

    fn allocate_id(&mut self) -> String {
        loop {
            let id = format!("node-{}", self.next_id);
            self.next_id += 1;
            if !self.map.contains(&id) {
                return id;
            }
        }
    }

    fn new_node_text(text: Option<&str>, start_editing: bool) -> String {
        match text {
            Some(text) => text.to_string(),
            None if start_editing => String::new(),
            None => DEFAULT_NODE_TEXT.to_string(),
        }
    }

    /// Drop selection and edit state that point at nodes no longer in the document.
    fn forget_missing_nodes(&mut self) {
        if self
            .selected
            .as_deref()
            .is_some_and(|id| !self.map.contains(id))
        {
            self.set_selection(None);
        }
        if self
            .editing
            .as_ref()
            .is_some_and(|editing| !self.map.contains(&editing.node_id))
        {
            self.set_mode(Mode::Normal);
        }
    }

    fn restore(&mut self, roots: Vec<Node>) {
        self.map.replace_roots(roots);
        self.mark(SessionChangeType::DocumentModified);
        self.forget_missing_nodes();
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("nodes", &self.map.len())
            .field("selected", &self.selected)
            .field("mode", &self.mode)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Position for a new last child of `parent`.
fn child_slot(parent: &Node) -> (f64, f64) {
    match parent.children.last() {
        Some(last) => (last.x, last.y + SIBLING_SPACING_Y),
        None => (parent.x + CHILD_OFFSET_X, parent.y),
    }
}

fn reassign_ids(node: &mut Node, allocate: &mut dyn FnMut() -> String) {
    node.id = allocate();
    for child in &mut node.children {
        reassign_ids(child, allocate);
    }
}

fn translate(node: &mut Node, dx: f64, dy: f64) {
    node.x += dx;
    node.y += dy;
    for child in &mut node.children {
        translate(child, dx, dy);
    }
}

impl EditorHandlers for EditorSession {
    fn roots(&self) -> &[Node] {
        self.map.roots()
    }

    fn selected_node_id(&self) -> Option<String> {
        self.selected.clone()
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn spatial_config(&self) -> SpatialConfig {
        self.spatial
    }

    fn update_node(&mut self, id: &str, update: NodeUpdate) -> HandlerResult {
        if update.is_empty() {
            return Ok(());
        }
        self.mutate(|map| map.update(id, &update))
    }

    fn delete_node(&mut self, id: &str) -> HandlerResult {
        let parent = self.map.parent_of(id).map(|parent| parent.id.clone());
        self.mutate(|map| {
            map.remove(id)
                .map(drop)
                .ok_or_else(|| TreeError::NodeNotFound(id.to_string()))
        })?;
        if self
            .selected
            .as_deref()
            .is_some_and(|selected| !self.map.contains(selected))
        {
            self.set_selection(parent);
        }
        self.forget_missing_nodes();
        Ok(())
    }

    fn navigate_to_direction(&mut self, direction: Direction) -> HandlerResult {
        let target = match direction {
            Direction::Up => self.map.roots().last(),
            _ => self.map.roots().first(),
        };
        let Some(target) = target.map(|node| node.id.clone()) else {
            return Err(CommandError::Failed("Document is empty".to_string()));
        };
        self.set_selection(Some(target));
        Ok(())
    }

    fn add_child_node(
        &mut self,
        parent_id: &str,
        text: Option<&str>,
        start_editing: bool,
    ) -> HandlerResult<Option<String>> {
        let parent = self
            .map
            .find(parent_id)
            .ok_or_else(|| CommandError::NodeNotFound(parent_id.to_string()))?;
        let (x, y) = child_slot(parent);
        let id = self.allocate_id();
        let node = Node::new(id.clone(), Self::new_node_text(text, start_editing)).at(x, y);

        self.mutate(|map| {
            map.insert(node, parent_id, DropPosition::Child)?;
            map.update(parent_id, &NodeUpdate::collapsed(false))
        })?;
        self.set_selection(Some(id.clone()));
        if start_editing {
            self.begin_edit(&id, CursorPlacement::End)?;
        }
        Ok(Some(id))
    }

    fn add_sibling_node(
        &mut self,
        node_id: &str,
        text: Option<&str>,
        start_editing: bool,
    ) -> HandlerResult<Option<String>> {
        let anchor = self
            .map
            .find(node_id)
            .ok_or_else(|| CommandError::NodeNotFound(node_id.to_string()))?;
        let (x, y) = (anchor.x, anchor.y + SIBLING_SPACING_Y);
        let id = self.allocate_id();
        let node = Node::new(id.clone(), Self::new_node_text(text, start_editing)).at(x, y);

        self.mutate(|map| map.insert(node, node_id, DropPosition::After))?;
        self.set_selection(Some(id.clone()));
        if start_editing {
            self.begin_edit(&id, CursorPlacement::End)?;
        }
        Ok(Some(id))
    }

    fn copy_node(&mut self, id: &str) -> HandlerResult {
        let node = self
            .map
            .find(id)
            .ok_or_else(|| CommandError::NodeNotFound(id.to_string()))?;
        self.clipboard = Some(node.clone());
        Ok(())
    }

    fn paste_node(&mut self, parent_id: &str) -> HandlerResult {
        let Some(mut node) = self.clipboard.clone() else {
            return Err(CommandError::Failed("Clipboard is empty".to_string()));
        };
        let parent = self
            .map
            .find(parent_id)
            .ok_or_else(|| CommandError::NodeNotFound(parent_id.to_string()))?;
        let (x, y) = child_slot(parent);

        reassign_ids(&mut node, &mut || self.allocate_id());
        let (dx, dy) = (x - node.x, y - node.y);
        translate(&mut node, dx, dy);
        let id = node.id.clone();

        self.mutate(|map| {
            map.insert(node, parent_id, DropPosition::Child)?;
            map.update(parent_id, &NodeUpdate::collapsed(false))
        })?;
        self.set_selection(Some(id));
        Ok(())
    }

    fn undo(&mut self) -> HandlerResult {
        let Some(snapshot) = self.undo_stack.pop() else {
            return Err(CommandError::Failed("Nothing to undo".to_string()));
        };
        self.redo_stack.push(self.map.roots().to_vec());
        self.restore(snapshot);
        Ok(())
    }

    fn redo(&mut self) -> HandlerResult {
        let Some(snapshot) = self.redo_stack.pop() else {
            return Err(CommandError::Failed("Nothing to redo".to_string()));
        };
        self.undo_stack.push(self.map.roots().to_vec());
        self.restore(snapshot);
        Ok(())
    }

    fn start_edit_with_cursor_at_start(&mut self, id: &str) -> HandlerResult {
        self.begin_edit(id, CursorPlacement::Start)
    }

    fn start_edit_with_cursor_at_end(&mut self, id: &str) -> HandlerResult {
        self.begin_edit(id, CursorPlacement::End)
    }

    fn select_node(&mut self, id: Option<&str>) -> HandlerResult {
        if let Some(id) = id {
            if !self.map.contains(id) {
                return Err(CommandError::NodeNotFound(id.to_string()));
            }
        }
        self.set_selection(id.map(str::to_string));
        Ok(())
    }

    fn close_attachment_and_link_lists(&mut self) -> HandlerResult {
        if self.link_list_open || self.attachment_list_open {
            self.link_list_open = false;
            self.attachment_list_open = false;
            self.mark(SessionChangeType::PanelsChanged);
        }
        Ok(())
    }

    fn toggle_collapse(&mut self, id: &str) -> HandlerResult {
        let node = self
            .map
            .find(id)
            .ok_or_else(|| CommandError::NodeNotFound(id.to_string()))?;
        let collapsing = !node.collapsed;
        let hides_selection = collapsing
            && self
                .selected
                .as_deref()
                .is_some_and(|selected| selected != id && node.contains(selected));

        self.mutate(|map| map.update(id, &NodeUpdate::collapsed(collapsing)))?;
        if hides_selection {
            self.set_selection(Some(id.to_string()));
        }
        Ok(())
    }

    fn move_node(&mut self, id: &str, target_id: &str, position: DropPosition) -> HandlerResult {
        self.mutate(|map| map.move_node(id, target_id, position))
    }

    fn center_on_node(&mut self, id: &str) -> HandlerResult {
        if !self.map.contains(id) {
            return Err(CommandError::NodeNotFound(id.to_string()));
        }
        self.centered_on = Some(id.to_string());
        self.mark(SessionChangeType::ViewCentered);
        Ok(())
    }
}

impl DispatchHost for EditorSession {
    fn is_link_list_open(&self) -> bool {
        self.link_list_open
    }

    fn open_context_menu(&mut self, x: f64, y: f64, node_id: Option<&str>) -> HandlerResult {
        if let Some(id) = node_id {
            self.select_node(Some(id))?;
        }
        self.context_menu = Some(ContextMenu {
            x,
            y,
            node_id: node_id.map(str::to_string),
        });
        self.mark(SessionChangeType::PanelsChanged);
        Ok(())
    }

    fn close_context_menu(&mut self) -> HandlerResult {
        if self.context_menu.take().is_some() {
            self.mark(SessionChangeType::PanelsChanged);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EditorSession {
        EditorSession::new(vec![
            Node::new("root", "Root")
                .with_child(Node::new("a", "A").with_child(Node::new("a1", "A1")))
                .with_child(Node::new("b", "B")),
        ])
        .unwrap()
    }

    #[test]
    fn test_version_tracking() {
        let mut session = session();
        assert_eq!(session.version(), 0);
        assert!(!session.is_modified());

        session.update_node("b", NodeUpdate::text("Bee")).unwrap();
        assert_eq!(session.version(), 1);
        assert!(session.is_modified());
        assert!(session.has_changed_since(0));

        // Empty updates and no-op selections do not bump the version.
        session.update_node("b", NodeUpdate::default()).unwrap();
        session.select_node(None).unwrap();
        assert_eq!(session.version(), 1);

        session.mark_saved();
        assert!(!session.is_modified());
    }

    #[test]
    fn test_add_child_allocates_and_edits() {
        let mut session = session();
        let id = session.add_child_node("b", None, true).unwrap().unwrap();
        assert_eq!(id, "node-1");
        assert_eq!(session.selected(), Some("node-1"));
        assert_eq!(session.mode(), Mode::Insert);
        assert_eq!(
            session.editing(),
            Some(&EditingState {
                node_id: id.clone(),
                cursor: CursorPlacement::End,
            })
        );
        let node = session.map().find(&id).unwrap();
        assert_eq!(node.text, "");
        assert_eq!(node.x, CHILD_OFFSET_X);

        session.finish_edit(Some("Typed".to_string())).unwrap();
        assert_eq!(session.map().find(&id).unwrap().text, "Typed");
        assert_eq!(session.mode(), Mode::Normal);
        assert!(session.editing().is_none());
    }

    #[test]
    fn test_add_sibling_without_editing() {
        let mut session = session();
        let id = session.add_sibling_node("a", Some("Between"), false).unwrap().unwrap();
        let root = session.map().find("root").unwrap();
        let ids: Vec<&str> = root.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", id.as_str(), "b"]);
        assert_eq!(session.mode(), Mode::Normal);
    }

    #[test]
    fn test_delete_moves_selection_to_parent() {
        let mut session = session();
        session.select_node(Some("a1")).unwrap();
        session.delete_node("a").unwrap();
        assert!(!session.map().contains("a1"));
        assert_eq!(session.selected(), Some("root"));
        assert!(matches!(
            session.delete_node("a"),
            Err(CommandError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_undo_redo() {
        let mut session = session();
        assert!(session.undo().is_err());

        session.update_node("a", NodeUpdate::text("Changed")).unwrap();
        session.undo().unwrap();
        assert_eq!(session.map().find("a").unwrap().text, "A");
        assert!(session.can_redo());

        session.redo().unwrap();
        assert_eq!(session.map().find("a").unwrap().text, "Changed");
        assert!(!session.can_redo());
    }

    #[test]
    fn test_undo_clears_stale_selection() {
        let mut session = session();
        let id = session.add_child_node("root", Some("New"), false).unwrap().unwrap();
        assert_eq!(session.selected(), Some(id.as_str()));
        session.undo().unwrap();
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn test_paste_uses_fresh_ids() {
        let mut session = session();
        session.copy_node("a").unwrap();
        session.paste_node("b").unwrap();

        let b = session.map().find("b").unwrap();
        assert_eq!(b.children.len(), 1);
        let pasted = &b.children[0];
        assert_eq!(pasted.text, "A");
        assert_ne!(pasted.id, "a");
        assert_ne!(pasted.children[0].id, "a1");
        assert_eq!(session.map().len(), 6);
        assert_eq!(session.selected(), Some(pasted.id.as_str()));
    }

    #[test]
    fn test_paste_requires_clipboard() {
        let mut session = session();
        assert_eq!(
            session.paste_node("b"),
            Err(CommandError::Failed("Clipboard is empty".to_string()))
        );
    }

    #[test]
    fn test_collapse_pulls_selection_up() {
        let mut session = session();
        session.select_node(Some("a1")).unwrap();
        session.toggle_collapse("a").unwrap();
        assert!(session.map().find("a").unwrap().collapsed);
        assert_eq!(session.selected(), Some("a"));
    }

    #[test]
    fn test_move_into_own_subtree_fails() {
        let mut session = session();
        let err = session
            .move_node("a", "a1", DropPosition::Child)
            .unwrap_err();
        assert!(matches!(err, CommandError::Failed(_)));
        assert!(!session.can_undo());
    }

    #[test]
    fn test_panels() {
        let mut session = session();
        session.open_context_menu(1.0, 2.0, Some("b")).unwrap();
        assert_eq!(session.selected(), Some("b"));
        assert!(session.context_menu().is_some());
        session.close_context_menu().unwrap();
        assert!(session.context_menu().is_none());

        session.set_link_list_open(true);
        session.set_attachment_list_open(true);
        session.close_attachment_and_link_lists().unwrap();
        assert!(!session.is_link_list_open());
        assert!(!session.is_attachment_list_open());
    }

    #[test]
    fn test_navigate_without_selection() {
        let mut session = session();
        session.navigate_to_direction(Direction::Down).unwrap();
        assert_eq!(session.selected(), Some("root"));

        let mut empty = EditorSession::from_map(MindMap::empty());
        assert!(empty.navigate_to_direction(Direction::Down).is_err());
    }
}
